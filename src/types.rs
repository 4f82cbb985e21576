//! Core types shared by the fetcher and the stream writer

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// One opaque vulnerable-device record, passed through unchanged
pub type Item = Value;

/// One decoded API response
///
/// Fields other than these three are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Records on this page, in server order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,

    /// Absolute URL of the next page; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,

    /// Total number of records the server reports (usually on the first page)
    ///
    /// Only used for the summary, so a value that is not a count reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_count: Option<u64>,
}

impl Page {
    /// Next page to follow, treating an empty link as the end of the listing
    pub fn next_page(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Item>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    }))
}

/// Outcome of a completed export run
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// File the items were written to
    pub path: PathBuf,
    /// Pages fetched, including empty ones
    pub pages: u64,
    /// Items written to the file
    pub items: u64,
    /// Most recent `totalCount` reported by the API
    pub api_total: Option<u64>,
    /// Wall-clock time spent fetching and writing
    pub elapsed: Duration,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_decodes_camel_case_fields() {
        let page: Page = serde_json::from_value(json!({
            "items": [{"id": "a"}, {"id": "b"}],
            "nextLink": "https://api.example.com/devices?skipToken=xyz",
            "totalCount": 1234,
            "count": 2
        }))
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.next_page(),
            Some("https://api.example.com/devices?skipToken=xyz")
        );
        assert_eq!(page.total_count, Some(1234));
    }

    #[test]
    fn missing_or_null_items_decode_as_empty() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page(), None);

        let page: Page = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn empty_next_link_ends_pagination() {
        let page: Page = serde_json::from_str(r#"{"items": [], "nextLink": ""}"#).unwrap();
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn whole_float_total_count_is_accepted() {
        let page: Page =
            serde_json::from_str(r#"{"items": [{"a": 1}], "totalCount": 12.0}"#).unwrap();
        assert_eq!(page.total_count, Some(12));
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn unusable_total_count_reads_as_absent() {
        for raw in [r#""12""#, "-3", "1.5", "null", r#"{"n": 1}"#] {
            let body = format!(r#"{{"items": [{{"a": 1}}], "totalCount": {raw}}}"#);
            let page: Page = serde_json::from_str(&body)
                .unwrap_or_else(|e| panic!("totalCount {raw} failed the page: {e}"));
            assert_eq!(page.total_count, None, "totalCount {raw}");
            assert_eq!(page.items.len(), 1);
        }
    }

    #[test]
    fn wide_numbers_keep_their_exact_digits() {
        let page: Page = serde_json::from_str(
            r#"{"items": [{"id": 123456789012345678901234567890, "score": 0.1000000000000000055511151231257827}]}"#,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_string(&page.items[0]).unwrap(),
            r#"{"id":123456789012345678901234567890,"score":0.1000000000000000055511151231257827}"#
        );
    }

    #[test]
    fn item_key_order_is_preserved() {
        let page: Page =
            serde_json::from_str(r#"{"items": [{"zeta": 1, "alpha": 2, "mid": 3}]}"#).unwrap();
        let keys: Vec<&String> = page.items[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }
}
