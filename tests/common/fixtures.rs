//! Page fixtures and mock server setup

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock API serves pages under
pub const DEVICES_PATH: &str = "/v3.0/asrm/vulnerableDevices";

/// A device record shaped like the real API's
pub fn device(id: usize) -> Value {
    json!({
        "id": format!("dev-{id:04}"),
        "deviceName": format!("host-{id}.corp.example"),
        "ip": ["10.0.0.1"],
        "os": {"name": "Windows", "version": "10.0.19045"},
        "cveRecords": [{"id": "CVE-2024-21413", "cvssScore": 9.8}],
        "lastDetectedDateTime": "2025-01-15T08:30:00Z"
    })
}

/// A page body; `total` is only set when given
pub fn page_body(items: Vec<Value>, next_link: Option<String>, total: Option<usize>) -> Value {
    let mut body = json!({ "items": items });
    if let Some(next) = next_link {
        body["nextLink"] = json!(next);
    }
    if let Some(total) = total {
        body["totalCount"] = json!(total);
    }
    body
}

/// URL of the first page on `server`
pub fn first_page_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), DEVICES_PATH)
}

/// URL of page `n` (1-based, n > 1), as a server would hand out in `nextLink`
pub fn next_page_url(server: &MockServer, n: usize) -> String {
    format!("{}{}?skipToken=page{n}", server.uri(), DEVICES_PATH)
}

/// Mount a chain of pages with the given sizes; ids count up across pages
///
/// The first page only matches with `top=<page_size>`; later pages only match
/// without `top`. Every page is expected exactly once.
pub async fn mount_pages(server: &MockServer, sizes: &[usize], page_size: u32) {
    let total: usize = sizes.iter().sum();
    let mut next_id = 0;

    for (i, &size) in sizes.iter().enumerate() {
        let items: Vec<Value> = (next_id..next_id + size).map(device).collect();
        next_id += size;
        let next_link = (i + 1 < sizes.len()).then(|| next_page_url(server, i + 2));
        let total_count = (i == 0).then_some(total);
        let body = page_body(items, next_link, total_count);

        let mock = Mock::given(method("GET")).and(path(DEVICES_PATH));
        let mock = if i == 0 {
            mock.and(query_param("top", page_size.to_string()))
                .and(query_param_is_missing("skipToken"))
        } else {
            mock.and(query_param("skipToken", format!("page{}", i + 1)))
                .and(query_param_is_missing("top"))
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}
