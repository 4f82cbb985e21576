//! Streaming pagination writer
//!
//! Drives the fetch loop from the first page to the last and writes each item
//! to a single JSON array as soon as its page arrives:
//!
//! ```text
//! [
//! {"id":1},
//! {"id":2}
//! ]
//! ```
//!
//! Only one page is held in memory at a time. If a fetch fails mid-run the
//! error propagates and the partially written file is left as-is.

use crate::config::{Config, PageSize};
use crate::encoder::ItemEncoder;
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::types::{Page, RunSummary};
use crate::utils::{format_elapsed, output_path, throughput};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Write buffer in front of the output file
pub const WRITE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

const ARRAY_OPEN: &[u8] = b"[\n";
const ARRAY_CLOSE: &[u8] = b"\n]\n";
const ITEM_SEPARATOR: &[u8] = b",\n";

/// Settings the writer needs from [`Config`]
#[derive(Clone, Debug, PartialEq)]
pub struct WriterOptions {
    /// URL of the first page
    pub base_url: String,
    /// Value of `top` on the first request
    pub page_size: PageSize,
    /// Progress cadence in pages
    pub log_every: u64,
    /// Directory the output file is created in
    pub output_dir: PathBuf,
}

impl WriterOptions {
    /// Extract writer settings from the run configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.to_string(),
            page_size: config.page_size,
            log_every: config.log_every.max(1),
            output_dir: config.output_dir.clone(),
        }
    }
}

/// Transient state of one pagination run
#[derive(Debug)]
struct FetchState {
    url: String,
    query: Option<Vec<(&'static str, String)>>,
    pages: u64,
    items: u64,
    /// Whether any item of the whole output has been written yet
    wrote_item: bool,
    api_total: Option<u64>,
    started: Instant,
}

impl FetchState {
    fn new(options: &WriterOptions) -> Self {
        Self {
            url: options.base_url.clone(),
            query: Some(vec![("top", options.page_size.to_string())]),
            pages: 0,
            items: 0,
            wrote_item: false,
            api_total: None,
            started: Instant::now(),
        }
    }

    fn record_page(&mut self, page: &Page) {
        self.pages += 1;
        self.items += page.items.len() as u64;
        if page.total_count.is_some() {
            self.api_total = page.total_count;
        }
    }

    /// Move to the next page; returns false once the listing is exhausted
    fn advance(&mut self, page: &Page) -> bool {
        match page.next_page() {
            Some(next) => {
                self.url = next.to_string();
                self.query = None;
                true
            }
            None => false,
        }
    }
}

/// Totals of a streamed array, before the file is attached
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamStats {
    /// Pages fetched
    pub pages: u64,
    /// Items written
    pub items: u64,
    /// Latest `totalCount` reported by the API
    pub api_total: Option<u64>,
    /// Time from the first request to the last page
    pub elapsed: Duration,
}

/// Paginates a [`PageSource`] into a JSON array file
pub struct StreamWriter<'a, S: PageSource + ?Sized, E: ItemEncoder> {
    source: &'a S,
    encoder: E,
    options: WriterOptions,
}

impl<'a, S: PageSource + ?Sized, E: ItemEncoder> StreamWriter<'a, S, E> {
    /// Create a writer over `source`, serializing items with `encoder`
    pub fn new(source: &'a S, encoder: E, options: WriterOptions) -> Self {
        Self {
            source,
            encoder,
            options,
        }
    }

    /// Run the export into a file named after the current local minute
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Local::now()).await
    }

    /// Run the export into the file named after `started_at`
    ///
    /// An existing file with the same name is truncated.
    pub async fn run_at(&self, started_at: DateTime<Local>) -> Result<RunSummary> {
        let path = output_path(&self.options.output_dir, started_at);
        info!(
            url = %self.options.base_url,
            top = self.options.page_size.get(),
            out = %path.display(),
            encoder = self.encoder.name(),
            "Starting export"
        );

        let file = File::create(&path).await?;
        let mut out = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let streamed = self.stream_to(&mut out).await;
        if streamed.is_err() {
            // Keep what was written so far; the array stays unterminated
            if let Err(e) = out.flush().await {
                debug!(error = %e, "Could not flush partial output");
            }
        }

        Ok(summary(path, streamed?))
    }

    /// Stream every page into `out` as one JSON array
    ///
    /// The closing bracket is written and `out` flushed only after the last page.
    pub async fn stream_to<W>(&self, out: &mut W) -> Result<StreamStats>
    where
        W: AsyncWrite + Unpin,
    {
        out.write_all(ARRAY_OPEN).await?;

        let mut state = FetchState::new(&self.options);
        let mut scratch = Vec::with_capacity(8 * 1024);

        loop {
            let page = self
                .source
                .fetch(&state.url, state.query.as_deref())
                .await?;

            for item in &page.items {
                scratch.clear();
                if state.wrote_item {
                    scratch.extend_from_slice(ITEM_SEPARATOR);
                }
                self.encoder.encode(item, &mut scratch)?;
                out.write_all(&scratch).await?;
                state.wrote_item = true;
            }
            state.record_page(&page);

            let elapsed = state.started.elapsed();
            if state.pages == 1 || state.pages % self.options.log_every.max(1) == 0 {
                info!(
                    page = state.pages,
                    added = page.items.len(),
                    total = state.items,
                    elapsed = %format_elapsed(elapsed),
                    rate = %format!("{:.1} items/sec", throughput(state.items, elapsed)),
                    "Fetched page"
                );
            } else {
                debug!(page = state.pages, added = page.items.len(), "Fetched page");
            }

            if !state.advance(&page) {
                info!(
                    pages = state.pages,
                    total_items = state.items,
                    api_total = %state
                        .api_total
                        .map_or_else(|| "n/a".to_string(), |total| total.to_string()),
                    elapsed = %format_elapsed(elapsed),
                    "Done"
                );
                out.write_all(ARRAY_CLOSE).await?;
                out.flush().await?;
                return Ok(StreamStats {
                    pages: state.pages,
                    items: state.items,
                    api_total: state.api_total,
                    elapsed,
                });
            }
        }
    }
}

fn summary(path: PathBuf, stats: StreamStats) -> RunSummary {
    RunSummary {
        path,
        pages: stats.pages,
        items: stats.items,
        api_total: stats.api_total,
        elapsed: stats.elapsed,
    }
}
