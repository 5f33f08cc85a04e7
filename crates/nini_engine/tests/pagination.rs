use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use nini_engine::{page_url, FailureKind, FetchError, FetchedBody, Fetcher, NullSink, ThreadFetcher};
use url::Url;

/// Serves canned HTML by URL and records every request.
#[derive(Default)]
struct MemoryFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    fn with_page(mut self, url: &Url, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedBody, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(html) => Ok(FetchedBody {
                final_url: url.clone(),
                content_type: Some("text/html; charset=utf-8".to_string()),
                bytes: Bytes::from(html.clone()),
            }),
            None => Err(FetchError::new(FailureKind::NotFound, url.to_string())),
        }
    }
}

fn base() -> Url {
    Url::parse("https://forum.example/topic/77/chain").unwrap()
}

/// A chain of pages where each only links to the next one.
fn chained(count: u32) -> MemoryFetcher {
    let mut fetcher = MemoryFetcher::default();
    for page in 1..=count {
        let url = if page == 1 { base() } else { page_url(&base(), page) };
        let next = if page < count {
            format!(r#"<link rel="next" href="{}">"#, page_url(&base(), page + 1))
        } else {
            String::new()
        };
        let html = format!("<html><head>{next}</head><p>page {page}</p></html>");
        fetcher = fetcher.with_page(&url, html);
    }
    fetcher
}

fn thread_fetcher(fetcher: &MemoryFetcher, cap: u32) -> ThreadFetcher<'_> {
    ThreadFetcher::new(fetcher, cap, 4, Duration::ZERO, Arc::new(NullSink))
}

#[tokio::test]
async fn chain_within_cap_is_fetched_in_order() {
    let fetcher = chained(5);
    let pages = thread_fetcher(&fetcher, 5).fetch_thread(&base()).await.unwrap();
    let numbers: Vec<u32> = pages.iter().map(|page| page.page).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn chain_beyond_cap_fails() {
    let fetcher = chained(6);
    let err = thread_fetcher(&fetcher, 5)
        .fetch_thread(&base())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::PaginationLimitExceeded { cap: 5 });
    assert_eq!(fetcher.requests().len(), 5);
}

#[tokio::test]
async fn chain_length_decides_the_cap_boundary() {
    for count in 1..=8 {
        let fetcher = chained(count);
        let result = thread_fetcher(&fetcher, 5).fetch_thread(&base()).await;
        assert_eq!(result.is_err(), count > 5, "chain of {count} pages");
    }
}

#[tokio::test]
async fn announced_last_page_is_fetched_concurrently_and_sorted() {
    let links: String = (1..=4)
        .map(|n| format!(r#"<li><a href="?page={n}">{n}</a></li>"#))
        .collect();
    let mut fetcher = MemoryFetcher::default().with_page(
        &base(),
        format!(r#"<ul class="pagination">{links}</ul><p>first</p>"#),
    );
    for page in 2..=4 {
        fetcher = fetcher.with_page(&page_url(&base(), page), format!("<p>page {page}</p>"));
    }

    let pages = thread_fetcher(&fetcher, 10).fetch_thread(&base()).await.unwrap();
    let numbers: Vec<u32> = pages.iter().map(|page| page.page).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(fetcher.requests().len(), 4);
}

#[tokio::test]
async fn announced_last_page_beyond_cap_fails_before_fetching_more() {
    let fetcher = MemoryFetcher::default().with_page(
        &base(),
        r#"<ul class="pagination"><li><a href="?page=40">40</a></li></ul>"#.to_string(),
    );
    let err = thread_fetcher(&fetcher, 10)
        .fetch_thread(&base())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::PaginationLimitExceeded { cap: 10 });
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn next_link_back_to_a_known_page_ends_the_walk() {
    let looping = format!(r#"<link rel="next" href="{}">"#, base());
    let fetcher = MemoryFetcher::default().with_page(&base(), looping);
    let pages = thread_fetcher(&fetcher, 5).fetch_thread(&base()).await.unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn missing_page_aborts_the_fetch() {
    let fetcher = MemoryFetcher::default().with_page(
        &base(),
        format!(r#"<link rel="next" href="{}">"#, page_url(&base(), 2)),
    );
    let err = thread_fetcher(&fetcher, 5)
        .fetch_thread(&base())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::NotFound);
}
