use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, StreamExt, TryStreamExt};
use nini_logging::{scrape_debug, scrape_info};
use scraper::Html;
use url::Url;

use crate::decode::decode_page;
use crate::fetch::{Fetcher, ProgressSink};
use crate::parse::{detect_pagination, page_number_of, page_url, PaginationInfo};
use crate::{FailureKind, FetchError, RawPage, RunEvent};

/// Downloads every page of a thread.
///
/// When the first page names its last page, the remaining pages are fetched
/// concurrently; otherwise "next" links are walked one at a time.
pub struct ThreadFetcher<'a> {
    fetcher: &'a dyn Fetcher,
    max_pages: u32,
    page_concurrency: usize,
    request_delay: Duration,
    sink: Arc<dyn ProgressSink>,
}

impl<'a> ThreadFetcher<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        max_pages: u32,
        page_concurrency: usize,
        request_delay: Duration,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            max_pages: max_pages.max(1),
            page_concurrency: page_concurrency.max(1),
            request_delay,
            sink,
        }
    }

    /// Pages in order, numbered from 1. Any fetch failure aborts the walk.
    pub async fn fetch_thread(&self, url: &Url) -> Result<Vec<RawPage>, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("unsupported scheme in {url}"),
            ));
        }

        let first = self.fetch_page(1, url.clone()).await?;
        let info = pagination_of(&first);
        let mut pages = vec![first];

        if let Some(last) = info.last_page.filter(|last| *last > 1) {
            if last > self.max_pages {
                return Err(self.limit_exceeded());
            }
            scrape_info!("thread has {} pages", last);
            let mut planned = self.fetch_planned(url, last).await?;
            pages.append(&mut planned);
        }

        self.follow_next_links(&mut pages, info).await?;
        Ok(pages)
    }

    async fn fetch_planned(&self, url: &Url, last: u32) -> Result<Vec<RawPage>, FetchError> {
        let mut pages: Vec<RawPage> = stream::iter(2..=last)
            .map(|page| self.fetch_page(page, page_url(url, page)))
            .buffer_unordered(self.page_concurrency)
            .try_collect()
            .await?;
        pages.sort_by_key(|page| page.page);
        Ok(pages)
    }

    /// Walk "next" links from the last fetched page until they run out,
    /// point back at a known page, or the page cap would be crossed.
    async fn follow_next_links(
        &self,
        pages: &mut Vec<RawPage>,
        first_info: PaginationInfo,
    ) -> Result<(), FetchError> {
        let mut seen: HashSet<String> = pages
            .iter()
            .flat_map(|page| [page.url.to_string(), page.final_url.to_string()])
            .collect();
        let mut info = match pages.last() {
            Some(last) if last.page > 1 => pagination_of(last),
            _ => first_info,
        };

        while let Some(next) = info.next.take() {
            let current = pages.last().map_or(0, |page| page.page);
            if seen.contains(next.as_str()) {
                scrape_debug!("next link {} already fetched, stopping", next);
                break;
            }
            if page_number_of(&next).is_some_and(|number| number <= current) {
                scrape_debug!("next link {} points backwards, stopping", next);
                break;
            }
            if current >= self.max_pages {
                return Err(self.limit_exceeded());
            }
            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            let page = self.fetch_page(current + 1, next.clone()).await?;
            seen.insert(next.to_string());
            seen.insert(page.final_url.to_string());
            info = pagination_of(&page);
            pages.push(page);
        }
        Ok(())
    }

    async fn fetch_page(&self, page: u32, url: Url) -> Result<RawPage, FetchError> {
        let body = self.fetcher.fetch(&url).await?;
        self.sink.emit(RunEvent::PageFetched {
            page,
            url: url.to_string(),
            bytes: body.bytes.len() as u64,
        });
        Ok(RawPage::new(page, url, body))
    }

    fn limit_exceeded(&self) -> FetchError {
        FetchError::new(
            FailureKind::PaginationLimitExceeded {
                cap: self.max_pages,
            },
            format!("thread has more than {} pages", self.max_pages),
        )
    }
}

/// Pagination of a fetched page; an empty page counts as the last one.
fn pagination_of(page: &RawPage) -> PaginationInfo {
    match decode_page(&page.bytes, page.content_type.as_deref()) {
        Ok(decoded) => detect_pagination(&Html::parse_document(&decoded.html), &page.final_url),
        Err(_) => PaginationInfo::default(),
    }
}
