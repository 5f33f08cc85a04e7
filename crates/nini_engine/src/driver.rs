use std::fmt;
use std::sync::Arc;

use nini_core::{
    update, ExportDocument, ExportFormat, Msg, PageWarning, RunStage, RunState, Thread, ThreadMeta,
};
use nini_logging::{scrape_error, scrape_info};
use url::Url;

use crate::export::{export_all, ExportError, ExportOptions};
use crate::fetch::{FetchSettings, Fetcher, NullSink, ProgressSink, ReqwestFetcher};
use crate::filename::thread_id_for_url;
use crate::normalize::normalize;
use crate::paginate::ThreadFetcher;
use crate::parse::{ParserRegistry, ThreadFragment};
use crate::retry::{RetryPolicy, RetryingFetcher};
use crate::{FetchError, RunEvent};

/// Everything one run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub fetch: FetchSettings,
    pub retry: RetryPolicy,
    /// Hard cap on the number of pages fetched for one thread.
    pub max_pages: u32,
    /// Page requests in flight at once when the page count is known.
    pub page_concurrency: usize,
    pub export: ExportOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            retry: RetryPolicy::default(),
            max_pages: 50,
            page_concurrency: 4,
            export: ExportOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub thread: Thread,
    /// One per requested format, in request order.
    pub documents: Vec<ExportDocument>,
    pub warnings: Vec<PageWarning>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug)]
pub struct RunError {
    pub stage: RunStage,
    pub cause: RunFailure,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.cause)
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

pub struct Driver {
    fetcher: Arc<dyn Fetcher>,
    config: RunConfig,
    parsers: ParserRegistry,
    sink: Arc<dyn ProgressSink>,
}

impl Driver {
    /// HTTP driver with retries.
    pub fn new(config: RunConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    pub fn with_sink(config: RunConfig, sink: Arc<dyn ProgressSink>) -> Self {
        let fetcher = RetryingFetcher::new(
            ReqwestFetcher::new(config.fetch.clone()),
            config.retry.clone(),
            sink.clone(),
        );
        Self {
            fetcher: Arc::new(fetcher),
            config,
            parsers: ParserRegistry::default(),
            sink,
        }
    }

    /// Driver over any fetcher, e.g. an in-memory one.
    pub fn with_fetcher(
        fetcher: Arc<dyn Fetcher>,
        config: RunConfig,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            config,
            parsers: ParserRegistry::default(),
            sink,
        }
    }

    pub async fn run(&self, url: &Url, formats: &[ExportFormat]) -> Result<RunReport, RunError> {
        let mut tracker = RunTracker::new(self.sink.clone());
        tracker.apply(Msg::Started {
            url: url.to_string(),
        });

        let thread_fetcher = ThreadFetcher::new(
            self.fetcher.as_ref(),
            self.config.max_pages,
            self.config.page_concurrency,
            self.config.fetch.request_delay,
            self.sink.clone(),
        );
        let pages = match thread_fetcher.fetch_thread(url).await {
            Ok(pages) => pages,
            Err(err) => return Err(tracker.fail(err.into())),
        };
        tracker.apply(Msg::PagesFetched {
            count: pages.len() as u32,
        });

        let mut fragments = Vec::with_capacity(pages.len());
        for page in &pages {
            match self.parsers.parse_page(page) {
                Ok(fragment) => {
                    tracker.apply(Msg::PageParsed { page: page.page });
                    fragments.push(fragment);
                }
                Err(err) => {
                    let warning = PageWarning {
                        page: page.page,
                        url: page.url.to_string(),
                        reason: err.to_string(),
                    };
                    self.sink.emit(RunEvent::PageRejected(warning.clone()));
                    tracker.apply(Msg::PageRejected(warning));
                }
            }
        }
        tracker.apply(Msg::ParsingFinished);

        let thread = normalize(assemble(url, pages.len() as u32, fragments));
        tracker.apply(Msg::Normalized);
        scrape_info!(
            "thread {} has {} posts from {} pages",
            thread.id,
            thread.posts.len(),
            thread.meta.total_pages
        );

        let documents = match export_all(&thread, formats, &self.config.export) {
            Ok(documents) => documents,
            Err(err) => return Err(tracker.fail(err.into())),
        };
        for document in &documents {
            tracker.apply(Msg::FormatRendered {
                format: document.format,
            });
        }
        tracker.apply(Msg::ExportsFinished);

        Ok(RunReport {
            thread,
            documents,
            warnings: tracker.state.warnings().to_vec(),
        })
    }
}

/// Merge per-page fragments into one thread, pages in ascending order.
fn assemble(url: &Url, total_pages: u32, mut fragments: Vec<ThreadFragment>) -> Thread {
    fragments.sort_by_key(|fragment| fragment.page);
    let id = thread_id_for_url(url);
    let title = fragments
        .iter()
        .find_map(|fragment| fragment.title.clone())
        .unwrap_or_else(|| format!("Thread {id}"));

    let mut meta = ThreadMeta {
        total_pages,
        ..ThreadMeta::default()
    };
    let mut posts = Vec::new();
    for fragment in fragments {
        if meta.categories.is_empty() {
            meta.categories = fragment.meta.categories;
        }
        meta.views = meta.views.or(fragment.meta.views);
        meta.starter = meta.starter.or(fragment.meta.starter);
        posts.extend(fragment.posts);
    }

    Thread {
        id,
        title,
        source_url: url.clone(),
        meta,
        posts,
    }
}

/// Keeps the pure run state in step with the pipeline and reports stage
/// changes to the sink.
struct RunTracker {
    state: RunState,
    sink: Arc<dyn ProgressSink>,
}

impl RunTracker {
    fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            state: RunState::new(),
            sink,
        }
    }

    fn apply(&mut self, msg: Msg) {
        let before = self.state.stage();
        self.state = update(std::mem::take(&mut self.state), msg);
        let after = self.state.stage();
        if before != after {
            self.sink.emit(RunEvent::StageChanged(after));
        }
    }

    fn fail(&mut self, cause: RunFailure) -> RunError {
        let stage = self.state.stage();
        scrape_error!("{} failed: {}", stage, cause);
        self.apply(Msg::Failed {
            reason: cause.to_string(),
        });
        RunError { stage, cause }
    }
}
