use std::sync::{Arc, Mutex};
use std::time::Duration;

use nini_core::{ExportFormat, RunStage};
use nini_engine::{
    thread_from_json, Driver, FailureKind, ProgressSink, RetryPolicy, RunConfig, RunEvent,
    RunFailure,
};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC_PAGE: &str = include_str!("fixtures/topic_page1.html");
const THREAD_PATH: &str = "/discussion/thread/8512345";

const LAST_PAGE: &str = r#"<html><body>
  <article id="post-2001" class="topic-post">
    <a itemprop="url" href="/user/9/kim"><span itemprop="name">Kim</span></a>
    <div class="post-message">Same here, page three.</div>
  </article>
</body></html>"#;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingSink {
    fn stages(&self) -> Vec<RunStage> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                RunEvent::StageChanged(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    fn rejected_pages(&self) -> Vec<u32> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                RunEvent::PageRejected(warning) => Some(warning.page),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn config() -> RunConfig {
    RunConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(10),
            multiplier: 2,
        },
        ..RunConfig::default()
    }
}

const MIDDLE_PAGE: &str = r#"<html><body>
  <article id="post-1501" class="topic-post">
    <a itemprop="url" href="/user/7/sara"><span itemprop="name">Sara</span></a>
    <div class="post-message">Middle of the thread.</div>
  </article>
</body></html>"#;

const MAINTENANCE_PAGE: &str = "<html><body><p>maintenance</p></body></html>";

/// `html` with one byte that is not valid UTF-8 appended.
fn with_stray_byte(html: &str) -> Vec<u8> {
    let mut bytes = html.as_bytes().to_vec();
    bytes.push(0xFF);
    bytes
}

async fn mount_page(server: &MockServer, page: Option<&str>, body: impl Into<Vec<u8>>) {
    let builder = Mock::given(method("GET")).and(path(THREAD_PATH));
    let response = ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8");
    // Numbered pages outrank the bare thread URL, which matches every query.
    let mock = match page {
        Some(number) => builder
            .and(query_param("page", number))
            .respond_with(response)
            .with_priority(1),
        None => builder.respond_with(response),
    };
    mock.mount(server).await;
}

fn thread_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}{THREAD_PATH}", server.uri())).unwrap()
}

#[tokio::test]
async fn broken_middle_page_is_skipped_with_a_warning() {
    nini_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_page(&server, None, TOPIC_PAGE).await;
    mount_page(&server, Some("2"), "").await;
    mount_page(&server, Some("3"), LAST_PAGE).await;

    let sink = Arc::new(RecordingSink::default());
    let driver = Driver::with_sink(config(), sink.clone());
    let report = driver
        .run(
            &thread_url(&server),
            &[ExportFormat::Org, ExportFormat::Markdown, ExportFormat::Json],
        )
        .await
        .expect("run succeeds despite one bad page");

    let thread = &report.thread;
    assert_eq!(thread.id, "8512345");
    assert_eq!(thread.title, "درباره خواب کودک");
    assert_eq!(thread.meta.total_pages, 3);
    assert_eq!(thread.meta.views, Some(1520));

    let posts: Vec<(&str, u32, u32)> = thread
        .posts
        .iter()
        .map(|post| (post.id.as_str(), post.page, post.ordinal))
        .collect();
    assert_eq!(
        posts,
        vec![("topic", 1, 0), ("1001", 1, 1), ("1002", 1, 2), ("2001", 3, 3)]
    );

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].page, 2);
    assert_eq!(sink.rejected_pages(), vec![2]);

    let formats: Vec<ExportFormat> = report.documents.iter().map(|doc| doc.format).collect();
    assert_eq!(
        formats,
        vec![ExportFormat::Org, ExportFormat::Markdown, ExportFormat::Json]
    );
    let json = report
        .documents
        .iter()
        .find(|doc| doc.format == ExportFormat::Json)
        .unwrap();
    assert_eq!(&thread_from_json(&json.content).unwrap(), thread);

    assert_eq!(
        sink.stages(),
        vec![
            RunStage::Fetching,
            RunStage::Parsing,
            RunStage::Normalizing,
            RunStage::Exporting,
            RunStage::Done,
        ]
    );
}

#[tokio::test]
async fn stray_byte_on_the_first_page_keeps_pagination() {
    let server = MockServer::start().await;
    mount_page(&server, None, with_stray_byte(TOPIC_PAGE)).await;
    mount_page(&server, Some("2"), MIDDLE_PAGE).await;
    mount_page(&server, Some("3"), LAST_PAGE).await;

    let report = Driver::new(config())
        .run(&thread_url(&server), &[ExportFormat::Json])
        .await
        .unwrap();

    assert_eq!(report.thread.meta.total_pages, 3);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let ids: Vec<&str> = report.thread.posts.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(ids, vec!["topic", "1001", "1002", "1501", "2001"]);
}

#[tokio::test]
async fn inner_pages_with_stray_bytes_or_no_posts() {
    let server = MockServer::start().await;
    mount_page(&server, None, TOPIC_PAGE).await;
    mount_page(&server, Some("2"), with_stray_byte(MIDDLE_PAGE)).await;
    mount_page(&server, Some("3"), MAINTENANCE_PAGE).await;

    let sink = Arc::new(RecordingSink::default());
    let report = Driver::with_sink(config(), sink.clone())
        .run(&thread_url(&server), &[ExportFormat::Org])
        .await
        .unwrap();

    // The stray byte costs nothing; the page without posts is skipped.
    let posts: Vec<(&str, u32)> = report
        .thread
        .posts
        .iter()
        .map(|post| (post.id.as_str(), post.page))
        .collect();
    assert_eq!(
        posts,
        vec![("topic", 1), ("1001", 1), ("1002", 1), ("1501", 2)]
    );
    assert_eq!(sink.rejected_pages(), vec![3]);
    assert_eq!(report.warnings.len(), 1);
    assert!(
        report.warnings[0].reason.starts_with("unexpected document shape"),
        "{}",
        report.warnings[0].reason
    );
    assert_eq!(report.thread.meta.total_pages, 3);
}

#[tokio::test]
async fn links_in_posts_point_back_at_the_forum() {
    let server = MockServer::start().await;
    mount_page(&server, None, TOPIC_PAGE).await;
    mount_page(&server, Some("2"), LAST_PAGE).await;
    mount_page(&server, Some("3"), LAST_PAGE).await;

    let report = Driver::new(config())
        .run(&thread_url(&server), &[ExportFormat::Markdown])
        .await
        .unwrap();

    let markdown = String::from_utf8(report.documents[0].content.clone()).unwrap();
    let guide = format!("[this guide]({}/articles/sleep)", server.uri());
    assert!(markdown.contains(&guide), "{markdown}");
    // Both later pages carry the same post; it is kept once.
    assert_eq!(report.thread.posts.len(), 4);
}

#[tokio::test]
async fn missing_thread_fails_while_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(THREAD_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let err = Driver::with_sink(config(), sink.clone())
        .run(&thread_url(&server), &[ExportFormat::Org])
        .await
        .unwrap_err();

    assert_eq!(err.stage, RunStage::Fetching);
    match &err.cause {
        RunFailure::Fetch(fetch) => assert_eq!(fetch.kind, FailureKind::NotFound),
        other => panic!("unexpected failure: {other}"),
    }
    assert_eq!(sink.stages(), vec![RunStage::Fetching, RunStage::Failed]);
    assert!(err.to_string().starts_with("fetching failed:"));
}

#[tokio::test]
async fn page_count_beyond_the_cap_is_an_error() {
    let server = MockServer::start().await;
    mount_page(&server, None, TOPIC_PAGE).await;

    let config = RunConfig {
        max_pages: 2,
        ..config()
    };
    let err = Driver::new(config)
        .run(&thread_url(&server), &[ExportFormat::Json])
        .await
        .unwrap_err();

    match err.cause {
        RunFailure::Fetch(fetch) => {
            assert_eq!(fetch.kind, FailureKind::PaginationLimitExceeded { cap: 2 })
        }
        other => panic!("unexpected failure: {other}"),
    }
}
