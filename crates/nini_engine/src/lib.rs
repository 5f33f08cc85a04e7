//! Scrape engine: fetch, parse, normalize and export discussion threads.
mod decode;
mod driver;
mod export;
mod fetch;
mod filename;
mod normalize;
mod paginate;
mod parse;
mod persist;
mod retry;
mod types;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use driver::{Driver, RunConfig, RunError, RunFailure, RunReport};
pub use export::{export, export_all, thread_from_json, ExportError, ExportOptions, FORMAT_VERSION};
pub use fetch::{FetchSettings, Fetcher, LogSink, NullSink, ProgressSink, ReqwestFetcher};
pub use filename::{suggested_filename, thread_id_for_url};
pub use normalize::{normalize, normalize_markup, normalize_text};
pub use paginate::ThreadFetcher;
pub use parse::{
    detect_pagination, element_to_markup, page_number_of, page_url, parse_jalali_stamp,
    parse_published, FragmentMeta, GenericParser, LegacyPostParser, PageContext, PageParser,
    PaginationInfo, ParseError, ParserRegistry, ThreadFragment, TopicArticleParser,
};
pub use persist::{OutputDir, PersistError};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use types::{FailureKind, FetchError, FetchedBody, RawPage, RunEvent};
