//! Page parsers: turn one decoded page into a fragment of the thread.
//!
//! Forum markup has changed over time, so parsing goes through the
//! [`PageParser`] trait. The registry asks each known layout whether it
//! recognizes the page and falls back to a best-effort generic parser.
mod generic;
mod legacy;
mod markup;
mod pagination;
mod timestamp;
mod topic_article;

use nini_core::Post;
use nini_logging::{scrape_debug, scrape_warn};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::decode::{decode_page, DecodeError};
use crate::RawPage;

pub use generic::GenericParser;
pub use legacy::LegacyPostParser;
pub use markup::element_to_markup;
pub use pagination::{detect_pagination, page_number_of, page_url, PaginationInfo};
pub use timestamp::{parse_jalali_stamp, parse_published};
pub use topic_article::TopicArticleParser;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not decode page: {0}")]
    Decode(#[from] DecodeError),
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),
}

/// Thread-level details a page may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentMeta {
    pub categories: Vec<String>,
    pub views: Option<u64>,
    pub starter: Option<String>,
}

/// Everything one page contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadFragment {
    pub page: u32,
    /// Name of the parser that produced this fragment.
    pub layout: &'static str,
    pub title: Option<String>,
    pub meta: FragmentMeta,
    /// Posts in page order; `page` is set, `ordinal` is not yet meaningful.
    pub posts: Vec<Post>,
    pub pagination: PaginationInfo,
}

pub struct PageContext<'a> {
    pub page: u32,
    pub url: &'a Url,
}

pub trait PageParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the document carries this layout's markup signature.
    fn matches(&self, doc: &Html) -> bool;

    fn parse(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<ThreadFragment, ParseError>;
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn PageParser>>,
    fallback: Box<dyn PageParser>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self {
            parsers: vec![Box::new(TopicArticleParser), Box::new(LegacyPostParser)],
            fallback: Box::new(GenericParser),
        }
    }
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Box<dyn PageParser>>, fallback: Box<dyn PageParser>) -> Self {
        Self { parsers, fallback }
    }

    pub fn select(&self, doc: &Html) -> &dyn PageParser {
        self.parsers
            .iter()
            .find(|parser| parser.matches(doc))
            .map(|parser| parser.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Decode and parse one fetched page.
    pub fn parse_page(&self, raw: &RawPage) -> Result<ThreadFragment, ParseError> {
        let decoded = decode_page(&raw.bytes, raw.content_type.as_deref())?;
        if decoded.had_errors {
            scrape_warn!(
                "page {} has malformed {} bytes; replaced them and kept parsing",
                raw.page,
                decoded.encoding_label
            );
        }
        let doc = Html::parse_document(&decoded.html);
        let parser = self.select(&doc);
        scrape_debug!(
            "page {} ({}) parsed with {} layout",
            raw.page,
            decoded.encoding_label,
            parser.name()
        );
        let ctx = PageContext {
            page: raw.page,
            url: &raw.final_url,
        };
        let mut fragment = parser.parse(&doc, &ctx)?;
        for post in &mut fragment.posts {
            post.page = raw.page;
        }
        Ok(fragment)
    }
}

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Text content, whitespace-collapsed and trimmed; `None` when blank.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Page title from the first `<h1>` or `<title>`.
pub(crate) fn document_title(doc: &Html) -> Option<String> {
    let root = doc.root_element();
    select_first(root, "h1")
        .and_then(element_text)
        .or_else(|| select_first(root, "title").and_then(element_text))
}

/// Replace Persian and Arabic-Indic digits with ASCII ones.
pub(crate) fn ascii_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            _ => c,
        })
        .collect()
}

/// First run of digits in `text` (any script), e.g. `"تعداد پست: ۶۷۴"` -> 674.
pub(crate) fn first_number(text: &str) -> Option<u32> {
    let ascii = ascii_digits(text);
    let digits: String = ascii
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// `post-123` -> `123`; anything else is kept.
pub(crate) fn strip_post_prefix(id: &str) -> String {
    let id = id.trim();
    id.strip_prefix("post-").unwrap_or(id).to_string()
}
