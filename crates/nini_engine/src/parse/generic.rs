use nini_core::Post;
use scraper::{ElementRef, Html};

use super::markup::element_to_markup;
use super::pagination::detect_pagination;
use super::timestamp::parse_published;
use super::{
    document_title, element_text, select_all, select_first, strip_post_prefix, FragmentMeta,
    PageContext, PageParser, ParseError, ThreadFragment,
};

/// Candidate post containers, most specific first.
const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    "div[class*='post']",
    "li[class*='post']",
    "div[class*='message']",
    "div[class*='comment']",
];

const BODY_SELECTORS: &[&str] = &[
    "[class*='content']",
    "[class*='message']",
    "[class*='body']",
    "[class*='text']",
];

const AUTHOR_SELECTORS: &[&str] = &[
    "[itemprop=name]",
    ".author",
    ".username",
    "[class*='author']",
    "a[href*='/user/']",
];

/// Best-effort fallback for pages no other layout recognizes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericParser;

impl PageParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _doc: &Html) -> bool {
        true
    }

    fn parse(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<ThreadFragment, ParseError> {
        let root = doc.root_element();
        let containers = CONTAINER_SELECTORS
            .iter()
            .map(|css| outermost(select_all(root, css)))
            .find(|found| !found.is_empty())
            .ok_or_else(|| ParseError::UnexpectedShape("no post containers".to_string()))?;

        let posts: Vec<Post> = containers
            .into_iter()
            .enumerate()
            .filter_map(|(index, container)| read_post(container, ctx.page, index))
            .collect();
        if posts.is_empty() {
            return Err(ParseError::UnexpectedShape(
                "post containers carry no text".to_string(),
            ));
        }

        Ok(ThreadFragment {
            page: ctx.page,
            layout: self.name(),
            title: document_title(doc),
            meta: FragmentMeta::default(),
            posts,
            pagination: detect_pagination(doc, ctx.url),
        })
    }
}

fn read_post(container: ElementRef<'_>, page: u32, index: usize) -> Option<Post> {
    let body_element = BODY_SELECTORS
        .iter()
        .find_map(|css| select_first(container, css))
        .unwrap_or(container);
    let body = element_to_markup(body_element);
    if body.is_empty() {
        return None;
    }

    let id = container
        .value()
        .attr("id")
        .map(strip_post_prefix)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("p{page}-{index}"));
    let author = AUTHOR_SELECTORS
        .iter()
        .find_map(|css| select_first(container, css).and_then(element_text))
        .unwrap_or_else(|| "Unknown".to_string());

    let mut post = Post::new(id, author, body);
    post.timestamp = select_first(container, "time[datetime]")
        .and_then(|time| time.value().attr("datetime"))
        .and_then(parse_published);
    Some(post)
}

/// Drop candidates nested inside another candidate.
fn outermost(candidates: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: Vec<_> = candidates.iter().map(|element| element.id()).collect();
    candidates
        .into_iter()
        .filter(|element| {
            !element
                .ancestors()
                .any(|ancestor| ids.contains(&ancestor.id()))
        })
        .collect()
}
