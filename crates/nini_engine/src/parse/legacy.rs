use nini_core::Post;
use scraper::{ElementRef, Html};

use super::markup::element_to_markup;
use super::pagination::detect_pagination;
use super::timestamp::parse_jalali_stamp;
use super::{
    document_title, element_text, select_all, select_first, strip_post_prefix, FragmentMeta,
    PageContext, PageParser, ParseError, ThreadFragment,
};

/// Older forum layout: `div.post` blocks with a username link, a
/// `post-content` body and a Jalali `span.timestamp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyPostParser;

impl PageParser for LegacyPostParser {
    fn name(&self) -> &'static str {
        "legacy-post"
    }

    fn matches(&self, doc: &Html) -> bool {
        let root = doc.root_element();
        select_first(root, "div.post a.username").is_some()
            && select_first(root, "div.post [class*='post-content']").is_some()
    }

    fn parse(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<ThreadFragment, ParseError> {
        let root = doc.root_element();
        let containers: Vec<ElementRef<'_>> = select_all(root, "div.post")
            .into_iter()
            .filter(|post| !has_post_ancestor(*post))
            .collect();
        if containers.is_empty() {
            return Err(ParseError::UnexpectedShape("no div.post blocks".to_string()));
        }

        let posts: Vec<Post> = containers
            .into_iter()
            .enumerate()
            .filter_map(|(index, container)| read_post(container, ctx.page, index))
            .collect();

        let starter = if ctx.page == 1 {
            posts.first().map(|post| post.author.clone())
        } else {
            None
        };

        Ok(ThreadFragment {
            page: ctx.page,
            layout: self.name(),
            title: document_title(doc),
            meta: FragmentMeta {
                starter,
                ..FragmentMeta::default()
            },
            posts,
            pagination: detect_pagination(doc, ctx.url),
        })
    }
}

fn read_post(container: ElementRef<'_>, page: u32, index: usize) -> Option<Post> {
    let body = select_first(container, "[class*='post-content']").map(element_to_markup)?;
    if body.is_empty() {
        return None;
    }

    let id = container
        .value()
        .attr("data-post-id")
        .or_else(|| container.value().attr("id"))
        .map(strip_post_prefix)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("p{page}-{index}"));

    let username = select_first(container, "a.username");
    let author = username
        .and_then(element_text)
        .unwrap_or_else(|| "Unknown".to_string());

    let mut post = Post::new(id, author, body);
    post.author_profile = username
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string());
    post.timestamp = select_first(container, "span.timestamp")
        .and_then(element_text)
        .and_then(|text| parse_jalali_stamp(&text));
    post.parent = container
        .value()
        .attr("data-reply-to")
        .map(strip_post_prefix)
        .filter(|id| !id.is_empty());
    post.is_topic_starter = page == 1 && index == 0;
    Some(post)
}

fn has_post_ancestor(element: ElementRef<'_>) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        ancestor.value().name() == "div" && ancestor.value().classes().any(|class| class == "post")
    })
}
