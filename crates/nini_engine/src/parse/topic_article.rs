use nini_core::{Markup, Post};
use scraper::{ElementRef, Html};

use super::markup::element_to_markup;
use super::pagination::detect_pagination;
use super::timestamp::parse_published;
use super::{
    ascii_digits, document_title, element_text, first_number, select_all, select_first,
    strip_post_prefix, FragmentMeta, PageContext, PageParser, ParseError, ThreadFragment,
};

const STARTER_ID: &str = "topic";
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Current forum layout: one `<article>` per post with schema.org markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopicArticleParser;

impl PageParser for TopicArticleParser {
    fn name(&self) -> &'static str {
        "topic-article"
    }

    fn matches(&self, doc: &Html) -> bool {
        let root = doc.root_element();
        select_first(root, "article#topic").is_some()
            || select_first(root, "article[id^='post-'] div.post-message").is_some()
    }

    fn parse(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<ThreadFragment, ParseError> {
        let root = doc.root_element();
        let mut posts = Vec::new();

        let starter = select_first(root, "article#topic");
        if ctx.page == 1 {
            if let Some(article) = starter {
                let mut post = read_article(article, STARTER_ID.to_string());
                post.is_topic_starter = true;
                posts.push(post);
            }
        }

        for article in select_all(root, "article[id^='post-']") {
            if article.value().classes().any(|class| class == "forum-native-ad") {
                continue;
            }
            let Some(id) = article.value().attr("id").map(strip_post_prefix) else {
                continue;
            };
            let post = read_article(article, id);
            if !post.body.is_empty() {
                posts.push(post);
            }
        }

        if posts.is_empty() && starter.is_none() {
            return Err(ParseError::UnexpectedShape(
                "no topic or post articles found".to_string(),
            ));
        }

        let title = select_first(root, "h1.topic-title")
            .and_then(element_text)
            .or_else(|| document_title(doc));

        let meta = FragmentMeta {
            categories: breadcrumb(doc),
            views: starter
                .and_then(|article| select_first(article, "meta[itemprop=userInteractionCount]"))
                .and_then(|meta| meta.value().attr("content"))
                .and_then(|content| ascii_digits(content).trim().parse::<u64>().ok()),
            starter: starter
                .and_then(|article| select_first(article, "span[itemprop=name]"))
                .and_then(element_text),
        };

        Ok(ThreadFragment {
            page: ctx.page,
            layout: self.name(),
            title,
            meta,
            posts,
            pagination: detect_pagination(doc, ctx.url),
        })
    }
}

fn read_article(article: ElementRef<'_>, id: String) -> Post {
    let author = select_first(article, "span[itemprop=name]")
        .and_then(element_text)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let body = select_first(article, "div.post-message")
        .map(element_to_markup)
        .unwrap_or_default();

    let mut post = Post::new(id, author, body);

    let profile = select_first(article, "a[itemprop=url]")
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());
    post.author_id = profile.as_deref().and_then(user_id_from_profile);
    post.author_profile = profile;

    post.author_joined = select_first(article, "div.reg-date")
        .and_then(element_text)
        .map(|text| join_date(&text));
    post.author_post_count = select_first(article, "div.post-count")
        .and_then(element_text)
        .and_then(|text| first_number(&text));

    post.timestamp = select_first(article, "meta[itemprop=datepublished]")
        .or_else(|| select_first(article, "meta[itemprop=datePublished]"))
        .and_then(|meta| meta.value().attr("content"))
        .and_then(parse_published);

    if let Some(reply) = select_first(article, "div.topic-post__quotation div.reply-message") {
        post.parent = reply
            .value()
            .attr("data-id")
            .map(strip_post_prefix)
            .filter(|id| !id.is_empty());
        post.quoted = element_text(reply).map(Markup::from_text);
    }

    post.likes = select_first(article, "a.like-count span")
        .and_then(element_text)
        .and_then(|text| first_number(&text))
        .unwrap_or(0);
    post.signature = select_first(article, "div.topic-post__signature").and_then(element_text);

    post
}

/// Breadcrumb trail without the leading forum-root crumb.
fn breadcrumb(doc: &Html) -> Vec<String> {
    let root = doc.root_element();
    let Some(list) = select_first(root, "ol[itemtype$='BreadcrumbList']") else {
        return Vec::new();
    };
    select_all(list, "li[itemprop=itemListElement]")
        .into_iter()
        .filter_map(|item| select_first(item, "span[itemprop=name]").and_then(element_text))
        .skip(1)
        .collect()
}

/// First all-digit path segment of a profile link, e.g. `/user/4521/name`.
fn user_id_from_profile(href: &str) -> Option<String> {
    let path = href.split(&['?', '#'][..]).next().unwrap_or(href);
    path.split('/')
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// `"عضویت: ۱۴۰۱/۰۶/۱۶"` -> `"1401/06/16"`; other text is kept as is.
fn join_date(text: &str) -> String {
    let ascii = ascii_digits(text);
    let date: String = ascii
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '/')
        .collect();
    if date.matches('/').count() == 2 {
        date
    } else {
        text.to_string()
    }
}
