use std::fmt::Write as _;

use nini_core::{reply_order, reply_order_of, Post, Thread};

use super::text::{isolate_rtl, jalali_stamp, render_blocks, starts_right_to_left, Syntax};
use super::ExportOptions;
use crate::parse::page_url;

struct OrgSyntax;

impl Syntax for OrgSyntax {
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }

    fn strong(&self, inner: &str) -> String {
        format!("*{inner}*")
    }

    fn emphasis(&self, inner: &str) -> String {
        format!("/{inner}/")
    }

    fn code(&self, text: &str) -> String {
        format!("~{text}~")
    }

    fn link(&self, href: &str, label: &str) -> String {
        if label.is_empty() || label == href {
            format!("[[{href}]]")
        } else {
            format!("[[{href}][{}]]", label.replace(&['[', ']'][..], ""))
        }
    }

    fn image(&self, src: &str, _alt: &str) -> String {
        format!("[[{src}]]")
    }

    fn line_break(&self) -> &'static str {
        "\\\\\n"
    }

    fn quote(&self, lines: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(lines.len() + 2);
        out.push("#+begin_quote".to_string());
        out.extend(lines);
        out.push("#+end_quote".to_string());
        out
    }

    fn list_marker(&self, ordered: bool, index: usize) -> String {
        if ordered {
            format!("{}. ", index + 1)
        } else {
            "- ".to_string()
        }
    }

    fn guard_line(&self, line: String) -> String {
        if line.starts_with('*') || line.starts_with("#+") || line.starts_with(':') {
            format!(" {line}")
        } else {
            line
        }
    }
}

pub(crate) fn render(thread: &Thread, options: &ExportOptions) -> String {
    let mut out = String::new();
    let meta = &thread.meta;

    let _ = writeln!(out, "#+TITLE: {}", thread.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "* {}", thread.title);
    let _ = writeln!(out, ":PROPERTIES:");
    property(&mut out, "TOPIC_ID", &thread.id);
    property(&mut out, "ORIGINAL_URL", thread.source_url.as_str());
    property(&mut out, "TOTAL_PAGES", &meta.total_pages.to_string());
    property(&mut out, "UNIQUE_AUTHORS", &thread.unique_authors().to_string());
    if let Some(starter) = &meta.starter {
        property(&mut out, "AUTHOR", starter);
    }
    let started = thread
        .posts
        .iter()
        .find(|post| post.is_topic_starter)
        .and_then(|post| post.timestamp.as_ref());
    if let Some(timestamp) = started {
        property(&mut out, "DATE", &timestamp.to_rfc3339());
    }
    if let Some(views) = meta.views {
        property(&mut out, "VIEWS", &views.to_string());
    }
    if !meta.categories.is_empty() {
        property(&mut out, "CATEGORIES", &meta.categories.join(" > "));
    }
    property(&mut out, "TOTAL_POSTS", &thread.posts.len().to_string());
    let _ = writeln!(out, ":END:");

    if !options.group_by_page {
        for entry in reply_order(thread) {
            out.push('\n');
            render_post(&mut out, &thread.posts[entry.index], 2 + entry.depth, options);
        }
        return out;
    }

    for page_posts in thread.posts.chunk_by(|a, b| a.page == b.page) {
        let Some(first) = page_posts.first() else {
            continue;
        };
        out.push('\n');
        let _ = writeln!(
            out,
            "** [[{}][{} Page]]",
            page_link(thread, first.page),
            ordinal_word(first.page)
        );
        for entry in reply_order_of(page_posts) {
            out.push('\n');
            render_post(&mut out, &page_posts[entry.index], 3 + entry.depth, options);
        }
    }
    out
}

/// The thread URL itself for the first page.
fn page_link(thread: &Thread, page: u32) -> String {
    if page <= 1 {
        thread.source_url.to_string()
    } else {
        page_url(&thread.source_url, page).to_string()
    }
}

fn ordinal_word(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn render_post(out: &mut String, post: &Post, level: usize, options: &ExportOptions) {
    let stars = "*".repeat(level);
    let _ = writeln!(out, "{stars} {}", heading(post, options));

    let _ = writeln!(out, ":PROPERTIES:");
    property(out, "CUSTOM_ID", &post.id);
    property(out, "AUTHOR", &post.author);
    if let Some(timestamp) = &post.timestamp {
        property(out, "DATE", &timestamp.to_rfc3339());
    }
    if let Some(joined) = &post.author_joined {
        property(out, "AUTHOR_JOIN_DATE", joined);
    }
    if let Some(count) = post.author_post_count {
        property(out, "AUTHOR_POST_COUNT", &count.to_string());
    }
    if post.likes > 0 {
        property(out, "LIKES", &post.likes.to_string());
    }
    property(out, "PAGE", &post.page.to_string());
    if let Some(parent) = &post.parent {
        property(out, "REPLY_TO_ID", parent);
    }
    let _ = writeln!(out, ":END:");

    if let Some(parent) = &post.parent {
        let _ = writeln!(out, "- [[#{parent}][In Reply To]]");
    }

    if let Some(quoted) = &post.quoted {
        out.push('\n');
        for line in OrgSyntax.quote(render_blocks(&quoted.nodes, &OrgSyntax)) {
            let _ = writeln!(out, "{line}");
        }
    }

    if !post.body.is_empty() {
        out.push('\n');
        for line in render_blocks(&post.body.nodes, &OrgSyntax) {
            let _ = writeln!(out, "{line}");
        }
    }

    if let Some(signature) = &post.signature {
        out.push('\n');
        let _ = writeln!(out, "{stars}* Signature");
        let _ = writeln!(out, "{}", OrgSyntax.guard_line(signature.clone()));
    }
}

fn heading(post: &Post, options: &ExportOptions) -> String {
    let mut parts = Vec::new();
    if post.likes > 0 {
        parts.push(format!("@likes/{}", post.likes));
    }
    if options.bidi_isolate_authors && starts_right_to_left(&post.author) {
        parts.push(isolate_rtl(&post.author));
    } else {
        parts.push(post.author.clone());
    }
    if let (Some(joined), Some(count)) = (&post.author_joined, post.author_post_count) {
        parts.push(format!("({joined}, {count} posts)"));
    }
    if let Some(stamp) = post.timestamp.as_ref().and_then(jalali_stamp) {
        parts.push(format!("[{stamp}]"));
    }
    parts.join(" ")
}

fn property(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, ":{key}: {}", value.replace('\n', " "));
}

#[cfg(test)]
mod tests {
    use super::ordinal_word;

    #[test]
    fn page_ordinals_use_english_suffixes() {
        let words: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 102]
            .into_iter()
            .map(ordinal_word)
            .collect();
        assert_eq!(
            words,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "102nd"]
        );
    }
}
