use std::collections::HashSet;

use nini_core::{Markup, Node, Post, Thread};
use url::Url;

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Clean up a freshly parsed thread. Never fails: anything that cannot be
/// improved is left as it was.
pub fn normalize(thread: Thread) -> Thread {
    let Thread {
        id,
        title,
        source_url,
        mut meta,
        posts,
    } = thread;

    meta.categories = meta
        .categories
        .iter()
        .filter_map(|category| normalize_optional(category))
        .collect();
    meta.starter = meta.starter.as_deref().and_then(normalize_optional);

    let mut seen = HashSet::new();
    let posts = posts
        .into_iter()
        .filter(|post| seen.insert(post.id.clone()))
        .enumerate()
        .map(|(ordinal, post)| normalize_post(post, ordinal as u32, &source_url))
        .collect();

    Thread {
        id,
        title: normalize_text(&title),
        source_url,
        meta,
        posts,
    }
}

fn normalize_post(mut post: Post, ordinal: u32, base: &Url) -> Post {
    post.ordinal = ordinal;
    post.id = post.id.trim().to_string();
    post.author = normalize_optional(&post.author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    post.author_id = post.author_id.as_deref().and_then(normalize_optional);
    post.parent = post
        .parent
        .as_deref()
        .map(str::trim)
        .filter(|parent| !parent.is_empty())
        .map(str::to_string);
    post.body = normalize_markup(post.body, base);
    post.quoted = post
        .quoted
        .map(|quoted| normalize_markup(quoted, base))
        .filter(|quoted| !quoted.is_empty());
    post.signature = post.signature.as_deref().and_then(normalize_optional);
    post.author_joined = post.author_joined.as_deref().and_then(normalize_optional);
    post.author_profile = post
        .author_profile
        .as_deref()
        .and_then(normalize_optional)
        .map(|profile| resolve_reference(&profile, base));
    post
}

pub fn normalize_markup(markup: Markup, base: &Url) -> Markup {
    Markup::new(normalize_blocks(markup.nodes, base))
}

/// Single-line text: invisible characters removed, entities decoded,
/// whitespace collapsed and trimmed.
pub fn normalize_text(text: &str) -> String {
    let mut last_was_space = true;
    collapse(&clean_chars(text), &mut last_was_space)
        .trim_end()
        .to_string()
}

fn normalize_optional(text: &str) -> Option<String> {
    let text = normalize_text(text);
    (!text.is_empty()).then_some(text)
}

fn normalize_blocks(nodes: Vec<Node>, base: &Url) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for node in nodes {
        if node.is_block() {
            if !run.is_empty() {
                push_block(Node::paragraph(std::mem::take(&mut run)), base, &mut blocks);
            }
            push_block(node, base, &mut blocks);
        } else {
            run.push(node);
        }
    }
    if !run.is_empty() {
        push_block(Node::paragraph(run), base, &mut blocks);
    }
    blocks
}

fn push_block(node: Node, base: &Url, blocks: &mut Vec<Node>) {
    match node {
        Node::Paragraph { children } => {
            let children = normalize_inline_run(children, base);
            if !children.is_empty() {
                blocks.push(Node::Paragraph { children });
            }
        }
        Node::Quote { children } => {
            let children = normalize_blocks(children, base);
            if !children.is_empty() {
                blocks.push(Node::Quote { children });
            }
        }
        Node::List { ordered, items } => {
            let items: Vec<Vec<Node>> = items
                .into_iter()
                .map(|item| {
                    if item.iter().any(Node::is_block) {
                        normalize_blocks(item, base)
                    } else {
                        normalize_inline_run(item, base)
                    }
                })
                .filter(|item| !item.is_empty())
                .collect();
            if !items.is_empty() {
                blocks.push(Node::List { ordered, items });
            }
        }
        inline => {
            let children = normalize_inline_run(vec![inline], base);
            if !children.is_empty() {
                blocks.push(Node::Paragraph { children });
            }
        }
    }
}

/// Normalize one line-oriented run of inline nodes, sharing whitespace
/// state across node boundaries so `"a " + "<b> b</b>"` keeps one space.
fn normalize_inline_run(nodes: Vec<Node>, base: &Url) -> Vec<Node> {
    let mut last_was_space = true;
    let mut out = normalize_inline(nodes, base, &mut last_was_space);
    trim_trailing(&mut out);
    out
}

fn normalize_inline(nodes: Vec<Node>, base: &Url, last_was_space: &mut bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text { text } => {
                let text = collapse(&clean_chars(&text), last_was_space);
                if !text.is_empty() {
                    out.push(Node::Text { text });
                }
            }
            Node::LineBreak => {
                trim_trailing(&mut out);
                if !out.is_empty() {
                    out.push(Node::LineBreak);
                }
                *last_was_space = true;
            }
            Node::Code { text } => {
                let text = clean_chars(&text).trim().to_string();
                if !text.is_empty() {
                    out.push(Node::Code { text });
                    *last_was_space = false;
                }
            }
            Node::Strong { children } => {
                let children = normalize_inline(children, base, last_was_space);
                if !children.is_empty() {
                    out.push(Node::Strong { children });
                }
            }
            Node::Emphasis { children } => {
                let children = normalize_inline(children, base, last_was_space);
                if !children.is_empty() {
                    out.push(Node::Emphasis { children });
                }
            }
            Node::Link { href, children } => {
                let href = resolve_reference(&href, base);
                let mut children = normalize_inline(children, base, last_was_space);
                if children.is_empty() {
                    children.push(Node::text(href.clone()));
                    *last_was_space = false;
                }
                out.push(Node::Link { href, children });
            }
            Node::Image { src, alt } => {
                out.push(Node::Image {
                    src: resolve_reference(&src, base),
                    alt: normalize_text(&alt),
                });
                *last_was_space = false;
            }
            block => {
                // Blocks nested in inline context lose their structure.
                let text = Markup::new(vec![block]).plain_text();
                let text = collapse(&clean_chars(&text), last_was_space);
                if !text.is_empty() {
                    out.push(Node::Text { text });
                }
            }
        }
    }
    out
}

/// Strip trailing whitespace and drop nodes left empty at the end of a run.
fn trim_trailing(nodes: &mut Vec<Node>) {
    while let Some(last) = nodes.last_mut() {
        match last {
            Node::Text { text } => {
                let trimmed = text.trim_end().len();
                text.truncate(trimmed);
                if !text.is_empty() {
                    return;
                }
            }
            Node::LineBreak => {}
            Node::Strong { children }
            | Node::Emphasis { children }
            | Node::Link { children, .. } => {
                trim_trailing(children);
                if !children.is_empty() {
                    return;
                }
            }
            _ => return,
        }
        nodes.pop();
    }
}

fn collapse(text: &str, last_was_space: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !*last_was_space {
                out.push(' ');
                *last_was_space = true;
            }
        } else {
            out.push(ch);
            *last_was_space = false;
        }
    }
    out
}

/// Remove zero-width and control characters and decode stray entities.
/// ZWNJ and ZWJ carry meaning in Persian script and are kept.
fn clean_chars(text: &str) -> String {
    decode_entities(text)
        .chars()
        .filter(|ch| !is_invisible(*ch))
        .collect()
}

fn is_invisible(ch: char) -> bool {
    match ch {
        '\u{200C}' | '\u{200D}' => false,
        '\u{200B}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => true,
        '\n' | '\r' | '\t' => false,
        ch => ch.is_control(),
    }
}

/// Decode HTML entities left behind by double escaping, repeating until
/// nothing changes so a second pass is a no-op.
fn decode_entities(text: &str) -> String {
    let mut current = decode_entities_once(text);
    loop {
        let next = decode_entities_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_entities_once(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| entity_char(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X'].as_slice()) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Absolute form of a link target. Fragment-only, `javascript:` and
/// `mailto:` targets, and references that cannot be resolved, are kept verbatim.
fn resolve_reference(reference: &str, base: &Url) -> String {
    let trimmed = reference.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty()
        || lower.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
    {
        return trimmed.to_string();
    }
    match Url::parse(trimmed) {
        Ok(url) => url.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .join(trimmed)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}
