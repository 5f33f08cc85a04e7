use std::fmt::Write as _;

use nini_core::{reply_order, Post, Thread};

use super::text::{isolate_rtl, render_blocks, starts_right_to_left, Syntax};
use super::ExportOptions;

struct MarkdownSyntax;

impl Syntax for MarkdownSyntax {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '|') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    fn strong(&self, inner: &str) -> String {
        format!("**{inner}**")
    }

    fn emphasis(&self, inner: &str) -> String {
        format!("_{inner}_")
    }

    fn code(&self, text: &str) -> String {
        let longest_run = text
            .split(|c| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest_run + 1);
        if text.starts_with('`') || text.ends_with('`') {
            format!("{fence} {text} {fence}")
        } else {
            format!("{fence}{text}{fence}")
        }
    }

    fn link(&self, href: &str, label: &str) -> String {
        let label = if label.is_empty() {
            self.escape(href)
        } else {
            label.to_string()
        };
        format!("[{label}]({})", destination(href))
    }

    fn image(&self, src: &str, alt: &str) -> String {
        format!("![{}]({})", self.escape(alt), destination(src))
    }

    fn line_break(&self) -> &'static str {
        "\\\n"
    }

    fn quote(&self, lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect()
    }

    fn list_marker(&self, ordered: bool, index: usize) -> String {
        if ordered {
            format!("{}. ", index + 1)
        } else {
            "- ".to_string()
        }
    }

    fn guard_line(&self, line: String) -> String {
        if let Some(digits) = ordered_marker(&line) {
            return format!("{}\\{}", &line[..digits], &line[digits..]);
        }
        let starts_block = line.starts_with('#')
            || line.starts_with("- ")
            || line.starts_with("+ ")
            || line.starts_with("---")
            || line.starts_with("===");
        if starts_block {
            format!("\\{line}")
        } else {
            line
        }
    }
}

/// Length of a leading `12. ` that would open an ordered list.
fn ordered_marker(line: &str) -> Option<usize> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    (digits > 0 && line[digits..].starts_with(". ")).then_some(digits)
}

fn destination(url: &str) -> String {
    if url.contains([' ', '(', ')'].as_slice()) {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

pub(crate) fn render(thread: &Thread, options: &ExportOptions) -> String {
    let mut out = String::new();
    let meta = &thread.meta;

    let _ = writeln!(out, "# {}", MarkdownSyntax.escape(&thread.title));
    let _ = writeln!(out);
    let _ = writeln!(out, "- Source: <{}>", thread.source_url);
    let _ = writeln!(out, "- Thread id: {}", thread.id);
    if let Some(starter) = &meta.starter {
        let _ = writeln!(out, "- Started by: {}", author_label(starter, options));
    }
    if !meta.categories.is_empty() {
        let _ = writeln!(out, "- Categories: {}", meta.categories.join(" > "));
    }
    if let Some(views) = meta.views {
        let _ = writeln!(out, "- Views: {views}");
    }
    let _ = writeln!(out, "- Pages: {}", meta.total_pages);
    let _ = writeln!(out, "- Posts: {}", thread.posts.len());
    let _ = writeln!(out, "- Unique authors: {}", thread.unique_authors());
    let _ = writeln!(out);
    let _ = writeln!(out, "---");

    for entry in reply_order(thread) {
        out.push('\n');
        render_post(&mut out, &thread.posts[entry.index], entry.depth, options);
    }
    out
}

fn render_post(out: &mut String, post: &Post, depth: usize, options: &ExportOptions) {
    let indent = "  ".repeat(depth);
    let body_indent = format!("{indent}  ");

    let _ = writeln!(out, "{indent}- {}", summary_line(post, options));

    let mut lines = Vec::new();
    if let Some(quoted) = &post.quoted {
        lines.push(String::new());
        lines.extend(MarkdownSyntax.quote(render_blocks(&quoted.nodes, &MarkdownSyntax)));
    }
    if !post.body.is_empty() {
        lines.push(String::new());
        lines.extend(render_blocks(&post.body.nodes, &MarkdownSyntax));
    }
    if let Some(signature) = &post.signature {
        lines.push(String::new());
        lines.push(format!("_{}_", MarkdownSyntax.escape(signature)));
    }

    for line in lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{body_indent}{line}");
        }
    }
}

fn summary_line(post: &Post, options: &ExportOptions) -> String {
    let mut parts = vec![format!("**{}**", author_label(&post.author, options))];
    if let Some(timestamp) = &post.timestamp {
        parts.push(timestamp.format("%Y-%m-%d %H:%M %:z").to_string());
    }
    parts.push(format!("#{}", post.id));
    if let Some(parent) = &post.parent {
        parts.push(format!("reply to #{parent}"));
    }
    if post.likes > 0 {
        parts.push(format!("{} likes", post.likes));
    }
    parts.join(" · ")
}

fn author_label(author: &str, options: &ExportOptions) -> String {
    let escaped = MarkdownSyntax.escape(author);
    if options.bidi_isolate_authors && starts_right_to_left(author) {
        isolate_rtl(&escaped)
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkdownSyntax, Syntax};

    #[test]
    fn specials_are_escaped() {
        assert_eq!(MarkdownSyntax.escape("a*b_[c]"), "a\\*b\\_\\[c\\]");
    }

    #[test]
    fn code_fence_outgrows_inner_backticks() {
        assert_eq!(MarkdownSyntax.code("a`b"), "``a`b``");
        assert_eq!(MarkdownSyntax.code("plain"), "`plain`");
    }

    #[test]
    fn structural_line_starts_are_guarded() {
        assert_eq!(MarkdownSyntax.guard_line("# not a heading".into()), "\\# not a heading");
        assert_eq!(MarkdownSyntax.guard_line("1. not a list".into()), "1\\. not a list");
        assert_eq!(MarkdownSyntax.guard_line("plain".into()), "plain");
    }
}
