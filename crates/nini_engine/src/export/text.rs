use chrono::{DateTime, FixedOffset};
use nini_core::jalali::{to_tehran, JalaliDate};
use nini_core::Node;

/// Inline and block spelling of one lightweight markup language.
pub(crate) trait Syntax {
    fn escape(&self, text: &str) -> String;
    fn strong(&self, inner: &str) -> String;
    fn emphasis(&self, inner: &str) -> String;
    fn code(&self, text: &str) -> String;
    fn link(&self, href: &str, label: &str) -> String;
    fn image(&self, src: &str, alt: &str) -> String;
    /// Hard line break, including the newline itself.
    fn line_break(&self) -> &'static str;
    fn quote(&self, lines: Vec<String>) -> Vec<String>;
    fn list_marker(&self, ordered: bool, index: usize) -> String;
    /// Keep a rendered body line from being read as structure.
    fn guard_line(&self, line: String) -> String;
}

pub(crate) fn render_inline(nodes: &[Node], syntax: &impl Syntax) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text { text } => out.push_str(&syntax.escape(text)),
            Node::Strong { children } => {
                out.push_str(&syntax.strong(&render_inline(children, syntax)))
            }
            Node::Emphasis { children } => {
                out.push_str(&syntax.emphasis(&render_inline(children, syntax)))
            }
            Node::Code { text } => out.push_str(&syntax.code(text)),
            Node::Link { href, children } => {
                out.push_str(&syntax.link(href, &render_inline(children, syntax)))
            }
            Node::Image { src, alt } => out.push_str(&syntax.image(src, alt)),
            Node::LineBreak => out.push_str(syntax.line_break()),
            block => {
                let text = nini_core::Markup::new(vec![block.clone()]).plain_text();
                out.push_str(&syntax.escape(&text.replace('\n', " ")));
            }
        }
    }
    out
}

/// Render blocks to lines, with one blank line between blocks.
pub(crate) fn render_blocks(nodes: &[Node], syntax: &impl Syntax) -> Vec<String> {
    let mut lines = Vec::new();
    let mut inline_run: Vec<Node> = Vec::new();
    for node in nodes {
        if node.is_block() {
            flush_inline(&mut inline_run, syntax, &mut lines);
            separate(&mut lines);
            lines.extend(render_block(node, syntax));
        } else {
            inline_run.push(node.clone());
        }
    }
    flush_inline(&mut inline_run, syntax, &mut lines);
    lines
}

fn flush_inline(run: &mut Vec<Node>, syntax: &impl Syntax, lines: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    separate(lines);
    lines.extend(paragraph_lines(run, syntax));
    run.clear();
}

fn separate(lines: &mut Vec<String>) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
}

fn paragraph_lines(children: &[Node], syntax: &impl Syntax) -> Vec<String> {
    render_inline(children, syntax)
        .split('\n')
        .map(|line| syntax.guard_line(line.to_string()))
        .collect()
}

fn render_block(node: &Node, syntax: &impl Syntax) -> Vec<String> {
    match node {
        Node::Paragraph { children } => paragraph_lines(children, syntax),
        Node::Quote { children } => syntax.quote(render_blocks(children, syntax)),
        Node::List { ordered, items } => {
            let mut lines = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let marker = syntax.list_marker(*ordered, index);
                let indent = " ".repeat(marker.chars().count());
                let item_lines = if item.iter().any(Node::is_block) {
                    render_blocks(item, syntax)
                } else {
                    paragraph_lines(item, syntax)
                };
                for (n, line) in item_lines.into_iter().enumerate() {
                    if n == 0 {
                        lines.push(format!("{marker}{line}"));
                    } else if line.is_empty() {
                        lines.push(line);
                    } else {
                        lines.push(format!("{indent}{line}"));
                    }
                }
            }
            lines
        }
        inline => paragraph_lines(std::slice::from_ref(inline), syntax),
    }
}

/// `jalali:YYYY/MM/DD/HH:MM` on the Tehran wall clock.
pub(crate) fn jalali_stamp(timestamp: &DateTime<FixedOffset>) -> Option<String> {
    let local = to_tehran(*timestamp);
    let date = JalaliDate::from_gregorian(local.date_naive())?;
    Some(format!("jalali:{date}/{}", local.format("%H:%M")))
}

/// Whether `text` opens with an Arabic-script letter and needs isolating
/// inside left-to-right lines.
pub(crate) fn starts_right_to_left(text: &str) -> bool {
    text.chars().find(|c| c.is_alphabetic()).is_some_and(|c| {
        matches!(
            c,
            '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{08A0}'..='\u{08FF}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}'
        )
    })
}

/// Wrap in RIGHT-TO-LEFT ISOLATE ... POP DIRECTIONAL ISOLATE.
pub(crate) fn isolate_rtl(text: &str) -> String {
    format!("\u{2067}{text}\u{2069}")
}
