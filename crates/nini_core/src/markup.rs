use serde::{Deserialize, Serialize};

/// Post body as a small formatting tree, independent of any output syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Paragraph { children: Vec<Node> },
    Quote { children: Vec<Node> },
    /// Each entry is one list item.
    List { ordered: bool, items: Vec<Vec<Node>> },
    Text { text: String },
    Strong { children: Vec<Node> },
    Emphasis { children: Vec<Node> },
    Code { text: String },
    Link { href: String, children: Vec<Node> },
    Image { src: String, alt: String },
    LineBreak,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Paragraph { .. } | Node::Quote { .. } | Node::List { .. })
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Node::Text { text } | Node::Code { text } => out.push_str(text),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::LineBreak => out.push('\n'),
            Node::Strong { children }
            | Node::Emphasis { children }
            | Node::Link { children, .. } => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
            Node::Paragraph { children } | Node::Quote { children } => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                for child in children {
                    child.push_plain_text(out);
                }
                out.push('\n');
            }
            Node::List { items, .. } => {
                for item in items {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    for child in item {
                        child.push_plain_text(out);
                    }
                }
                out.push('\n');
            }
        }
    }
}

impl Markup {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Single paragraph holding `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Node::paragraph(vec![Node::text(text)])])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Text content with formatting dropped; blocks end up on their own lines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_plain_text(&mut out);
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Markup, Node};

    #[test]
    fn plain_text_separates_blocks_and_keeps_inline_runs() {
        let markup = Markup::new(vec![
            Node::paragraph(vec![
                Node::text("Hello "),
                Node::Strong {
                    children: vec![Node::text("world")],
                },
            ]),
            Node::Quote {
                children: vec![Node::text("quoted")],
            },
        ]);
        assert_eq!(markup.plain_text(), "Hello world\nquoted");
    }

    #[test]
    fn serializes_with_type_tags() {
        let markup = Markup::from_text("hi");
        let json = serde_json::to_string(&markup).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"paragraph","children":[{"type":"text","text":"hi"}]}]"#
        );
    }
}
