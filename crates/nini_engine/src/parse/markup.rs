use ego_tree::NodeRef;
use nini_core::{Markup, Node};
use scraper::node::Node as DomNode;
use scraper::ElementRef;

/// Class names whose subtrees never belong to a post body. Quotes and
/// signatures are extracted separately.
const SKIPPED_CLASSES: &[&str] = &[
    "topic-post__quotation",
    "topic-post__signature",
    "forum-native-ad",
];

/// Convert a post body element into the markup tree.
///
/// Text is kept as found; whitespace collapsing happens in the normalizer.
pub fn element_to_markup(element: ElementRef<'_>) -> Markup {
    Markup::new(structure(visit_children(element)))
}

fn visit_node(node: NodeRef<'_, DomNode>, out: &mut Vec<Node>) {
    match node.value() {
        DomNode::Text(text) => out.push(Node::text(&**text)),
        DomNode::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, out);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, out);
            }
        }
    }
}

fn visit_children(element: ElementRef<'_>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in element.children() {
        visit_node(child, &mut out);
    }
    out
}

fn visit_element(element: ElementRef<'_>, out: &mut Vec<Node>) {
    if element
        .value()
        .classes()
        .any(|class| SKIPPED_CLASSES.contains(&class))
    {
        return;
    }

    let tag = element.value().name().to_ascii_lowercase();
    match tag.as_str() {
        "script" | "style" | "noscript" | "iframe" | "template" | "hr" => {}
        "br" => out.push(Node::LineBreak),
        "img" => {
            if let Some(src) = attr(element, "src") {
                out.push(Node::Image {
                    src,
                    alt: element.value().attr("alt").unwrap_or_default().trim().to_string(),
                });
            }
        }
        "a" => {
            let children = visit_children(element);
            match attr(element, "href") {
                Some(href) if !children.iter().any(Node::is_block) => {
                    out.push(Node::Link { href, children })
                }
                _ => out.extend(children),
            }
        }
        "b" | "strong" => wrap_inline(visit_children(element), out, |children| Node::Strong {
            children,
        }),
        "i" | "em" => wrap_inline(visit_children(element), out, |children| Node::Emphasis {
            children,
        }),
        "code" | "kbd" | "tt" => {
            let text: String = element.text().collect();
            if !text.trim().is_empty() {
                out.push(Node::Code { text });
            }
        }
        "pre" => {
            let text: String = element.text().collect();
            if !text.trim().is_empty() {
                out.push(Node::paragraph(vec![Node::Code { text }]));
            }
        }
        "blockquote" => {
            let children = structure(visit_children(element));
            if !children.is_empty() {
                out.push(Node::Quote { children });
            }
        }
        "ul" | "ol" => {
            let items: Vec<Vec<Node>> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name().eq_ignore_ascii_case("li"))
                .map(list_item)
                .filter(|item| !item.is_empty())
                .collect();
            if !items.is_empty() {
                out.push(Node::List {
                    ordered: tag == "ol",
                    items,
                });
            }
        }
        "p" | "div" | "section" | "article" | "header" | "footer" | "figure" | "figcaption"
        | "table" | "tbody" | "tr" | "td" | "th" | "address" | "center" | "h1" | "h2"
        | "h3" | "h4" | "h5" | "h6" | "li" => out.extend(structure(visit_children(element))),
        _ => out.extend(visit_children(element)),
    }
}

fn list_item(element: ElementRef<'_>) -> Vec<Node> {
    let children = visit_children(element);
    if children.iter().any(Node::is_block) {
        structure(children)
    } else {
        children
    }
}

/// Inline wrappers around block content lose their formatting.
fn wrap_inline(children: Vec<Node>, out: &mut Vec<Node>, wrap: impl FnOnce(Vec<Node>) -> Node) {
    if children.is_empty() {
        return;
    }
    if children.iter().any(Node::is_block) {
        out.extend(children);
    } else {
        out.push(wrap(children));
    }
}

/// Group inline runs into paragraphs so the result is a list of blocks.
fn structure(nodes: Vec<Node>) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for node in nodes {
        if node.is_block() {
            flush_run(&mut run, &mut blocks);
            blocks.push(node);
        } else {
            run.push(node);
        }
    }
    flush_run(&mut run, &mut blocks);
    blocks
}

fn flush_run(run: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    let children = std::mem::take(run);
    let has_content = children.iter().any(|node| match node {
        Node::Text { text } => !text.trim().is_empty(),
        Node::LineBreak => false,
        _ => true,
    });
    if has_content {
        blocks.push(Node::paragraph(children));
    }
}

fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
