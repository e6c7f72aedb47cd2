//! The labeled-container tree every dialect is mapped onto.
//!
//! Format readers translate their markup into [`Node`]s; the
//! [compiler](crate::compiler) flattens the tree into a corpus.

/// Structural role of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Explicit book boundary.
    Book,
    /// Chapter grouping.
    Chapter,
    /// Untyped grouping. Becomes a book if its id is a canonical book code.
    Group,
    /// Paragraph-like text container.
    Paragraph,
    /// Poetry line.
    Line,
    /// Verse. With text it is a text-bearing leaf; empty it is a milestone
    /// whose locator applies to the next leaf.
    Verse,
    /// Heading or other label text; never becomes a content block.
    Title,
}

/// A child of a container: a nested container or bare character data.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    Text(String),
}

/// A labeled container.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub title: Option<String>,
    /// Verse locator (`Book.Chapter.Verse`).
    pub locator: Option<String>,
    pub children: Vec<Child>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            title: None,
            locator: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Child::Node(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(Child::Node(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Child::Text(text.into()));
    }

    /// All character data under this node, in document order, excluding
    /// titles.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in &node.children {
        match child {
            Child::Text(t) => out.push_str(t),
            Child::Node(n) if n.kind != NodeKind::Title => collect_text(n, out),
            Child::Node(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_skips_titles() {
        let node = Node::new(NodeKind::Paragraph)
            .with_child(Node::new(NodeKind::Title).with_text("Heading"))
            .with_text("In the ")
            .with_child(Node::new(NodeKind::Group).with_text("beginning"));
        let text = node.text_content();
        assert!(!text.contains("Heading"));
        assert_eq!(crate::util::collapse_whitespace(&text), "In the beginning");
    }
}
