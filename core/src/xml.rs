//! Owned XML element tree used for both request and response documents.
//!
//! # Design
//! Documents are built bottom-up: leaf elements are constructed first, then
//! moved into their parent with `with_child`. Nothing holds a reference into
//! a tree that is still being assembled, so a finished `Element` is a plain
//! value that can be cloned, compared, and serialized.
//!
//! Serialization writes one element per line with no indentation and no
//! trailing newline. The remote endpoint and the recorded request fixtures
//! both depend on that exact byte layout.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::TransactError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Text(String),
    Children(Vec<Element>),
}

/// A single XML element holding either text or child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    content: Content,
}

impl Element {
    /// An element with no content yet. Serializes as `<NAME></NAME>`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Content::Children(Vec::new()),
        }
    }

    /// A leaf element with text content.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Content::Text(value.into()),
        }
    }

    /// Append a child. Any text content the element held is discarded.
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    pub fn with_children(self, children: impl IntoIterator<Item = Element>) -> Self {
        children.into_iter().fold(self, Element::with_child)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content, or `""` for an element with children.
    pub fn text_content(&self) -> &str {
        match &self.content {
            Content::Text(text) => text,
            Content::Children(_) => "",
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            Content::Text(_) => &[],
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().iter().find(|c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text_content)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children().iter().filter(move |c| c.name == name)
    }

    /// Every element named `name` in this subtree, self included, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn push_child(&mut self, child: Element) {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            Content::Text(_) => self.content = Content::Children(vec![child]),
        }
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.children() {
            child.collect_descendants(name, found);
        }
    }

    /// Serialize as a standalone UTF-8 document with an XML declaration.
    pub fn to_document(&self) -> Result<String, TransactError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| TransactError::Serialization(e.to_string()))?;
        write_line_break(&mut writer)?;
        self.write_to(&mut writer)?;
        into_string(writer)
    }

    /// Serialize this element alone, without a declaration.
    pub fn to_fragment(&self) -> Result<String, TransactError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_to(&mut writer)?;
        into_string(writer)
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), TransactError> {
        writer
            .write_event(Event::Start(BytesStart::new(self.name.as_str())))
            .map_err(|e| TransactError::Serialization(e.to_string()))?;

        match &self.content {
            Content::Text(text) if !text.is_empty() => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(|e| TransactError::Serialization(e.to_string()))?;
            }
            Content::Text(_) => {}
            Content::Children(children) => {
                if !children.is_empty() {
                    write_line_break(writer)?;
                }
                for child in children {
                    child.write_to(writer)?;
                    write_line_break(writer)?;
                }
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| TransactError::Serialization(e.to_string()))?;
        Ok(())
    }

    /// Parse a document into its root element.
    ///
    /// Whitespace between child elements is dropped. Text inside a leaf is
    /// kept verbatim, and a self-closing tag becomes an empty leaf.
    pub fn parse(xml: &str) -> Result<Element, TransactError> {
        let mut reader = Reader::from_str(xml);

        // Open elements plus the raw text seen directly inside each one.
        let mut stack: Vec<(Element, String)> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(TransactError::Parse("content after root element".to_string()));
                    }
                    stack.push((Element::new(element_name(&start)?), String::new()));
                }
                Event::Empty(start) => {
                    let leaf = Element::text(element_name(&start)?, String::new());
                    attach(&mut stack, &mut root, leaf)?;
                }
                Event::End(_) => {
                    let Some((element, text)) = stack.pop() else {
                        return Err(TransactError::Parse("unbalanced closing tag".to_string()));
                    };
                    let element = if element.children().is_empty() {
                        Element::text(element.name, text)
                    } else {
                        element
                    };
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some((_, buffer)) => buffer.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(TransactError::Parse("text outside root element".to_string()));
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some((_, buffer)) = stack.last_mut() {
                        let data = std::str::from_utf8(&data)
                            .map_err(|e| TransactError::Parse(e.to_string()))?;
                        buffer.push_str(data);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(TransactError::Parse("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| TransactError::Parse("document has no root element".to_string()))
    }
}

fn attach(
    stack: &mut [(Element, String)],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), TransactError> {
    match stack.last_mut() {
        Some((parent, _)) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(TransactError::Parse("multiple root elements".to_string())),
    }
}

fn element_name(start: &BytesStart<'_>) -> Result<String, TransactError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|e| TransactError::Parse(e.to_string()))
}

fn write_line_break<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), TransactError> {
    writer
        .write_event(Event::Text(BytesText::from_escaped("\n")))
        .map_err(|e| TransactError::Serialization(e.to_string()))
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, TransactError> {
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| TransactError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_with_empty_text_keeps_both_tags() {
        let xml = Element::text("CAMPAIGN_ID", "").to_fragment().unwrap();
        assert_eq!(xml, "<CAMPAIGN_ID></CAMPAIGN_ID>");
    }

    #[test]
    fn nested_elements_one_per_line() {
        let el = Element::new("SAVE_COLUMNS")
            .with_child(Element::text("COLUMN_NAME", "FIRST_NAME"))
            .with_child(Element::text("COLUMN_NAME", "LAST_NAME"));
        assert_eq!(
            el.to_fragment().unwrap(),
            "<SAVE_COLUMNS>\n<COLUMN_NAME>FIRST_NAME</COLUMN_NAME>\n<COLUMN_NAME>LAST_NAME</COLUMN_NAME>\n</SAVE_COLUMNS>"
        );
    }

    #[test]
    fn document_has_declaration_and_no_trailing_newline() {
        let doc = Element::new("ROOT").with_child(Element::text("A", "1")).to_document().unwrap();
        assert_eq!(
            doc,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<ROOT>\n<A>1</A>\n</ROOT>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let xml = Element::text("VALUE", "Smith & <Sons>").to_fragment().unwrap();
        assert_eq!(xml, "<VALUE>Smith &amp; &lt;Sons&gt;</VALUE>");
    }

    #[test]
    fn parse_reads_nested_tree_and_ignores_layout_whitespace() {
        let root = Element::parse(
            "<?xml version=\"1.0\"?>\n  <A>\n    <B>one</B>\n    <C />\n    <B>two &amp; three</B>\n  </A>",
        )
        .unwrap();
        assert_eq!(root.name(), "A");
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.child_text("C"), Some(""));
        let bs: Vec<&str> = root.children_named("B").map(Element::text_content).collect();
        assert_eq!(bs, vec!["one", "two & three"]);
    }

    #[test]
    fn parse_round_trips_serialized_output() {
        let el = Element::new("ROOT")
            .with_child(Element::text("EMPTY", ""))
            .with_child(Element::new("LIST").with_child(Element::text("ITEM", "x")));
        let parsed = Element::parse(&el.to_document().unwrap()).unwrap();
        assert_eq!(parsed, el);
        assert_eq!(parsed.descendants("ITEM").len(), 1);
    }

    #[test]
    fn descendants_include_self_in_document_order() {
        let el = Element::new("R")
            .with_child(Element::new("R").with_child(Element::text("X", "1")))
            .with_child(Element::text("X", "2"));
        assert_eq!(el.descendants("R").len(), 2);
        let xs: Vec<&str> = el.descendants("X").into_iter().map(Element::text_content).collect();
        assert_eq!(xs, vec!["1", "2"]);
    }

    #[test]
    fn parse_rejects_unclosed_document() {
        let err = Element::parse("<A><B>1</B>").unwrap_err();
        assert!(matches!(err, TransactError::Parse(_)));
    }

    #[test]
    fn parse_rejects_mismatched_tags() {
        assert!(Element::parse("<A><B></A></B>").is_err());
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert!(Element::parse("not xml at all").is_err());
        assert!(Element::parse("").is_err());
    }

    #[test]
    fn with_child_replaces_text_content() {
        let el = Element::text("A", "gone").with_child(Element::text("B", "kept"));
        assert_eq!(el.text_content(), "");
        assert_eq!(el.child_text("B"), Some("kept"));
    }
}
