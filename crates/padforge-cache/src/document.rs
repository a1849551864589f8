use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

const INDENT: &str = "  ";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("attribute error: {0}")]
    Attribute(#[from] AttrError),
    #[error("invalid utf-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed document: {0}")]
    Malformed(&'static str),
    #[error("failed to serialize document: {0}")]
    Write(String),
}

/// A node inside an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append text. Text next to existing text is merged into one node and
    /// whitespace-only text that starts a run is dropped, the same way
    /// [`Document::parse`] builds its tree.
    #[must_use]
    pub fn with_text(mut self, text: impl AsRef<str>) -> Self {
        self.push_text(text.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set or replace an attribute, keeping its original position.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping text.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().find(|e| e.name == name)
    }

    fn push_text(&mut self, text: &str) {
        let text = normalize_newlines(text);
        match self.children.last_mut() {
            Some(Node::Text(last)) => last.push_str(&text),
            _ if text.trim().is_empty() => {}
            _ => self.children.push(Node::Text(text)),
        }
    }

    fn is_element_only(&self) -> bool {
        self.children.iter().all(|n| matches!(n, Node::Element(_)))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

/// A complete, well-formed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self, DocumentError> {
        Self::parse(std::str::from_utf8(input)?)
    }

    /// Parse a document. Text is kept verbatim except that line endings
    /// are normalized to `\n`, adjacent text and CDATA sections are merged
    /// and whitespace-only text between elements is dropped.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(input);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or(DocumentError::Malformed("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    push_text(&mut stack, std::str::from_utf8(&bytes)?)?;
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DocumentError::Malformed("unclosed element"));
        }
        root.map(Self::new)
            .ok_or(DocumentError::Malformed("missing root element"))
    }

    /// Serialize with an XML declaration, two-space indentation and `\n`
    /// line endings. Elements holding text are written without any
    /// indentation inside them, so parsing the output gives back an equal
    /// document.
    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;
        write_whitespace(&mut writer, "\n")?;
        write_element(&mut writer, &self.root, Some(0))?;

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| DocumentError::Write(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref())?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?;
        element.set_attribute(key, normalize_newlines(&value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(DocumentError::Malformed("multiple root elements"));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(DocumentError::Malformed("text outside of the root element")),
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::Write(e.to_string()))
}

fn write_whitespace(writer: &mut Writer<Vec<u8>>, ws: &str) -> Result<(), DocumentError> {
    write_event(writer, Event::Text(BytesText::from_escaped(ws)))
}

/// `depth` is `None` inside mixed content, where no whitespace may be added.
fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    depth: Option<usize>,
) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    let depth = depth.filter(|_| element.is_element_only());
    for node in &element.children {
        match node {
            Node::Element(child) => {
                if let Some(depth) = depth {
                    write_whitespace(writer, &format!("\n{}", INDENT.repeat(depth + 1)))?;
                }
                write_element(writer, child, depth.map(|d| d + 1))?;
            }
            Node::Text(text) => {
                let text = normalize_newlines(text);
                write_event(writer, Event::Text(BytesText::new(&text)))?;
            }
        }
    }
    if let Some(depth) = depth {
        write_whitespace(writer, &format!("\n{}", INDENT.repeat(depth)))?;
    }
    write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            Element::new("profile")
                .with_attribute("version", "1")
                .with_child(
                    Element::new("actionmap")
                        .with_attribute("name", "spaceship_movement")
                        .with_child(
                            Element::new("action")
                                .with_attribute("name", "v_strafe_up")
                                .with_attribute("joystick", "js1_button2"),
                        ),
                )
                .with_child(Element::new("note").with_text("a < b & c")),
        )
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let xml = r#"<?xml version="1.0"?>
<profile version="1">
    <!-- comment -->
    <actionmap name="spaceship_movement">
        <action name="v_strafe_up" joystick="js1_button2"/>
    </actionmap>
    <note>a &lt; b &amp; c</note>
</profile>"#;
        let doc = Document::parse(xml).expect("valid document");
        assert_eq!(doc, sample());

        let action = doc
            .root()
            .child("actionmap")
            .and_then(|m| m.child("action"))
            .expect("action present");
        assert_eq!(action.attribute("joystick"), Some("js1_button2"));
        assert_eq!(doc.root().child("note").map(Element::text).as_deref(), Some("a < b & c"));
    }

    #[test]
    fn pretty_output_is_indented_and_parses_back() {
        let doc = sample();
        let text = doc.to_pretty_string().expect("serializable");

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<profile"));
        assert!(text.contains("\n  <actionmap name=\"spaceship_movement\">"));
        assert!(text.contains("\n    <action "));
        assert!(!text.contains('\r'));
        assert!(text.ends_with("</profile>\n"));
        assert_eq!(Document::parse(&text).expect("parses back"), doc);
    }

    #[test]
    fn carriage_returns_are_normalized() {
        let doc = Document::parse("<a>line1\r\nline2</a>").expect("valid document");
        assert_eq!(doc.root().text(), "line1\nline2");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Document::parse("this is not xml").is_err());
        assert!(Document::parse("").is_err());
        assert!(Document::from_bytes(&[0xff, 0xfe, 0x00, 0x42]).is_err());
    }

    #[test]
    fn rejects_truncated_document() {
        assert!(Document::parse("<profile><actionmap name=\"x\">").is_err());
        assert!(Document::parse("<profile><actionmap name=\"x\"/></prof").is_err());
    }

    #[test]
    fn rejects_mismatched_and_multiple_roots() {
        assert!(Document::parse("<a></b>").is_err());
        assert!(matches!(
            Document::parse("<a/><b/>"),
            Err(DocumentError::Malformed("multiple root elements"))
        ));
    }

    #[test]
    fn surrounding_whitespace_in_text_survives_round_trip() {
        let doc = Document::new(
            Element::new("action").with_child(Element::new("k").with_text(" ralt+l ")),
        );
        let text = doc.to_pretty_string().expect("serializable");
        assert!(text.contains("<k> ralt+l </k>"));
        assert_eq!(Document::parse(&text).expect("parses back"), doc);
    }

    #[test]
    fn mixed_content_is_written_without_indentation() {
        let doc = Document::new(
            Element::new("profile").with_child(
                Element::new("p")
                    .with_text("before ")
                    .with_child(Element::new("b").with_child(Element::new("i")))
                    .with_text(" after"),
            ),
        );
        let text = doc.to_pretty_string().expect("serializable");
        assert!(text.contains("\n  <p>before <b><i/></b> after</p>\n"));
        assert_eq!(Document::parse(&text).expect("parses back"), doc);
    }

    #[test]
    fn adjacent_text_is_merged() {
        let built = Element::new("p").with_text("a").with_text("b");
        assert_eq!(built.nodes(), &[Node::Text("ab".into())]);

        let parsed = Document::parse("<p>x<!--c-->y<![CDATA[<z>]]></p>").expect("valid document");
        assert_eq!(parsed.root().nodes(), &[Node::Text("xy<z>".into())]);

        let text = parsed.to_pretty_string().expect("serializable");
        assert_eq!(Document::parse(&text).expect("parses back"), parsed);
    }

    #[test]
    fn whitespace_only_text_between_elements_is_dropped() {
        let built = Element::new("p").with_text("  \n ").with_child(Element::new("q"));
        assert_eq!(built.nodes(), &[Node::Element(Element::new("q"))]);

        let parsed = Document::parse("<p>\n  <q/>\n</p>").expect("valid document");
        assert_eq!(parsed.root(), &built);
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut el = Element::new("x").with_attribute("a", "1").with_attribute("b", "2");
        el.set_attribute("a", "3");
        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("a", "3"), ("b", "2")]);
    }
}
