//! Minimal owned XML tree used to edit package parts.
//!
//! Parsing keeps everything needed to write the part back: element order,
//! attributes (unescaped on read, escaped again on write), text nodes and
//! the prolog. Comments, processing instructions and CDATA are carried as
//! raw events.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),
    #[error("{0}")]
    Structure(&'static str),
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Other(Event<'static>),
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Child elements, skipping text and raw nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration, comments and the like that precede the root.
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

pub fn parse(bytes: &[u8]) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut prolog = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut prolog, &mut root, XmlNode::Element(element))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or(XmlError::Structure("closing tag without opening tag"))?;
                attach(&mut stack, &mut prolog, &mut root, XmlNode::Element(element))?;
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(t.unescape()?.into_owned()));
                }
            }
            Event::Eof => break,
            other => {
                let node = XmlNode::Other(other.into_owned());
                attach(&mut stack, &mut prolog, &mut root, node)?;
            }
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Structure("unclosed element at end of input"));
    }
    let root = root.ok_or(XmlError::Structure("document has no root element"))?;
    Ok(XmlDocument { prolog, root })
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    prolog: &mut Vec<XmlNode>,
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) => {
            if root.is_some() {
                return Err(XmlError::Structure("more than one root element"));
            }
            *root = Some(element);
        }
        other if root.is_none() => prolog.push(other),
        // Trailing comments after the root carry nothing we need.
        _ => {}
    }
    Ok(())
}

pub fn write(document: &XmlDocument) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());
    for node in &document.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &document.root)?;
    Ok(writer.into_inner())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    match node {
        XmlNode::Element(element) => write_element(writer, element)?,
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        XmlNode::Other(event) => writer.write_event(event.clone())?,
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
