//! Minimal namespace-agnostic element tree over `quick-xml` events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseError;

/// One XML element, keyed by local name (namespace prefixes dropped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
    /// Byte range of the element in the source text.
    pub start: usize,
    pub end: usize,
}

impl Element {
    fn open(start: &BytesStart<'_>, position: usize) -> Result<Self, quick_xml::Error> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            start: position,
            ..Default::default()
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of the first child with this name, `None` when there is no such child.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|child| child.text.clone())
    }

    /// Outermost elements named `name`, in document order. Matches are not
    /// searched for nested matches.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.find_all(name, out);
        }
    }

    /// The element's source text.
    pub fn source<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or_default().trim()
    }
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Parse a document into its top-level elements.
///
/// More than one top-level element is accepted so concatenated CAP documents
/// parse as siblings.
pub fn parse_document(source: &str) -> Result<Vec<Element>, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut roots = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|source| ParseError::Xml {
            position: reader.buffer_position(),
            source,
        })?;
        let xml_err = |source: quick_xml::Error| ParseError::Xml { position, source };

        match event {
            Event::Start(start) => {
                stack.push(Element::open(&start, position).map_err(xml_err)?);
            }
            Event::Empty(start) => {
                let mut element = Element::open(&start, position).map_err(xml_err)?;
                element.end = reader.buffer_position();
                attach(&mut stack, &mut roots, element);
            }
            Event::End(end) => {
                let mut element = stack.pop().ok_or_else(|| {
                    ParseError::Unbalanced(String::from_utf8_lossy(end.local_name().as_ref()).into_owned())
                })?;
                element.end = reader.buffer_position();
                attach(&mut stack, &mut roots, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::UnexpectedEof(open.name.clone()));
    }

    Ok(roots)
}
