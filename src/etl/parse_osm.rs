use std::fs;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::{Child, ElementKind, RawElement};
use crate::errors::{Error, Result};

pub type OsmReader = Reader<Box<dyn BufRead + Send>>;

/// Open an .osm file, transparently decompressing `.xz` extracts.
pub fn create_osm_reader(path: &Path) -> Result<OsmReader> {
    let file = fs::File::open(path)
        .map_err(|err| Error::from(err).context(&path.display().to_string()))?;
    let file_reader = BufReader::new(file);
    let source: Box<dyn BufRead + Send> = if path.extension().is_some_and(|ext| ext == "xz") {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    Ok(reader)
}

fn parse_attributes(el: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn required(attributes: &mut Vec<(String, String)>, name: &str, element: &str) -> Result<String> {
    let idx = attributes.iter()
        .position(|(key, _)| key == name)
        .ok_or_else(|| Error::from(format!("<{}> without {} attribute", element, name)))?;
    Ok(attributes.swap_remove(idx).1)
}

fn parse_child(el: &BytesStart) -> Result<Option<Child>> {
    match el.name().as_ref() {
        b"tag" => {
            let mut attributes = parse_attributes(el)?;
            Ok(Some(Child::Tag {
                key: required(&mut attributes, "k", "tag")?,
                value: required(&mut attributes, "v", "tag")?,
            }))
        },
        b"nd" => {
            let mut attributes = parse_attributes(el)?;
            Ok(Some(Child::NodeRef(required(&mut attributes, "ref", "nd")?)))
        },
        _ => Ok(None),
    }
}

/// Streams the elements of an OSM document one at a time.
///
/// Every child of the document root is yielded as a [`RawElement`]. Only nodes and ways get
/// their `tag`/`nd` children collected, anything deeper is skipped. A node or way that is
/// itself the document root is yielded as well. At most one element is held in memory.
pub struct ElementReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    current: Option<(RawElement, usize)>,
    finished: bool,
}

impl<'a> ElementReader<&'a [u8]> {
    pub fn from_xml(xml: &'a str) -> Self {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.trim_text(true);
        ElementReader::new(reader)
    }
}

impl<R: BufRead> ElementReader<R> {
    pub fn new(reader: Reader<R>) -> Self {
        ElementReader {
            reader,
            buf: Vec::new(),
            depth: 0,
            current: None,
            finished: false,
        }
    }

    fn on_start(&mut self, el: &BytesStart, empty: bool) -> Result<Option<RawElement>> {
        let depth = self.depth;
        if let Some((current, current_depth)) = self.current.as_mut() {
            if depth == *current_depth + 1 {
                if let Some(child) = parse_child(el)? {
                    current.children.push(child);
                }
            }
            return Ok(None);
        }

        let kind = ElementKind::from_name(el.name().as_ref());
        let wanted = match depth {
            0 => kind.is_primitive(),
            1 => true,
            _ => false,
        };
        if !wanted {
            return Ok(None);
        }

        let mut element = RawElement::new(kind);
        element.attributes.extend(parse_attributes(el)?);
        if empty || !element.kind.is_primitive() {
            // Children of anything but nodes and ways are not needed.
            Ok(Some(element))
        } else {
            self.current = Some((element, depth));
            Ok(None)
        }
    }

    fn on_end(&mut self) -> Option<RawElement> {
        match &self.current {
            Some((_, current_depth)) if *current_depth == self.depth => {
                self.current.take().map(|(element, _)| element)
            },
            _ => None,
        }
    }

    /// Read up to the next complete element, `None` at the end of the document.
    pub fn next_element(&mut self) -> Result<Option<RawElement>> {
        if self.finished {
            return Ok(None);
        }
        let mut buf = mem::take(&mut self.buf);
        let result = loop {
            let outcome = match self.reader.read_event_into(&mut buf) {
                Err(e) => Err(e.into()),
                Ok(Event::Eof) => {
                    self.finished = true;
                    match &self.current {
                        Some(_) => Err(Error::from("Unexpected end of document inside an element")),
                        None => break Ok(None),
                    }
                },
                Ok(Event::Start(e)) => {
                    let outcome = self.on_start(&e, false);
                    self.depth += 1;
                    outcome
                },
                Ok(Event::Empty(e)) => self.on_start(&e, true),
                Ok(Event::End(_e)) => {
                    self.depth = self.depth.saturating_sub(1);
                    Ok(self.on_end())
                },
                // Declarations, text, comments and the like carry nothing we need.
                Ok(_) => Ok(None),
            };
            buf.clear();
            match outcome {
                Err(err) => {
                    self.finished = true;
                    break Err(err);
                },
                Ok(Some(element)) => break Ok(Some(element)),
                Ok(None) => (),
            }
        };
        self.buf = buf;
        result
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}
