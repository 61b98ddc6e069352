use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{ElementKind, RawElement, RawTag};
use crate::errors::{Error, Result};

/// Streams top level elements out of an .osm document, one at a time.
///
/// Nothing but the element under construction is kept in memory: the event
/// buffer is cleared after every event and finished elements are handed to
/// the caller by value.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kinds: Vec<ElementKind>,
    // Open elements outside of any node/way/relation, e.g. <osm>.
    outer_depth: usize,
    finished: bool,
}

impl OsmReader<Box<dyn BufRead + Send>> {
    /// Opens `path`, decompressing on the fly when it ends in `.xz`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let file_reader = BufReader::new(file);
        let source: Box<dyn BufRead + Send> = if path.extension().is_some_and(|ext| ext == "xz") {
            let xz_reader = XzDecoder::new(file_reader);
            Box::new(BufReader::new(xz_reader))
        } else {
            Box::new(file_reader)
        };
        Ok(OsmReader::new(source))
    }
}

impl<R: BufRead> OsmReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        OsmReader {
            reader,
            buf: Vec::new(),
            kinds: ElementKind::ALL.to_vec(),
            outer_depth: 0,
            finished: false,
        }
    }

    /// Only yield elements of these kinds; the others are skipped with their children.
    pub fn with_kinds(mut self, kinds: &[ElementKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    fn next_element(&mut self) -> Result<Option<RawElement>> {
        let mut current: Option<RawElement> = None;
        let mut skipping = false;
        // Nesting below the current (or skipped) element.
        let mut depth: usize = 0;

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => {
                    if current.is_some() || skipping || self.outer_depth > 0 {
                        return Err(Error::malformed(format!(
                            "Unexpected end of document at byte {}",
                            self.reader.buffer_position()
                        )));
                    }
                    return Ok(None);
                }
                Event::Start(e) => {
                    if let Some(element) = current.as_mut() {
                        if depth == 0 {
                            add_child(element, &e)?;
                        }
                        depth += 1;
                    } else if skipping {
                        depth += 1;
                    } else {
                        match ElementKind::from_name(e.name().as_ref()) {
                            Some(kind) if self.kinds.contains(&kind) => {
                                current = Some(parse_element(kind, &e)?);
                            }
                            Some(_) => skipping = true,
                            None => self.outer_depth += 1,
                        }
                    }
                }
                Event::Empty(e) => {
                    if let Some(element) = current.as_mut() {
                        if depth == 0 {
                            add_child(element, &e)?;
                        }
                    } else if !skipping {
                        if let Some(kind) = ElementKind::from_name(e.name().as_ref()) {
                            if self.kinds.contains(&kind) {
                                return Ok(Some(parse_element(kind, &e)?));
                            }
                        }
                    }
                }
                Event::End(_e) => {
                    if current.is_some() || skipping {
                        if depth == 0 {
                            if current.is_some() {
                                return Ok(current);
                            }
                            skipping = false;
                        } else {
                            depth -= 1;
                        }
                    } else {
                        self.outer_depth = self.outer_depth.saturating_sub(1);
                    }
                }
                // Text (e.g. <note>), CDATA, declarations and comments carry no map data.
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
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

fn parse_element(kind: ElementKind, el: &BytesStart) -> Result<RawElement> {
    let mut element = RawElement::new(kind);
    element.attributes = parse_attributes(el)?;
    Ok(element)
}

fn take_attribute(attributes: &mut Vec<(String, String)>, child: &str, name: &str) -> Result<String> {
    let idx = attributes
        .iter()
        .position(|(key, _)| key == name)
        .ok_or_else(|| Error::missing_attribute(child, name))?;
    Ok(attributes.swap_remove(idx).1)
}

fn add_child(element: &mut RawElement, el: &BytesStart) -> Result<()> {
    match el.name().as_ref() {
        b"tag" => {
            let mut attributes = parse_attributes(el)?;
            let k = take_attribute(&mut attributes, "tag", "k")?;
            let v = take_attribute(&mut attributes, "tag", "v")?;
            element.tags.push(RawTag { k, v });
        }
        b"nd" if element.kind == ElementKind::Way => {
            let mut attributes = parse_attributes(el)?;
            element.node_refs.push(take_attribute(&mut attributes, "nd", "ref")?);
        }
        // <member> of relations and anything unknown.
        _ => (),
    }
    Ok(())
}
