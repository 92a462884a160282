//! Reverse conversion: event markup → [`Event`].
//!
//! Decoding is permissive. Paths listed in [`crate::schema::BINDINGS`] are
//! mapped, root-level children the table does not know are kept verbatim in
//! [`Event::unrecognized`] and reported as [`SchemaDriftWarning`]s, and
//! anything else that is well-formed is skipped.

use crate::error::{EventCodecError, Result};
use crate::event::Event;
use crate::schema::{Binding, TABLE};
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use tracing::{debug, trace};

/// Name of the root element producers emit.
pub const ROOT_ELEMENT: &str = "event";

/// A root-level element that matched no binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDriftWarning {
    /// Element name as it appeared in the markup.
    pub element: String,
    /// The element's raw markup.
    pub markup: String,
}

impl std::fmt::Display for SchemaDriftWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized element <{}>: {}", self.element, self.markup)
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub event: Event,
    /// One entry per unrecognized root-level element, in document order.
    pub warnings: Vec<SchemaDriftWarning>,
}

impl Decoded {
    /// Whether the event decoded only partially.
    pub fn has_drift(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Decode one event body.
///
/// Fails with [`EventCodecError::Malformed`] when the input is empty, has no
/// root element, or is not well-formed. A root element other than `event`
/// is decoded with the same relative paths.
pub fn decode_event(raw: &[u8]) -> Result<Decoded> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);

    let mut state = DecodeState::new(raw);
    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            XmlEvent::Start(element) => state.open(&element, start)?,
            XmlEvent::Empty(element) => {
                state.open(&element, start)?;
                state.close(reader.buffer_position() as usize)?;
            }
            XmlEvent::End(_) => state.close(reader.buffer_position() as usize)?,
            XmlEvent::Text(text) => {
                let text = text.unescape().map_err(malformed)?;
                state.text(&text);
            }
            XmlEvent::CData(data) => {
                let text = std::str::from_utf8(&data).map_err(malformed)?;
                state.text(text);
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    state.finish()
}

fn malformed(err: impl std::fmt::Display) -> EventCodecError {
    EventCodecError::Malformed(err.to_string())
}

struct Frame {
    name: String,
    /// Path relative to the root; empty for the root itself.
    path: String,
    text: String,
    /// Set for an unrecognized root child and everything beneath it.
    unknown: bool,
    /// Byte offset where the element's markup starts.
    start: usize,
}

struct DecodeState<'a> {
    raw: &'a [u8],
    event: Event,
    stack: Vec<Frame>,
    root_seen: bool,
    root_closed: bool,
    captured: Vec<String>,
    warnings: Vec<SchemaDriftWarning>,
}

impl<'a> DecodeState<'a> {
    fn new(raw: &'a [u8]) -> Self {
        Self {
            raw,
            event: Event::default(),
            stack: Vec::new(),
            root_seen: false,
            root_closed: false,
            captured: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn open(&mut self, element: &BytesStart<'_>, start: usize) -> Result<()> {
        let name = std::str::from_utf8(element.name().as_ref())
            .map_err(malformed)?
            .to_string();

        if self.root_closed {
            return Err(EventCodecError::Malformed(format!(
                "unexpected element <{name}> after the root element"
            )));
        }

        let Some(parent) = self.stack.last() else {
            if name != ROOT_ELEMENT {
                debug!("Root element is <{name}>, expected <{ROOT_ELEMENT}>; decoding leniently");
            }
            self.root_seen = true;
            self.stack.push(Frame {
                name,
                path: String::new(),
                text: String::new(),
                unknown: false,
                start,
            });
            return self.apply_attributes(element, "");
        };

        let at_root = parent.path.is_empty() && !parent.unknown;
        let unknown = parent.unknown || (at_root && !TABLE.is_known_root_child(&name));
        let path = if at_root {
            name.clone()
        } else {
            format!("{}/{}", parent.path, name)
        };

        self.stack.push(Frame {
            name,
            path: path.clone(),
            text: String::new(),
            unknown,
            start,
        });
        if unknown {
            return Ok(());
        }

        let bindings = TABLE.lookup(&path);
        if bindings.is_empty() {
            trace!("No binding for element '{path}'");
        }
        for binding in bindings {
            if let Binding::Open(action) = binding {
                action(&mut self.event);
            }
        }
        self.apply_attributes(element, &path)
    }

    fn apply_attributes(&mut self, element: &BytesStart<'_>, path: &str) -> Result<()> {
        for attr in element.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(malformed)?;
            let attr_path = if path.is_empty() {
                format!("@{key}")
            } else {
                format!("{path}/@{key}")
            };

            let mut matched = false;
            for binding in TABLE.lookup(&attr_path) {
                if let Binding::Attr(setter) = binding {
                    let value = attr.unescape_value().map_err(malformed)?;
                    setter(&mut self.event, value.into_owned());
                    matched = true;
                }
            }
            if !matched {
                trace!("No binding for attribute '{attr_path}'");
            }
        }
        Ok(())
    }

    fn close(&mut self, end: usize) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| EventCodecError::Malformed("unbalanced end tag".to_string()))?;

        if self.stack.is_empty() {
            self.root_closed = true;
            return Ok(());
        }

        if frame.unknown {
            // Only the outermost unknown element is captured; its children are part of its markup.
            let parent_is_root = self.stack.len() == 1;
            if parent_is_root {
                let markup = String::from_utf8_lossy(&self.raw[frame.start..end])
                    .trim()
                    .to_string();
                self.captured.push(markup.clone());
                self.warnings.push(SchemaDriftWarning {
                    element: frame.name,
                    markup,
                });
            }
            return Ok(());
        }

        // Empty text reads as absent; the encoder writes nothing for `None`.
        let text = frame.text.trim();
        if text.is_empty() {
            return Ok(());
        }
        for binding in TABLE.lookup(&frame.path) {
            if let Binding::Text(setter) = binding {
                setter(&mut self.event, text.to_string());
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.text.push_str(text);
        }
    }

    fn finish(mut self) -> Result<Decoded> {
        if !self.root_seen {
            return Err(EventCodecError::Malformed(
                "no root element found".to_string(),
            ));
        }
        if let Some(frame) = self.stack.last() {
            return Err(EventCodecError::Malformed(format!(
                "element <{}> is never closed",
                frame.name
            )));
        }

        if !self.captured.is_empty() {
            self.event.unrecognized = Some(self.captured.concat());
        }

        Ok(Decoded {
            event: self.event,
            warnings: self.warnings,
        })
    }
}
