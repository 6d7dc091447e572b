//! Token-walk decoder built on quick-xml's pull parser
//!
//! Walks every event in the document, tracking nesting depth, and
//! interprets `node` and `edge` elements that are direct children of the
//! root. Only the text of the field children it cares about is unescaped.

use std::borrow::Cow;
use std::io::{self, BufRead};
use std::sync::Arc;

use graphfmt_core::{BufferPool, Graph, PoolStats};
use quick_xml::errors::SyntaxError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{DecodeError, ElementKind, Field};
use crate::fields::{self, EdgeFields, NodeFields};
use crate::GraphDecoder;

/// Decoder driven by a general-purpose XML token stream.
#[derive(Debug, Default)]
pub struct TokenDecoder {
    buffers: BufferPool,
}

impl TokenDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphDecoder for TokenDecoder {
    fn name(&self) -> &'static str {
        "token"
    }

    fn decode(&self, source: &mut dyn BufRead) -> Result<Graph, DecodeError> {
        let mut buf = self.buffers.acquire();
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        let mut walker = Walker::default();
        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event_into(&mut *buf)
                .map_err(|e| map_xml_error(e, position, walker.depth))?;

            match event {
                Event::Start(e) => walker.start(&e, position)?,
                Event::Empty(e) => {
                    walker.start(&e, position)?;
                    walker.end()?;
                }
                Event::End(_) => walker.end()?,
                Event::Text(e) => {
                    if walker.collecting() {
                        let text = e.unescape().map_err(|e| map_xml_error(e, position, walker.depth));
                        walker.push_text(text);
                    }
                }
                Event::CData(e) => {
                    if walker.collecting() {
                        let text = std::str::from_utf8(&e)
                            .map(Cow::Borrowed)
                            .map_err(|e| DecodeError::syntax(position, e.to_string()));
                        walker.push_text(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        walker.finish()
    }

    fn buffer_stats(&self) -> PoolStats {
        self.buffers.stats()
    }
}

/// Field text, or the error hit while unescaping it. Errors surface only
/// when the owning element closes and the field is still the one in use.
type Deferred = Result<String, DecodeError>;

/// Raw fields of the interpreted element currently open.
struct Pending {
    kind: ElementKind,
    id: Option<Deferred>,
    directed: Option<Deferred>,
    source: Option<Deferred>,
    target: Option<Deferred>,
    cost: Option<Deferred>,
}

impl Pending {
    fn new(kind: ElementKind) -> Self {
        Pending {
            kind,
            id: None,
            directed: None,
            source: None,
            target: None,
            cost: None,
        }
    }

    fn set(&mut self, field: Field, text: Deferred) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Source => &mut self.source,
            Field::Target => &mut self.target,
            Field::Cost => &mut self.cost,
        };
        *slot = Some(text);
    }
}

fn resolve(slot: Option<Deferred>) -> Result<Option<Cow<'static, str>>, DecodeError> {
    slot.transpose().map(|text| text.map(Cow::Owned))
}

#[derive(Default)]
struct Walker {
    depth: usize,
    saw_root: bool,
    graph: Graph,
    pending: Option<Pending>,
    /// Field child currently open inside `pending`, with its text so far.
    field: Option<(Field, Deferred)>,
}

impl Walker {
    fn start(&mut self, e: &BytesStart<'_>, position: u64) -> Result<(), DecodeError> {
        let name = e.name();
        match self.depth {
            0 => self.saw_root = true,
            1 if name.as_ref() == fields::NODE || name.as_ref() == fields::EDGE => {
                let (kind, wanted) = if name.as_ref() == fields::NODE {
                    (ElementKind::Node, fields::ID)
                } else {
                    (ElementKind::Edge, fields::DIRECTED)
                };
                let mut pending = Pending::new(kind);
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| DecodeError::syntax(position, e.to_string()))?;
                    if attr.key.as_ref() == wanted {
                        let value = attr
                            .unescape_value()
                            .map(Cow::into_owned)
                            .map_err(|e| map_xml_error(e, position, self.depth));
                        match kind {
                            ElementKind::Node => pending.id = Some(value),
                            ElementKind::Edge => pending.directed = Some(value),
                        }
                    }
                }
                self.pending = Some(pending);
            }
            2 => {
                if let Some(pending) = &self.pending {
                    self.field = Field::from_child(pending.kind, name.as_ref()).map(|f| (f, Ok(String::new())));
                }
            }
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<(), DecodeError> {
        self.depth = self.depth.saturating_sub(1);
        match self.depth {
            2 => {
                if let (Some(pending), Some((field, text))) = (self.pending.as_mut(), self.field.take()) {
                    pending.set(field, text);
                }
            }
            1 => {
                if let Some(pending) = self.pending.take() {
                    self.complete(pending)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn complete(&mut self, pending: Pending) -> Result<(), DecodeError> {
        match pending.kind {
            ElementKind::Node => {
                let node = NodeFields {
                    id: resolve(pending.id)?,
                    cost: resolve(pending.cost)?,
                }
                .finish()?;
                trace!(id = %node.id, "decoded node");
                self.graph.add_node(node);
            }
            ElementKind::Edge => {
                let directed = resolve(pending.directed)?.is_some_and(|value| fields::is_directed(&value));
                let edge = EdgeFields {
                    directed,
                    source: resolve(pending.source)?,
                    target: resolve(pending.target)?,
                    cost: resolve(pending.cost)?,
                }
                .finish()?;
                trace!(source = %edge.source, target = %edge.target, "decoded edge");
                self.graph.add_edge(edge);
            }
        }
        Ok(())
    }

    /// Whether text at the current position belongs to a field child.
    fn collecting(&self) -> bool {
        self.depth == 3 && self.field.is_some()
    }

    fn push_text(&mut self, text: Result<Cow<'_, str>, DecodeError>) {
        if let Some((_, collected)) = self.field.as_mut() {
            if let Ok(buf) = collected {
                match text {
                    Ok(text) => buf.push_str(&text),
                    Err(err) => *collected = Err(err),
                }
            }
        }
    }

    fn finish(self) -> Result<Graph, DecodeError> {
        if self.depth > 0 {
            return Err(DecodeError::TruncatedStream { depth: self.depth });
        }
        if !self.saw_root {
            return Err(DecodeError::EmptyDocument);
        }
        Ok(self.graph)
    }
}

fn map_xml_error(err: quick_xml::Error, position: u64, depth: usize) -> DecodeError {
    match err {
        quick_xml::Error::Io(err) => DecodeError::Io(
            Arc::try_unwrap(err).unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string())),
        ),
        quick_xml::Error::Syntax(SyntaxError::InvalidBangMarkup) => {
            DecodeError::syntax(position, SyntaxError::InvalidBangMarkup.to_string())
        }
        // Every other syntax error is an unterminated construct at end of input.
        quick_xml::Error::Syntax(_) => DecodeError::TruncatedStream { depth },
        other => DecodeError::syntax(position, other.to_string()),
    }
}
