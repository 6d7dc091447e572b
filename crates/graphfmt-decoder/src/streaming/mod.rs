//! Streaming decoder reading whole elements at a time
//!
//! The document is read into a pooled buffer once and scanned by an
//! [`ElementReader`] that only stops at `node` and `edge` elements, so
//! field text is borrowed straight from the input in the common case.

mod reader;

use std::io::BufRead;

use graphfmt_core::{BufferPool, Graph, PoolStats};
use tracing::trace;

use crate::error::DecodeError;
use crate::fields::{self, EdgeFields, NodeFields};
use crate::GraphDecoder;

pub use reader::{ElementReader, MatchedElement, RawText};

const ELEMENTS: &[&[u8]] = &[fields::NODE, fields::EDGE];

/// Decoder built on the element-level [`ElementReader`].
#[derive(Debug, Default)]
pub struct StreamingDecoder {
    buffers: BufferPool,
}

impl StreamingDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphDecoder for StreamingDecoder {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn decode(&self, source: &mut dyn BufRead) -> Result<Graph, DecodeError> {
        let mut buf = self.buffers.acquire();
        source.read_to_end(&mut buf)?;
        decode_slice(&buf)
    }

    fn decode_bytes(&self, input: &[u8]) -> Result<Graph, DecodeError> {
        decode_slice(input)
    }

    fn buffer_stats(&self) -> PoolStats {
        self.buffers.stats()
    }
}

/// Decode a complete in-memory document.
pub fn decode_slice(input: &[u8]) -> Result<Graph, DecodeError> {
    let mut reader = ElementReader::new(input);
    let mut graph = Graph::new();

    while let Some(element) = reader.next_element(ELEMENTS)? {
        if element.name() == fields::NODE {
            let node = node_fields(&element)?.finish()?;
            trace!(id = %node.id, "decoded node");
            graph.add_node(node);
        } else {
            let edge = edge_fields(&element)?.finish()?;
            trace!(source = %edge.source, target = %edge.target, "decoded edge");
            graph.add_edge(edge);
        }
    }

    if !reader.saw_root() {
        return Err(DecodeError::EmptyDocument);
    }
    Ok(graph)
}

fn node_fields<'a>(element: &MatchedElement<'a>) -> Result<NodeFields<'a>, DecodeError> {
    Ok(NodeFields {
        id: element.attribute(fields::ID).transpose()?,
        cost: element.child_text(b"cost").transpose()?,
    })
}

fn edge_fields<'a>(element: &MatchedElement<'a>) -> Result<EdgeFields<'a>, DecodeError> {
    let directed = match element.attribute(fields::DIRECTED).transpose()? {
        Some(value) => fields::is_directed(&value),
        None => false,
    };
    Ok(EdgeFields {
        directed,
        source: element.child_text(b"source").transpose()?,
        target: element.child_text(b"target").transpose()?,
        cost: element.child_text(b"cost").transpose()?,
    })
}
