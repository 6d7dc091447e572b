//! Field collection and validation shared by both decoding strategies
//!
//! Each strategy gathers raw field text while it walks an element and
//! hands it over here once the element closes, so validation order and
//! error values are identical no matter how the text was found.

use std::borrow::Cow;

use graphfmt_core::{Edge, Node, NodeId};

use crate::error::{DecodeError, ElementKind, Field};

pub(crate) const NODE: &[u8] = b"node";
pub(crate) const EDGE: &[u8] = b"edge";
pub(crate) const ID: &[u8] = b"id";
pub(crate) const DIRECTED: &[u8] = b"directed";

impl Field {
    /// Child element carrying this field inside `element`, if any.
    pub(crate) fn from_child(element: ElementKind, name: &[u8]) -> Option<Field> {
        match (element, name) {
            (_, b"cost") => Some(Field::Cost),
            (ElementKind::Edge, b"source") => Some(Field::Source),
            (ElementKind::Edge, b"target") => Some(Field::Target),
            _ => None,
        }
    }
}

/// Whether a `directed` attribute value marks the edge as directed.
pub(crate) fn is_directed(value: &str) -> bool {
    value == "yes"
}

pub(crate) fn parse_int(element: ElementKind, field: Field, text: &str) -> Result<i64, DecodeError> {
    text.trim()
        .parse()
        .map_err(|source| DecodeError::InvalidIntegerField {
            element,
            field,
            value: text.to_string(),
            source,
        })
}

pub(crate) fn parse_float(element: ElementKind, field: Field, text: &str) -> Result<f64, DecodeError> {
    text.trim()
        .parse()
        .map_err(|source| DecodeError::InvalidFloatField {
            element,
            field,
            value: text.to_string(),
            source,
        })
}

fn required(element: ElementKind, field: Field, text: Option<Cow<'_, str>>) -> Result<i64, DecodeError> {
    let text = text.ok_or(DecodeError::MissingRequiredField { element, field })?;
    parse_int(element, field, &text)
}

fn optional_cost(element: ElementKind, text: Option<Cow<'_, str>>) -> Result<f64, DecodeError> {
    match text {
        Some(text) => parse_float(element, Field::Cost, &text),
        None => Ok(0.0),
    }
}

/// Raw text of a node's fields.
#[derive(Debug)]
pub(crate) struct NodeFields<'a> {
    pub id: Option<Cow<'a, str>>,
    pub cost: Option<Cow<'a, str>>,
}

impl NodeFields<'_> {
    /// Validate in the order `id`, `cost`.
    pub fn finish(self) -> Result<Node, DecodeError> {
        let id = required(ElementKind::Node, Field::Id, self.id)?;
        let cost = optional_cost(ElementKind::Node, self.cost)?;
        Ok(Node { id: NodeId(id), cost })
    }
}

/// Raw text of an edge's fields.
#[derive(Debug)]
pub(crate) struct EdgeFields<'a> {
    pub directed: bool,
    pub source: Option<Cow<'a, str>>,
    pub target: Option<Cow<'a, str>>,
    pub cost: Option<Cow<'a, str>>,
}

impl EdgeFields<'_> {
    /// Validate in the order `source`, `target`, `cost`.
    pub fn finish(self) -> Result<Edge, DecodeError> {
        let source = required(ElementKind::Edge, Field::Source, self.source)?;
        let target = required(ElementKind::Edge, Field::Target, self.target)?;
        let cost = optional_cost(ElementKind::Edge, self.cost)?;
        Ok(Edge {
            source: NodeId(source),
            target: NodeId(target),
            cost,
            directed: self.directed,
        })
    }
}
