//! Directive compiler
//!
//! Verbs (after the `%` marker):
//!  - `%`: a literal percent sign
//!  - `n`: number of nodes
//!  - `m`: number of edges
//!  - `a`: adjacency matrix
//!  - `{cost function}w`: every node cost on one line
//!  - `{cost function}N`: one node per line, cost appended when a cost function is given
//!  - `{cost function}M`: one edge per line, cost appended when a cost function is given
//!
//! Anything outside a directive is copied verbatim.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use graphfmt_core::Graph;

use crate::cost::CostFunction;
use crate::error::TemplateError;

const MARKER: char = '%';

/// One compiled output instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Literal text, including the `%%` escape.
    Text(String),
    NodeCount,
    EdgeCount,
    AdjacencyMatrix,
    /// Node costs on a single space-separated line.
    Costs(CostFunction),
    /// Node list; the cost column is omitted when there is no cost function.
    Nodes(Option<CostFunction>),
    /// Edge list; the cost column is omitted when there is no cost function.
    Edges(Option<CostFunction>),
}

impl Directive {
    /// Write this directive's output for `graph`.
    pub fn apply<W: Write + ?Sized>(&self, w: &mut W, graph: &Graph) -> io::Result<()> {
        match self {
            Directive::Text(text) => w.write_all(text.as_bytes()),
            Directive::NodeCount => write!(w, "{}", graph.node_count()),
            Directive::EdgeCount => write!(w, "{}", graph.edge_count()),
            Directive::AdjacencyMatrix => write_adjacency_matrix(w, graph),
            Directive::Costs(cost) => {
                for (i, node) in graph.nodes().iter().enumerate() {
                    if i > 0 {
                        w.write_all(b" ")?;
                    }
                    write!(w, "{}", CostValue(cost.apply(node.cost)))?;
                }
                Ok(())
            }
            Directive::Nodes(cost) => {
                for (i, node) in graph.nodes().iter().enumerate() {
                    if i > 0 {
                        w.write_all(b"\n")?;
                    }
                    write!(w, "{}", node.id)?;
                    if let Some(cost) = cost {
                        write!(w, " {}", CostValue(cost.apply(node.cost)))?;
                    }
                }
                Ok(())
            }
            Directive::Edges(cost) => {
                for (i, edge) in graph.edges().iter().enumerate() {
                    if i > 0 {
                        w.write_all(b"\n")?;
                    }
                    write!(w, "{} {}", edge.source, edge.target)?;
                    if let Some(cost) = cost {
                        write!(w, " {}", CostValue(cost.apply(edge.cost)))?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Shortest decimal form of a cost, with infinities spelled `+Inf` / `-Inf`.
struct CostValue(f64);

impl fmt::Display for CostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            v if v == f64::INFINITY => f.write_str("+Inf"),
            v if v == f64::NEG_INFINITY => f.write_str("-Inf"),
            v => write!(f, "{v}"),
        }
    }
}

/// Rows and columns follow node input order. The diagonal is always 0.
fn write_adjacency_matrix<W: Write + ?Sized>(w: &mut W, graph: &Graph) -> io::Result<()> {
    let nodes = graph.nodes();
    for (i, a) in nodes.iter().enumerate() {
        if i > 0 {
            w.write_all(b"\n")?;
        }
        for (j, b) in nodes.iter().enumerate() {
            if j > 0 {
                w.write_all(b" ")?;
            }
            let adjacent = a.id != b.id && graph.is_adjacent(a.id, b.id);
            w.write_all(if adjacent { b"1" } else { b"0" })?;
        }
    }
    Ok(())
}

impl fmt::Display for CostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ratio {}, rounding {}", self.ratio, self.rounding.mode())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Text(text) => write!(f, "text {:?}", text),
            Directive::NodeCount => f.write_str("node count"),
            Directive::EdgeCount => f.write_str("edge count"),
            Directive::AdjacencyMatrix => f.write_str("adjacency matrix"),
            Directive::Costs(cost) => write!(f, "node costs ({})", cost),
            Directive::Nodes(Some(cost)) => write!(f, "node list ({})", cost),
            Directive::Nodes(None) => f.write_str("node list"),
            Directive::Edges(Some(cost)) => write!(f, "edge list ({})", cost),
            Directive::Edges(None) => f.write_str("edge list"),
        }
    }
}

/// A format string compiled into directives.
///
/// Holds no graph state, so one instance can be applied to many graphs
/// from many threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    source: String,
    directives: Vec<Directive>,
}

impl CompiledTemplate {
    /// Compile a format string. The empty string is rejected.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::EmptyTemplate);
        }

        let mut directives = Vec::new();
        let mut rest = template;
        loop {
            let marker = rest.find(MARKER).unwrap_or(rest.len());
            if marker > 0 {
                directives.push(Directive::Text(rest[..marker].to_string()));
            }
            if marker == rest.len() {
                break;
            }

            let body = &rest[marker + MARKER.len_utf8()..];
            let (directive, consumed) = parse_directive(body)?;
            directives.push(directive);
            rest = &body[consumed..];
        }

        tracing::trace!(template, directives = directives.len(), "compiled template");
        Ok(CompiledTemplate {
            source: template.to_string(),
            directives,
        })
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// The format string this template was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Apply every directive to `graph`, unbuffered.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, graph: &Graph) -> io::Result<()> {
        for directive in &self.directives {
            directive.apply(w, graph)?;
        }
        Ok(())
    }
}

impl FromStr for CompiledTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompiledTemplate::compile(s)
    }
}

/// Parse the directive following a marker. Returns it and the bytes consumed.
fn parse_directive(body: &str) -> Result<(Directive, usize), TemplateError> {
    let simple = match body.as_bytes().first() {
        None => {
            return Err(TemplateError::MissingVerb {
                fragment: MARKER.to_string(),
            })
        }
        Some(b'%') => Some(Directive::Text(MARKER.to_string())),
        Some(b'n') => Some(Directive::NodeCount),
        Some(b'm') => Some(Directive::EdgeCount),
        Some(b'a') => Some(Directive::AdjacencyMatrix),
        Some(_) => None,
    };
    if let Some(directive) = simple {
        return Ok((directive, 1));
    }

    let (cost, len) = match CostFunction::parse(body)? {
        Some((cost, len)) => (Some(cost), len),
        None => (None, 0),
    };

    let directive = match body[len..].chars().next() {
        None => {
            return Err(TemplateError::MissingVerb {
                fragment: format!("{}{}", MARKER, body),
            })
        }
        Some('w') => Directive::Costs(cost.unwrap_or(CostFunction::IDENTITY)),
        Some('N') => Directive::Nodes(cost),
        Some('M') => Directive::Edges(cost),
        Some(verb) => {
            return Err(TemplateError::InvalidVerb {
                fragment: format!("{}{}", MARKER, &body[..len + verb.len_utf8()]),
                verb,
            })
        }
    };
    Ok((directive, len + 1))
}
