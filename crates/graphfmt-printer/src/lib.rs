//! Template compiler and graph printer
//!
//! A template is a C-like format string. [`CompiledTemplate::compile`]
//! turns it into a list of [`Directive`]s once; a [`Printer`] then applies
//! that list to any number of graphs, concurrently if needed.

pub mod cost;
pub mod directive;
pub mod error;
pub mod printer;


pub use cost::{CostFunction, Rounding};
pub use directive::{CompiledTemplate, Directive};
pub use error::TemplateError;
pub use printer::Printer;

/// Format used when none is configured: counts on the first line, then the edge list.
pub const DEFAULT_FORMAT: &str = "%n %m\n%M\n";
