//! Graph document decoding
//!
//! Two interchangeable strategies turn an XML graph document into a
//! [`Graph`]: [`TokenDecoder`] walks quick-xml's token stream, while
//! [`StreamingDecoder`] reads whole `node` and `edge` elements at a time.
//! Both accept and reject exactly the same documents.

pub mod error;
mod fields;
pub mod streaming;
pub mod token;


use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use graphfmt_core::{Graph, PoolStats};
use serde::{Deserialize, Serialize};

pub use error::{DecodeError, DecodeErrorKind, ElementKind, Field};
pub use streaming::{decode_slice, StreamingDecoder};
pub use token::TokenDecoder;

/// A strategy for decoding graph documents.
pub trait GraphDecoder: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Decode a complete document from `source`.
    fn decode(&self, source: &mut dyn BufRead) -> Result<Graph, DecodeError>;

    /// Decode a document already held in memory.
    fn decode_bytes(&self, mut input: &[u8]) -> Result<Graph, DecodeError> {
        self.decode(&mut input)
    }

    /// Usage of the decoder's internal buffer pool.
    fn buffer_stats(&self) -> PoolStats;
}

/// Selects a decoding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    Token,
    #[default]
    Streaming,
}

impl DecoderKind {
    pub const ALL: [DecoderKind; 2] = [DecoderKind::Token, DecoderKind::Streaming];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecoderKind::Token => "token",
            DecoderKind::Streaming => "streaming",
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(DecoderKind::Token),
            "streaming" => Ok(DecoderKind::Streaming),
            other => Err(format!("unknown decoder {other:?} (expected \"token\" or \"streaming\")")),
        }
    }
}

/// Build a decoder for the given strategy.
pub fn get_decoder(kind: DecoderKind) -> Box<dyn GraphDecoder> {
    match kind {
        DecoderKind::Token => Box::new(TokenDecoder::new()),
        DecoderKind::Streaming => Box::new(StreamingDecoder::new()),
    }
}
