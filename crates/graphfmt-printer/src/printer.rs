//! Buffered, pool-backed graph printer

use std::io::{self, Write};

use graphfmt_core::{BufferPool, Graph, PoolStats, PooledBuffer};

use crate::directive::CompiledTemplate;
use crate::error::TemplateError;

/// Bytes collected before they are handed to the sink.
const FLUSH_THRESHOLD: usize = 8 * 1024;

/// Writes graphs to byte sinks according to a compiled template.
///
/// Output is staged in a buffer taken from an internal pool, so batch
/// printing many graphs reuses the same few allocations. A `Printer` is
/// `Send + Sync`; every `print` call acquires its own buffer.
#[derive(Debug)]
pub struct Printer {
    template: CompiledTemplate,
    buffers: BufferPool,
}

impl Printer {
    pub fn new(template: CompiledTemplate) -> Self {
        Printer {
            template,
            buffers: BufferPool::new(),
        }
    }

    /// Compile `format` and build a printer for it.
    pub fn parse(format: &str) -> Result<Self, TemplateError> {
        CompiledTemplate::compile(format).map(Printer::new)
    }

    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Counters of the output buffer pool.
    pub fn buffer_stats(&self) -> PoolStats {
        self.buffers.stats()
    }

    /// Write `graph` to `sink` and flush it.
    ///
    /// Returns the number of bytes produced. The only possible error is the
    /// sink's own, returned unchanged.
    pub fn print<W: Write>(&self, sink: W, graph: &Graph) -> io::Result<usize> {
        let mut out = StagedSink {
            buf: self.buffers.acquire(),
            sink,
            written: 0,
        };
        self.template.write_to(&mut out, graph)?;
        out.finish()
    }
}

/// Sink wrapper that stages output in a pooled buffer.
struct StagedSink<'p, W: Write> {
    buf: PooledBuffer<'p>,
    sink: W,
    written: usize,
}

impl<W: Write> StagedSink<'_, W> {
    fn drain(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<usize> {
        self.flush()?;
        Ok(self.written)
    }
}

impl<W: Write> Write for StagedSink<'_, W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.written += data.len();
        if self.buf.len() >= FLUSH_THRESHOLD {
            self.drain()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.sink.flush()
    }
}
