use std::io::Write;
use std::mem;

use crate::error::Result;
use crate::value::Scalar;

use super::{ContainerKind, ContainerStack, Encoder, OutputSink, primitives};

/// Self-contained JSON writer. Bytes accumulate in an internal buffer that
/// `flush` drains to the active sink, so a long run of small writes costs a
/// single sink call.
pub struct BufferedEncoder {
    stack: ContainerStack,
    buf: Vec<u8>,
    sink: OutputSink,
}

impl BufferedEncoder {
    pub fn new(sink: OutputSink) -> Self {
        BufferedEncoder {
            stack: ContainerStack::new(),
            buf: Vec::with_capacity(512),
            sink,
        }
    }
}

impl Encoder for BufferedEncoder {
    fn key(&mut self, key: &str) -> Result<()> {
        if self.stack.key()? {
            self.buf.push(b',');
        }
        primitives::write_escaped_str(&mut self.buf, key);
        self.buf.push(b':');
        Ok(())
    }

    fn scalar(&mut self, value: &Scalar) -> Result<()> {
        if self.stack.value()? {
            self.buf.push(b',');
        }
        primitives::write_scalar(&mut self.buf, value);
        Ok(())
    }

    fn open_map(&mut self) -> Result<()> {
        if self.stack.open(ContainerKind::Map)? {
            self.buf.push(b',');
        }
        self.buf.push(b'{');
        Ok(())
    }

    fn close_map(&mut self) -> Result<()> {
        self.stack.close(ContainerKind::Map)?;
        self.buf.push(b'}');
        Ok(())
    }

    fn open_array(&mut self) -> Result<()> {
        if self.stack.open(ContainerKind::Array)? {
            self.buf.push(b',');
        }
        self.buf.push(b'[');
        Ok(())
    }

    fn close_array(&mut self) -> Result<()> {
        self.stack.close(ContainerKind::Array)?;
        self.buf.push(b']');
        Ok(())
    }

    fn raw(&mut self, fragment: &str) -> Result<()> {
        if fragment.is_empty() {
            return Ok(());
        }
        if self.stack.raw()? {
            self.buf.push(b',');
        }
        self.buf.extend_from_slice(fragment.as_bytes());
        Ok(())
    }

    fn begin_capture(&mut self) {
        self.stack.begin_capture();
    }

    fn end_capture(&mut self) -> Result<()> {
        Ok(self.stack.end_capture()?)
    }

    fn abort_capture(&mut self) {
        // Capture entry flushed the buffer, so everything in it belongs to
        // the abandoned block.
        self.buf.clear();
        self.stack.abort_capture();
    }

    fn redirect(&mut self, sink: OutputSink) -> OutputSink {
        mem::replace(&mut self.sink, sink)
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        self.sink.flush()?;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn top(&self) -> Option<ContainerKind> {
        self.stack.top()
    }

    fn has_pending_key(&self) -> bool {
        self.stack.has_pending_key()
    }

    fn into_sink(self: Box<Self>) -> Result<OutputSink> {
        let mut this = *self;
        this.flush()?;
        Ok(this.sink)
    }
}
