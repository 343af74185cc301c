use std::io::{self, Write};
use std::mem;

use serde_json::ser::{CharEscape, CompactFormatter, Formatter};

use crate::error::Result;
use crate::value::{Number, Scalar};

use super::{ContainerKind, ContainerStack, Encoder, OutputSink};

/// Encoder backed by serde_json's low-level `Formatter` machinery. Writes
/// through to the sink unbuffered; `flush` only forwards to the sink.
pub struct SerdeJsonEncoder {
    stack: ContainerStack,
    fmt: CompactFormatter,
    sink: OutputSink,
}

impl SerdeJsonEncoder {
    pub fn new(sink: OutputSink) -> Self {
        SerdeJsonEncoder {
            stack: ContainerStack::new(),
            fmt: CompactFormatter,
            sink,
        }
    }

    fn write_string(&mut self, s: &str) -> io::Result<()> {
        self.fmt.begin_string(&mut self.sink)?;
        // serde_json's escape set: quote, backslash and ASCII control bytes.
        // Escapes are all ASCII, so byte positions are char boundaries.
        let bytes = s.as_bytes();
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if byte >= 0x20 && byte != b'"' && byte != b'\\' {
                continue;
            }
            if start < i {
                self.fmt.write_string_fragment(&mut self.sink, &s[start..i])?;
            }
            let escape = match byte {
                b'"' => CharEscape::Quote,
                b'\\' => CharEscape::ReverseSolidus,
                0x08 => CharEscape::Backspace,
                b'\t' => CharEscape::Tab,
                b'\n' => CharEscape::LineFeed,
                0x0C => CharEscape::FormFeed,
                b'\r' => CharEscape::CarriageReturn,
                other => CharEscape::AsciiControl(other),
            };
            self.fmt.write_char_escape(&mut self.sink, escape)?;
            start = i + 1;
        }
        if start < bytes.len() {
            self.fmt.write_string_fragment(&mut self.sink, &s[start..])?;
        }
        self.fmt.end_string(&mut self.sink)
    }

    fn write_scalar_body(&mut self, value: &Scalar) -> io::Result<()> {
        match value {
            Scalar::Null => self.fmt.write_null(&mut self.sink),
            Scalar::Bool(b) => self.fmt.write_bool(&mut self.sink, *b),
            Scalar::Number(Number::I64(v)) => self.fmt.write_i64(&mut self.sink, *v),
            Scalar::Number(Number::U64(v)) => self.fmt.write_u64(&mut self.sink, *v),
            Scalar::Number(Number::F64(v)) => {
                if v.is_finite() {
                    self.fmt.write_f64(&mut self.sink, *v)
                } else {
                    self.fmt.write_null(&mut self.sink)
                }
            }
            Scalar::String(s) => self.write_string(s),
        }
    }
}

impl Encoder for SerdeJsonEncoder {
    fn key(&mut self, key: &str) -> Result<()> {
        let first = !self.stack.key()?;
        self.fmt.begin_object_key(&mut self.sink, first)?;
        self.write_string(key)?;
        self.fmt.end_object_key(&mut self.sink)?;
        self.fmt.begin_object_value(&mut self.sink)?;
        Ok(())
    }

    fn scalar(&mut self, value: &Scalar) -> Result<()> {
        let in_array = self.stack.top() == Some(ContainerKind::Array);
        let sep = self.stack.value()?;
        if in_array {
            self.fmt.begin_array_value(&mut self.sink, !sep)?;
        }
        self.write_scalar_body(value)?;
        if in_array {
            self.fmt.end_array_value(&mut self.sink)?;
        }
        Ok(())
    }

    fn open_map(&mut self) -> Result<()> {
        let in_array = self.stack.top() == Some(ContainerKind::Array);
        let sep = self.stack.open(ContainerKind::Map)?;
        if in_array {
            self.fmt.begin_array_value(&mut self.sink, !sep)?;
        }
        self.fmt.begin_object(&mut self.sink)?;
        Ok(())
    }

    fn close_map(&mut self) -> Result<()> {
        self.stack.close(ContainerKind::Map)?;
        self.fmt.end_object(&mut self.sink)?;
        Ok(())
    }

    fn open_array(&mut self) -> Result<()> {
        let in_array = self.stack.top() == Some(ContainerKind::Array);
        let sep = self.stack.open(ContainerKind::Array)?;
        if in_array {
            self.fmt.begin_array_value(&mut self.sink, !sep)?;
        }
        self.fmt.begin_array(&mut self.sink)?;
        Ok(())
    }

    fn close_array(&mut self) -> Result<()> {
        self.stack.close(ContainerKind::Array)?;
        self.fmt.end_array(&mut self.sink)?;
        Ok(())
    }

    fn raw(&mut self, fragment: &str) -> Result<()> {
        if fragment.is_empty() {
            return Ok(());
        }
        if self.stack.raw()? {
            self.sink.write_all(b",")?;
        }
        self.fmt.write_raw_fragment(&mut self.sink, fragment)?;
        Ok(())
    }

    fn begin_capture(&mut self) {
        self.stack.begin_capture();
    }

    fn end_capture(&mut self) -> Result<()> {
        Ok(self.stack.end_capture()?)
    }

    fn abort_capture(&mut self) {
        self.stack.abort_capture();
    }

    fn redirect(&mut self, sink: OutputSink) -> OutputSink {
        mem::replace(&mut self.sink, sink)
    }

    fn flush(&mut self) -> Result<()> {
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
