//! Low-level append-only writer layer: the encoder contract, container
//! bookkeeping shared by every backend, and output-sink plumbing.

pub mod buffered;
pub mod primitives;
pub mod serde_json;

use std::fmt;
use std::io::{self, Write};

use crate::error::{Error, Result, StructuralError};
use crate::value::Scalar;

/// One level of nesting in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Map,
    Array,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Map => f.write_str("map"),
            ContainerKind::Array => f.write_str("array"),
        }
    }
}

/// Self-contained serialized content with no enclosing brackets and no
/// leading or trailing separator. Produced by capture, consumed by splice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment(text)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment(text.to_owned())
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The active write target. Exactly one sink is live per encoder; `redirect`
/// transfers ownership wholesale, it never shares.
pub enum OutputSink {
    Buffer(Vec<u8>),
    Writer(Box<dyn Write>),
}

impl OutputSink {
    pub fn buffer() -> Self {
        OutputSink::Buffer(Vec::new())
    }

    pub fn writer<W: Write + 'static>(writer: W) -> Self {
        OutputSink::Writer(Box::new(writer))
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            OutputSink::Buffer(bytes) => String::from_utf8(bytes)
                .map_err(|e| Error::Message(format!("output is not valid UTF-8: {e}"))),
            OutputSink::Writer(_) => Err(Error::Message(
                "output was streamed to an external writer".to_owned(),
            )),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Buffer(bytes) => {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            OutputSink::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Buffer(_) => Ok(()),
            OutputSink::Writer(w) => w.flush(),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Buffer(bytes) => write!(f, "OutputSink::Buffer({} bytes)", bytes.len()),
            OutputSink::Writer(_) => f.write_str("OutputSink::Writer"),
        }
    }
}

/// The low-level writer contract every backend implements. Backends must be
/// behaviorally indistinguishable through this interface; they may differ in
/// buffering and performance only.
///
/// Separator rule, uniform across `key`/`scalar`/`raw`: when the current
/// level's element index is non-zero a separator precedes the content. Keys
/// do not bump the index; the value half of a pair does.
pub trait Encoder {
    /// Write a key in the current map scope (the `:` included).
    fn key(&mut self, key: &str) -> Result<()>;

    /// Write a leaf value at the current position.
    fn scalar(&mut self, value: &Scalar) -> Result<()>;

    fn open_map(&mut self) -> Result<()>;
    fn close_map(&mut self) -> Result<()>;
    fn open_array(&mut self) -> Result<()>;
    fn close_array(&mut self) -> Result<()>;

    /// Splice pre-serialized content verbatim, updating separator bookkeeping
    /// as one logical element. In a map scope with a key pending the fragment
    /// is that key's value; with no key pending it must carry its own
    /// key/value content. An empty fragment writes nothing.
    fn raw(&mut self, fragment: &str) -> Result<()>;

    /// Enter a capture scope: a detached frame mirroring the current top of
    /// the stack, so a captured block sees the same context without any
    /// synthetic brackets being emitted.
    fn begin_capture(&mut self);

    /// Leave the innermost capture scope. Bookkeeping is restored to its
    /// pre-capture state either way; a block that left containers open is
    /// reported as a structural error.
    fn end_capture(&mut self) -> Result<()>;

    /// Abandon the innermost capture scope after a failed block, restoring
    /// pre-capture bookkeeping without balance checks.
    fn abort_capture(&mut self);

    /// Swap the active sink, returning the previous one. `flush` must be
    /// called before and after every redirect.
    fn redirect(&mut self, sink: OutputSink) -> OutputSink;

    /// Push any internally buffered bytes out to the active sink.
    fn flush(&mut self) -> Result<()>;

    fn depth(&self) -> usize;
    fn top(&self) -> Option<ContainerKind>;
    fn has_pending_key(&self) -> bool;

    /// Flush and surrender the sink.
    fn into_sink(self: Box<Self>) -> Result<OutputSink>;
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: ContainerKind,
    count: usize,
    /// Capture boundary; never closable by the running block.
    detached: bool,
}

#[derive(Debug, Clone, Copy)]
struct CaptureMark {
    depth: usize,
    synthetic: bool,
    pending_key: bool,
    root_done: bool,
}

/// Container bookkeeping shared by every backend, so separator and
/// structural behavior cannot diverge between them. Methods that place
/// content return whether a separator must precede it.
#[derive(Debug, Default)]
pub(crate) struct ContainerStack {
    frames: Vec<Frame>,
    marks: Vec<CaptureMark>,
    pending_key: bool,
    root_done: bool,
}

impl ContainerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<ContainerKind> {
        self.frames.last().map(|f| f.kind)
    }

    pub fn has_pending_key(&self) -> bool {
        self.pending_key
    }

    pub fn key(&mut self) -> std::result::Result<bool, StructuralError> {
        match self.frames.last() {
            Some(frame) if frame.kind == ContainerKind::Map => {
                if self.pending_key {
                    return Err(StructuralError::KeyAlreadyPending);
                }
                self.pending_key = true;
                Ok(frame.count > 0)
            }
            _ => Err(StructuralError::KeyOutsideObject),
        }
    }

    pub fn value(&mut self) -> std::result::Result<bool, StructuralError> {
        match self.frames.last_mut() {
            None => {
                if self.root_done {
                    return Err(StructuralError::DocumentComplete);
                }
                self.root_done = true;
                Ok(false)
            }
            Some(frame) => match frame.kind {
                ContainerKind::Array => {
                    let sep = frame.count > 0;
                    frame.count += 1;
                    Ok(sep)
                }
                ContainerKind::Map => {
                    if !self.pending_key {
                        return Err(StructuralError::ValueWithoutKey);
                    }
                    self.pending_key = false;
                    frame.count += 1;
                    // The separator, if any, was emitted before the key.
                    Ok(false)
                }
            },
        }
    }

    /// Like `value`, except a map scope with no key pending accepts whole
    /// key/value content as one element.
    pub fn raw(&mut self) -> std::result::Result<bool, StructuralError> {
        match self.frames.last_mut() {
            Some(frame) if frame.kind == ContainerKind::Map && !self.pending_key => {
                let sep = frame.count > 0;
                frame.count += 1;
                Ok(sep)
            }
            _ => self.value(),
        }
    }

    pub fn open(&mut self, kind: ContainerKind) -> std::result::Result<bool, StructuralError> {
        let sep = self.value()?;
        self.frames.push(Frame {
            kind,
            count: 0,
            detached: false,
        });
        Ok(sep)
    }

    pub fn close(&mut self, kind: ContainerKind) -> std::result::Result<(), StructuralError> {
        match self.frames.last() {
            Some(frame) if !frame.detached => {
                if frame.kind != kind {
                    return Err(StructuralError::MismatchedClose {
                        requested: kind,
                        found: frame.kind,
                    });
                }
                if self.pending_key {
                    return Err(StructuralError::PendingKeyAtClose);
                }
                self.frames.pop();
                Ok(())
            }
            _ => Err(StructuralError::CloseWithoutOpen { requested: kind }),
        }
    }

    pub fn begin_capture(&mut self) {
        let mark = CaptureMark {
            depth: self.frames.len(),
            synthetic: self.top().is_some(),
            pending_key: self.pending_key,
            root_done: self.root_done,
        };
        if let Some(kind) = self.top() {
            self.frames.push(Frame {
                kind,
                count: 0,
                detached: true,
            });
        }
        self.marks.push(mark);
        self.root_done = false;
    }

    pub fn end_capture(&mut self) -> std::result::Result<(), StructuralError> {
        let Some(mark) = self.marks.pop() else {
            return Err(StructuralError::CaptureUnderflow);
        };
        let expected = mark.depth + usize::from(mark.synthetic);
        let balanced = self.frames.len() == expected;
        self.frames.truncate(mark.depth);
        self.pending_key = mark.pending_key;
        self.root_done = mark.root_done;
        if balanced {
            Ok(())
        } else {
            Err(StructuralError::UnbalancedCapture)
        }
    }

    pub fn abort_capture(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.frames.truncate(mark.depth);
            self.pending_key = mark.pending_key;
            self.root_done = mark.root_done;
        }
    }
}
