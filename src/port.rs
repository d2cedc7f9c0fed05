//! I/O ports
//!
//! Three port kinds: standard (process stdio), file (path + mode) and
//! string (in-memory). Each port carries input, output and binary flags.
//! Input ports expose character-level `get`/`peek`/`putback`; the internal
//! encoding is UTF-8 and file/standard ports decode line by line at the
//! boundary. Closing flushes and marks the port EOF; closing twice is
//! idempotent.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result, StreamCondition};

#[derive(Debug)]
enum Stream {
    Standard,
    File {
        reader: Option<BufReader<File>>,
        writer: Option<BufWriter<File>>,
    },
    Str {
        data: Vec<char>,
        pos: usize,
    },
}

#[derive(Debug)]
pub struct Port {
    input: bool,
    output: bool,
    binary: bool,
    closed: bool,
    at_eof: bool,
    pending: VecDeque<char>,
    stream: Stream,
}

impl Port {
    fn new(stream: Stream, input: bool, output: bool, binary: bool) -> Port {
        Port {
            input,
            output,
            binary,
            closed: false,
            at_eof: false,
            pending: VecDeque::new(),
            stream,
        }
    }

    /// Input port wrapping process stdin.
    pub fn standard_input() -> Port {
        Port::new(Stream::Standard, true, false, false)
    }

    /// Output port wrapping process stdout.
    pub fn standard_output() -> Port {
        Port::new(Stream::Standard, false, true, false)
    }

    /// Open a file port. Reading and writing use separate handles when both
    /// directions are requested.
    pub fn open_file(path: &Path, input: bool, output: bool, binary: bool) -> Result<Port> {
        let reader = if input {
            Some(BufReader::new(File::open(path).map_err(|_| {
                Error::InputPort(StreamCondition::Failed)
            })?))
        } else {
            None
        };
        let writer = if output {
            Some(BufWriter::new(File::create(path).map_err(|_| {
                Error::OutputPort(StreamCondition::Failed)
            })?))
        } else {
            None
        };
        Ok(Port::new(
            Stream::File { reader, writer },
            input,
            output,
            binary,
        ))
    }

    /// In-memory input port over the argument text.
    pub fn string_input(text: &str) -> Port {
        Port::new(
            Stream::Str {
                data: text.chars().collect(),
                pos: 0,
            },
            true,
            false,
            false,
        )
    }

    /// In-memory output port accumulating written text.
    pub fn string_output() -> Port {
        Port::new(
            Stream::Str {
                data: Vec::new(),
                pos: 0,
            },
            false,
            true,
            false,
        )
    }

    pub fn is_input(&self) -> bool {
        self.input
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.stream, Stream::Standard)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.stream, Stream::File { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self.stream, Stream::Str { .. })
    }

    pub fn eof(&self) -> bool {
        self.closed || self.at_eof
    }

    /// Reset sticky end-of-file state so reads may be retried.
    pub fn clear(&mut self) {
        self.at_eof = false;
    }

    /// Content written to a string output port.
    pub fn output_string(&self) -> Option<String> {
        match &self.stream {
            Stream::Str { data, .. } => Some(data.iter().collect()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    fn fill(&mut self) -> Result<()> {
        match &mut self.stream {
            Stream::Str { data, pos } => {
                if *pos < data.len() {
                    self.pending.extend(data[*pos..].iter().copied());
                    *pos = data.len();
                }
                Ok(())
            }
            Stream::Standard => {
                let mut line = String::new();
                io::stdin()
                    .read_line(&mut line)
                    .map_err(|_| Error::InputPort(StreamCondition::Failed))?;
                self.pending.extend(line.chars());
                Ok(())
            }
            Stream::File { reader, .. } => {
                if let Some(r) = reader {
                    let mut line = String::new();
                    r.read_line(&mut line)
                        .map_err(|_| Error::InputPort(StreamCondition::Failed))?;
                    self.pending.extend(line.chars());
                }
                Ok(())
            }
        }
    }

    /// Read one character; None at end-of-file.
    pub fn get(&mut self) -> Result<Option<char>> {
        if !self.input {
            return Err(Error::InputPort(StreamCondition::NotInput));
        }
        if self.closed {
            return Ok(None);
        }
        if let Some(c) = self.pending.pop_front() {
            return Ok(Some(c));
        }
        self.fill()?;
        match self.pending.pop_front() {
            Some(c) => Ok(Some(c)),
            None => {
                self.at_eof = true;
                Ok(None)
            }
        }
    }

    /// Look at the next character without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>> {
        if !self.input {
            return Err(Error::InputPort(StreamCondition::NotInput));
        }
        if self.closed {
            return Ok(None);
        }
        if self.pending.is_empty() {
            self.fill()?;
        }
        Ok(self.pending.front().copied())
    }

    /// Push a character back onto the stream. Unconditional; pushed-back
    /// characters are consumed in LIFO order.
    pub fn putback(&mut self, c: char) {
        self.pending.push_front(c);
        self.at_eof = false;
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        if !self.output {
            return Err(Error::OutputPort(StreamCondition::NotOutput));
        }
        if self.closed {
            return Err(Error::OutputPort(StreamCondition::EndOfFile));
        }
        match &mut self.stream {
            Stream::Standard => io::stdout()
                .lock()
                .write_all(text.as_bytes())
                .map_err(|_| Error::OutputPort(StreamCondition::Failed)),
            Stream::File { writer, .. } => match writer {
                Some(w) => w
                    .write_all(text.as_bytes())
                    .map_err(|_| Error::OutputPort(StreamCondition::Failed)),
                None => Err(Error::OutputPort(StreamCondition::Bad)),
            },
            Stream::Str { data, .. } => {
                data.extend(text.chars());
                Ok(())
            }
        }
    }

    pub fn write_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.stream {
            Stream::Standard if self.output => io::stdout()
                .flush()
                .map_err(|_| Error::OutputPort(StreamCondition::Failed)),
            Stream::File {
                writer: Some(w), ..
            } => w
                .flush()
                .map_err(|_| Error::OutputPort(StreamCondition::Failed)),
            _ => Ok(()),
        }
    }

    /// Flush and mark the port EOF. Idempotent; file handles are released.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.flush();
        if let Stream::File { reader, writer } = &mut self.stream {
            *reader = None;
            *writer = None;
        }
        self.closed = true;
    }
}
