//! Input and output streams
//!
//! Inputs are paths or `-` (stdin). Several inputs are read back to back as a
//! single line sequence; `.gz` inputs are decompressed on the fly. The stream
//! is pull-based: a file is only opened once the previous one is exhausted.

use flate2::read::MultiGzDecoder;
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{CommonError, Result};

/// The stream-redirection sentinel accepted for inputs and outputs.
pub const STDIO_SENTINEL: &str = "-";

/// Where lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    Path(PathBuf),
}

impl InputSource {
    pub fn parse(value: &str) -> Self {
        if value == STDIO_SENTINEL {
            InputSource::Stdin
        } else {
            InputSource::Path(PathBuf::from(value))
        }
    }

    fn is_gzip(&self) -> bool {
        match self {
            InputSource::Stdin => false,
            InputSource::Path(path) => path.extension().and_then(|s| s.to_str()) == Some("gz"),
        }
    }

    fn open(&self) -> Result<Box<dyn BufRead>> {
        let raw: Box<dyn Read> = match self {
            InputSource::Stdin => Box::new(io::stdin()),
            InputSource::Path(path) => {
                let file = File::open(path).map_err(|source| CommonError::OpenInput {
                    path: path.clone(),
                    source,
                })?;
                Box::new(file)
            },
        };

        if self.is_gzip() {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(raw))))
        } else {
            Ok(Box::new(BufReader::new(raw)))
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => f.write_str("<stdin>"),
            InputSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where output goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Path(PathBuf),
}

impl OutputTarget {
    pub fn parse(value: &str) -> Self {
        if value == STDIO_SENTINEL {
            OutputTarget::Stdout
        } else {
            OutputTarget::Path(PathBuf::from(value))
        }
    }

    /// Open a buffered writer for this target, truncating existing files
    pub fn create(&self) -> Result<Box<dyn Write>> {
        match self {
            OutputTarget::Stdout => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
            OutputTarget::Path(path) => {
                let file = File::create(path).map_err(|source| CommonError::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufWriter::new(file)))
            },
        }
    }
}

/// Newline-stripped text lines from one or more inputs, in order
pub struct LineStream {
    pending: VecDeque<(String, Box<dyn FnOnce() -> Result<Box<dyn BufRead>>>)>,
    current: Option<(String, Box<dyn BufRead>)>,
    line_number: u64,
    failed: bool,
}

impl LineStream {
    /// Build a stream over the given inputs; stdin is used when none are given
    pub fn open(inputs: &[InputSource]) -> Result<Self> {
        let sources = if inputs.is_empty() {
            vec![InputSource::Stdin]
        } else {
            inputs.to_vec()
        };

        let mut stream = Self::empty();
        for source in sources {
            let label = source.to_string();
            stream
                .pending
                .push_back((label, Box::new(move || source.open())));
        }

        // Fail fast on the first input instead of on the first pull
        stream.advance()?;
        Ok(stream)
    }

    /// Build a stream over an already-open reader
    pub fn from_reader(label: impl Into<String>, reader: impl Read + 'static) -> Self {
        let mut stream = Self::empty();
        stream.current = Some((label.into(), Box::new(BufReader::new(reader))));
        stream
    }

    fn empty() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            line_number: 0,
            failed: false,
        }
    }

    fn advance(&mut self) -> Result<bool> {
        match self.pending.pop_front() {
            Some((label, open)) => {
                debug!(input = %label, "opening input");
                self.current = Some((label, open()?));
                self.line_number = 0;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn read_line(&mut self) -> Option<Result<String>> {
        loop {
            if self.current.is_none() {
                match self.advance() {
                    Ok(true) => continue,
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                }
            }
            let (label, reader) = self.current.as_mut()?;

            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    self.current = None;
                },
                Ok(_) => {
                    self.line_number += 1;
                    while line.ends_with('\n') || line.ends_with('\r') {
                        line.pop();
                    }
                    return Some(Ok(line));
                },
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Some(Err(CommonError::NotText {
                        input: label.clone(),
                        line: self.line_number + 1,
                    }));
                },
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

impl Iterator for LineStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_line();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
