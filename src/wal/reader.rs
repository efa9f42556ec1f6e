//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, WordKvError};

use super::entry::{FrameHeader, MAX_PAYLOAD_SIZE};
use super::{WalEntry, HEADER_SIZE};

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),
    /// Clean end of file
    End,
    /// File ends part-way through a frame (interrupted append)
    Torn { offset: u64 },
    /// Frame is complete but fails validation
    Corrupt { offset: u64, reason: String },
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset of the next frame
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Byte offset of the next unread frame (end of the valid prefix so far)
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// torn or corrupted frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn { offset } => Err(WordKvError::WalCorruption(format!(
                "incomplete frame at offset {}",
                offset
            ))),
            Frame::Corrupt { offset, reason } => Err(WordKvError::WalCorruption(format!(
                "bad frame at offset {}: {}",
                offset, reason
            ))),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        let offset = self.position;

        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(Frame::End),
            n if n < HEADER_SIZE => return Ok(Frame::Torn { offset }),
            _ => {}
        }

        let header = FrameHeader::parse(&header);
        if header.len > MAX_PAYLOAD_SIZE {
            return Ok(Frame::Corrupt {
                offset,
                reason: format!("implausible payload length {}", header.len),
            });
        }

        let mut payload = vec![0u8; header.len as usize];
        if read_full(&mut self.reader, &mut payload)? < payload.len() {
            return Ok(Frame::Torn { offset });
        }

        match WalEntry::from_parts(header, &payload) {
            Ok(entry) => {
                self.position += (HEADER_SIZE + payload.len()) as u64;
                Ok(Frame::Entry(entry))
            }
            Err(e) => Ok(Frame::Corrupt {
                offset,
                reason: e.to_string(),
            }),
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
///
/// Yields entries up to the first bad frame, yields that error once, then
/// stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
