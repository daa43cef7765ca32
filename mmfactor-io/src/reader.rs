//! Memory-mapped event readers.
//!
//! Event files are JSON Lines: one [`Event`] object per line, blank lines
//! ignored.

use crate::{Error, Result};
use memmap2::Mmap;
use mmfactor_core::particle::Event;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// A memory-mapped JSON Lines event file.
pub struct EventFileReader {
    mmap: Arc<Mmap>,
}

impl EventFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Streams events in file order.
    ///
    /// The stream shares the mapping and can outlive the reader.
    #[must_use]
    pub fn events(&self) -> EventStream {
        EventStream {
            mmap: Arc::clone(&self.mmap),
            offset: 0,
            line: 0,
            skip_invalid: false,
        }
    }

    /// Reads every event into memory.
    ///
    /// # Errors
    /// Returns the first malformed line.
    pub fn read_all(&self) -> Result<Vec<Event>> {
        self.events().collect()
    }
}

/// Pull-based iterator over the events of a mapped file.
pub struct EventStream {
    mmap: Arc<Mmap>,
    offset: usize,
    line: usize,
    skip_invalid: bool,
}

impl EventStream {
    /// Skips malformed lines with a warning instead of yielding errors.
    #[must_use]
    pub fn skip_invalid(mut self) -> Self {
        self.skip_invalid = true;
        self
    }
}

impl Iterator for EventStream {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = &self.mmap[..];
        while self.offset < bytes.len() {
            let rest = &bytes[self.offset..];
            let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
            let record = &rest[..end];
            self.offset += end + 1;
            self.line += 1;

            if record.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<Event>(record) {
                Ok(event) => return Some(Ok(event)),
                Err(source) if self.skip_invalid => {
                    log::warn!("skipping invalid event on line {}: {source}", self.line);
                }
                Err(source) => {
                    return Some(Err(Error::InvalidEvent {
                        line: self.line,
                        source,
                    }))
                }
            }
        }
        None
    }
}
