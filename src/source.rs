//! Frame source abstraction and built-in providers.
//!
//! A [`FrameSource`] hands out one pre-encoded frame per call and
//! distinguishes a clean end-of-source from an I/O failure by construction.
//! A [`FrameSourceProvider`] opens sources by name; looping streams reopen
//! through the same provider.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// Result of a single frame read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// One frame of this many bytes was written to the buffer.
    Frame(usize),
    /// The source has no more frames.
    EndOfSource,
}

/// One open frame source, yielding frames in storage order.
pub trait FrameSource: Send {
    /// Read the next frame into `buf`, returning its length.
    ///
    /// A frame larger than `buf` is an I/O error, not a short read.
    fn read_next(&mut self, buf: &mut [u8]) -> io::Result<FrameRead>;
}

/// Opens frame sources by name.
pub trait FrameSourceProvider: Send + Sync {
    /// Open the named source positioned at its first frame.
    fn open(&self, name: &str) -> io::Result<Box<dyn FrameSource>>;
}

/// File-backed provider reading the length-prefixed frame container:
/// repeated `u16` little-endian payload length followed by the payload.
pub struct FileFrameProvider {
    root: PathBuf,
}

impl FileFrameProvider {
    /// Create a provider resolving names relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FrameSourceProvider for FileFrameProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn FrameSource>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(FileFrameSource {
            reader: BufReader::new(file),
        }))
    }
}

struct FileFrameSource {
    reader: BufReader<File>,
}

impl FrameSource for FileFrameSource {
    fn read_next(&mut self, buf: &mut [u8]) -> io::Result<FrameRead> {
        let mut header = [0u8; 2];
        match self.reader.read(&mut header[..1])? {
            0 => return Ok(FrameRead::EndOfSource),
            _ => self.reader.read_exact(&mut header[1..])?,
        }

        let len = u16::from_le_bytes(header) as usize;
        if len > buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {len} bytes exceeds {} byte block", buf.len()),
            ));
        }

        self.reader.read_exact(&mut buf[..len])?;
        Ok(FrameRead::Frame(len))
    }
}

/// In-memory provider mapping names to frame lists. Intended for hosts
/// without a filesystem and for tests.
#[derive(Default)]
pub struct MemoryFrameProvider {
    streams: HashMap<String, Vec<Vec<u8>>>,
}

impl MemoryFrameProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named frame sequence, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, frames: Vec<Vec<u8>>) {
        self.streams.insert(name.into(), frames);
    }
}

impl FrameSourceProvider for MemoryFrameProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn FrameSource>> {
        let frames = self
            .streams
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no stream `{name}`")))?;
        Ok(Box::new(MemoryFrameSource { frames, next: 0 }))
    }
}

struct MemoryFrameSource {
    frames: Vec<Vec<u8>>,
    next: usize,
}

impl FrameSource for MemoryFrameSource {
    fn read_next(&mut self, buf: &mut [u8]) -> io::Result<FrameRead> {
        let Some(frame) = self.frames.get(self.next) else {
            return Ok(FrameRead::EndOfSource);
        };
        if frame.len() > buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {} bytes exceeds {} byte block", frame.len(), buf.len()),
            ));
        }
        buf[..frame.len()].copy_from_slice(frame);
        self.next += 1;
        Ok(FrameRead::Frame(frame.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_container(frames: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for frame in frames {
            file.write_all(&(frame.len() as u16).to_le_bytes()).unwrap();
            file.write_all(frame).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_file_source_reads_frames_in_order() {
        let file = write_container(&[b"abc", b"defgh", b""]);
        let provider = FileFrameProvider::new(file.path().parent().unwrap());
        let name = file.path().file_name().unwrap().to_str().unwrap();

        let mut source = provider.open(name).unwrap();
        let mut buf = [0u8; 16];

        assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::Frame(3));
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::Frame(5));
        assert_eq!(&buf[..5], b"defgh");
        assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::Frame(0));
        assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::EndOfSource);
        assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::EndOfSource);
    }

    #[test]
    fn test_file_source_rejects_oversized_frame() {
        let file = write_container(&[b"0123456789"]);
        let provider = FileFrameProvider::new(file.path().parent().unwrap());
        let name = file.path().file_name().unwrap().to_str().unwrap();

        let mut source = provider.open(name).unwrap();
        let mut buf = [0u8; 4];
        assert!(source.read_next(&mut buf).is_err());
    }

    #[test]
    fn test_file_source_truncated_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x05]).unwrap();
        file.flush().unwrap();

        let provider = FileFrameProvider::new(file.path().parent().unwrap());
        let name = file.path().file_name().unwrap().to_str().unwrap();

        let mut source = provider.open(name).unwrap();
        let mut buf = [0u8; 16];
        assert!(source.read_next(&mut buf).is_err());
    }

    #[test]
    fn test_memory_source_reopens_from_start() {
        let mut provider = MemoryFrameProvider::new();
        provider.insert("s", vec![vec![1, 2], vec![3]]);

        let mut buf = [0u8; 8];
        for _ in 0..2 {
            let mut source = provider.open("s").unwrap();
            assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::Frame(2));
            assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::Frame(1));
            assert_eq!(source.read_next(&mut buf).unwrap(), FrameRead::EndOfSource);
        }
    }

    #[test]
    fn test_memory_provider_unknown_name() {
        let provider = MemoryFrameProvider::new();
        assert!(provider.open("missing").is_err());
    }
}
