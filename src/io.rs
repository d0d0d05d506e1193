//! Line sources for passwd files.
//!
//! Lines are yielded with their trailing `\n` still attached (the extractor
//! strips it) and decoded lossily, so stray non-UTF-8 bytes in a stanza never
//! stop a scan.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Threshold in bytes above which we attempt to use mmap for reading.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB

pub type LineIter = Box<dyn Iterator<Item = io::Result<String>> + Send + 'static>;

pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

/// Lines of any buffered reader, newline kept.
pub struct RawLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> RawLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line_from_bytes(&self.buf))),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Iterate lines from a file path using a buffered reader.
pub fn iter_lines_bufread<P: AsRef<Path>>(path: P) -> Result<LineIter> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(Box::new(RawLines::new(BufReader::new(file))))
}

/// Iterate lines from a file path using mmap.
pub fn iter_lines_mmap<P: AsRef<Path>>(path: P) -> Result<LineIter> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    // The map is read-only and dropped with the iterator.
    let mmap =
        unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.as_ref().display()))?;
    Ok(Box::new(MmapLines { mmap, pos: 0 }))
}

struct MmapLines {
    mmap: Mmap,
    pos: usize,
}

impl Iterator for MmapLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let data: &[u8] = &self.mmap;
        if self.pos >= data.len() {
            return None;
        }
        let start = self.pos;
        let end = match memchr::memchr(b'\n', &data[start..]) {
            Some(off) => start + off + 1,
            // last line without trailing newline
            None => data.len(),
        };
        self.pos = end;
        Some(Ok(line_from_bytes(&data[start..end])))
    }
}

fn line_from_bytes(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Choose mmap or bufread and return an iterator over lines.
pub fn iter_lines_auto<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<LineIter> {
    let meta =
        std::fs::metadata(&path).with_context(|| format!("stat {}", path.as_ref().display()))?;
    if meta.is_file() && meta.len() > 0 && should_use_mmap(meta.len(), threshold_bytes) {
        iter_lines_mmap(path)
    } else {
        iter_lines_bufread(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collect(iter: LineIter) -> Vec<String> {
        iter.map(|l| l.unwrap()).collect()
    }

    #[test]
    fn raw_lines_keep_newline_and_carriage_return() {
        let lines: Vec<String> = RawLines::new(&b"root:\r\n\tpassword = *\nlast"[..])
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["root:\r\n", "\tpassword = *\n", "last"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines: Vec<String> = RawLines::new(&b"us\xffer:\n"[..])
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["us\u{fffd}er:\n"]);
    }

    #[test]
    fn mmap_and_bufread_agree() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "root:\n\tpassword = 8Ql0ECRWiDbpA\n\nguest:").unwrap();
        f.flush().unwrap();
        let a = collect(iter_lines_mmap(f.path()).unwrap());
        let b = collect(iter_lines_bufread(f.path()).unwrap());
        let c = collect(iter_lines_auto(f.path(), 1).unwrap());
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(iter_lines_auto(dir.path().join("nope"), 0).is_err());
    }

    #[test]
    fn threshold_decision() {
        assert!(should_use_mmap(10, 10));
        assert!(!should_use_mmap(9, 10));
    }
}
