//! The entry extractor: a single forward pass over one passwd source that
//! turns `password = ...` attributes into `username:hash` lines.
//!
//! ```
//! use aix2john::extract::extract;
//! use aix2john::record::Md5Mode;
//!
//! let input = "alice:\n\tpassword = *\nbob:\n\tpassword = abcdefghijklm\n";
//! let lines = input.split_inclusive('\n').map(|l| Ok(l.to_string()));
//! let out: Result<Vec<String>, _> = extract(lines, Md5Mode::Native).collect();
//! assert_eq!(out.unwrap(), vec!["bob:abcdefghijklm"]);
//! ```
use std::io;

use crate::record::{Md5Mode, UNKNOWN_USERNAME};
use crate::stanza::{self, AttributeKind, StanzaError};
use crate::stats::ExtractStats;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("line {line}: {source}")]
    Stanza {
        line: usize,
        #[source]
        source: StanzaError,
    },
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

/// Lazy `username:hash` lines for one source.
///
/// The only state carried between lines is the active username. The first
/// error ends the sequence: it is yielded once and `None` follows.
pub struct Extractor<I> {
    lines: I,
    mode: Md5Mode,
    username: String,
    line_no: usize,
    stats: ExtractStats,
    done: bool,
}

pub fn extract<I>(lines: I, mode: Md5Mode) -> Extractor<I::IntoIter>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    Extractor {
        lines: lines.into_iter(),
        mode,
        username: UNKNOWN_USERNAME.to_string(),
        line_no: 0,
        stats: ExtractStats::default(),
        done: false,
    }
}

impl<I> Extractor<I> {
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// Username that the next attribute line would be bound to.
    pub fn current_username(&self) -> &str {
        &self.username
    }
}

impl<I> Iterator for Extractor<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<String, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let raw = match self.lines.next() {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ExtractError::Io(e)));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            self.line_no += 1;
            let line = stanza::strip_newline(&raw);

            if let Some(name) = stanza::stanza_username(line) {
                self.username = name.to_string();
                continue;
            }

            match stanza::parse_attribute(&self.username, line) {
                Ok(Some(record)) => {
                    self.stats.record(&record);
                    return Some(Ok(record.to_line(self.mode)));
                }
                Ok(None) => match stanza::classify(line) {
                    Some(AttributeKind::DesCrypt) => self.stats.disabled += 1,
                    Some(AttributeKind::SaltedMd5) => self.stats.bad_length_smd5 += 1,
                    Some(AttributeKind::SaltedSha) | None => {}
                },
                Err(source) => {
                    self.done = true;
                    return Some(Err(ExtractError::Stanza {
                        line: self.line_no,
                        source,
                    }));
                }
            }
        }
    }
}

impl<I> std::iter::FusedIterator for Extractor<I> where I: Iterator<Item = io::Result<String>> {}
