//! Engine: runs the extractor over a list of passwd files and writes the
//! resulting lines to a sink. One failing source never stops the others.
//!
//! Typical usage:
//!
//! ```no_run
//! use aix2john::engine::Engine;
//! use aix2john::record::Md5Mode;
//! # fn main() -> anyhow::Result<()> {
//! let engine = Engine::new(Md5Mode::Standard);
//! let stdout = std::io::stdout();
//! let report = engine.run(&["/etc/security/passwd"], &mut stdout.lock())?;
//! assert!(report.all_ok());
//! # Ok(())
//! # }
//! ```
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, error};
use rayon::prelude::*;

use crate::extract::{ExtractError, extract};
use crate::io::{DEFAULT_MMAP_THRESHOLD_BYTES, iter_lines_auto};
use crate::record::Md5Mode;
use crate::stats::ExtractStats;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{:#}", .source)]
    Unavailable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("{}: {}", .path.display(), .source)]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
}

/// Result of processing one source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub stats: ExtractStats,
    pub error: Option<SourceError>,
}

/// Per-run summary, one outcome per input path in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub sources: Vec<SourceOutcome>,
}

impl RunReport {
    pub fn all_ok(&self) -> bool {
        self.sources.iter().all(|s| s.error.is_none())
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }

    pub fn totals(&self) -> ExtractStats {
        let mut total = ExtractStats::default();
        for s in &self.sources {
            total += s.stats;
        }
        total
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub mode: Md5Mode,
    pub mmap_threshold_bytes: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Md5Mode::default())
    }
}

impl Engine {
    pub fn new(mode: Md5Mode) -> Self {
        Self {
            mode,
            mmap_threshold_bytes: DEFAULT_MMAP_THRESHOLD_BYTES,
        }
    }

    pub fn with_mmap_threshold(mut self, threshold_bytes: u64) -> Self {
        self.mmap_threshold_bytes = threshold_bytes;
        self
    }

    /// Extract from in-memory contents. Intended for tests and small
    /// programmatic integrations.
    pub fn extract_str(&self, contents: &str) -> Result<Vec<String>, ExtractError> {
        let lines = contents.split_inclusive('\n').map(|l| Ok(l.to_string()));
        extract(lines, self.mode).collect()
    }

    /// Process each path in turn, streaming lines to `out` as they are
    /// produced. Errors writing to `out` abort the run; source errors are
    /// logged and recorded in the report.
    pub fn run<P: AsRef<Path>, W: Write>(&self, paths: &[P], out: &mut W) -> Result<RunReport> {
        let mut report = RunReport::default();
        for p in paths {
            let path = p.as_ref();
            let (stats, error) = self.extract_source(path, |line| writeln!(out, "{}", line))?;
            report.sources.push(self.finish(path, stats, error));
        }
        out.flush()?;
        Ok(report)
    }

    /// Like [`Engine::run`] but extracts all sources concurrently. Output is
    /// buffered per source and written in input order, so it matches the
    /// sequential run byte for byte.
    pub fn run_parallel<P, W>(&self, paths: &[P], out: &mut W) -> Result<RunReport>
    where
        P: AsRef<Path> + Sync,
        W: Write,
    {
        let collected: Vec<(Vec<String>, ExtractStats, Option<SourceError>)> = paths
            .par_iter()
            .map(|p| {
                let mut buf = Vec::new();
                let (stats, error) = self
                    .extract_source(p.as_ref(), |line| {
                        buf.push(line);
                        Ok(())
                    })
                    .unwrap_or_default();
                (buf, stats, error)
            })
            .collect();

        let mut report = RunReport::default();
        for (p, (lines, stats, error)) in paths.iter().zip(collected) {
            for line in &lines {
                writeln!(out, "{}", line)?;
            }
            report.sources.push(self.finish(p.as_ref(), stats, error));
        }
        out.flush()?;
        Ok(report)
    }

    /// Run one source to completion, handing each line to `emit`. The file
    /// is closed when the line iterator drops, on every path out of here.
    fn extract_source<F>(
        &self,
        path: &Path,
        mut emit: F,
    ) -> io::Result<(ExtractStats, Option<SourceError>)>
    where
        F: FnMut(String) -> io::Result<()>,
    {
        let lines = match self.open(path) {
            Ok(lines) => lines,
            Err(e) => return Ok((ExtractStats::default(), Some(e))),
        };
        let mut ex = extract(lines, self.mode);
        let mut error = None;
        for item in ex.by_ref() {
            match item {
                Ok(line) => emit(line)?,
                Err(source) => {
                    error = Some(SourceError::Extract {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
        Ok((ex.stats(), error))
    }

    fn open(&self, path: &Path) -> Result<crate::io::LineIter, SourceError> {
        debug!("opening {}", path.display());
        iter_lines_auto(path, self.mmap_threshold_bytes).map_err(|source| {
            SourceError::Unavailable {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn finish(&self, path: &Path, stats: ExtractStats, error: Option<SourceError>) -> SourceOutcome {
        match &error {
            Some(e) => error!("{}", e),
            None => debug!("{}: {}", path.display(), stats),
        }
        SourceOutcome {
            path: path.to_path_buf(),
            stats,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SMD5: &str = "{smd5}a4Pl3bKp$kRbgLm7Jx2yEIvSLzEWmh1";

    #[test]
    fn extract_str_applies_mode() {
        let input = format!("dbadmin:\n\tpassword = {SMD5}\n");
        let std = Engine::new(Md5Mode::Standard).extract_str(&input).unwrap();
        assert_eq!(std, vec!["dbadmin:$1$a4Pl3bKp$kRbgLm7Jx2yEIvSLzEWmh1"]);
        let native = Engine::default().extract_str(&input).unwrap();
        assert_eq!(native, vec![format!("dbadmin:{SMD5}")]);
    }

    #[test]
    fn missing_and_malformed_sources_do_not_stop_the_run() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good");
        let bad = dir.path().join("bad");
        let missing = dir.path().join("missing");
        fs::write(&good, "root:\n\tpassword = 8Ql0ECRWiDbpA\n").unwrap();
        fs::write(
            &bad,
            "a:\n\tpassword = aaaaaaaaaaaaa\nb:\n\tpassword = {ssha1}x\nc:\n\tpassword = ccccccccccccc\n",
        )
        .unwrap();

        let paths = [&missing, &bad, &good];
        for parallel in [false, true] {
            let engine = Engine::default().with_mmap_threshold(8);
            let mut out = Vec::new();
            let report = if parallel {
                engine.run_parallel(&paths, &mut out).unwrap()
            } else {
                engine.run(&paths, &mut out).unwrap()
            };
            assert_eq!(
                String::from_utf8(out).unwrap(),
                "a:aaaaaaaaaaaaa\nroot:8Ql0ECRWiDbpA\n"
            );
            assert_eq!(report.failed(), 2);
            assert!(!report.all_ok());
            assert!(matches!(
                report.sources[0].error,
                Some(SourceError::Unavailable { .. })
            ));
            assert!(matches!(
                report.sources[1].error,
                Some(SourceError::Extract { .. })
            ));
            assert!(report.sources[2].error.is_none());
            assert_eq!(report.totals().des, 2);
        }
    }

    #[test]
    fn empty_file_yields_nothing() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty");
        fs::write(&empty, "").unwrap();
        let mut out = Vec::new();
        let report = Engine::default()
            .with_mmap_threshold(0)
            .run(&[&empty], &mut out)
            .unwrap();
        assert!(out.is_empty());
        assert!(report.all_ok());
    }
}
