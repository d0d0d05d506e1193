//! Counters collected while extracting, reported with `--log-parse-stats`.
use std::fmt;
use std::ops::AddAssign;

use crate::record::HashRecord;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub des: usize,
    pub smd5: usize,
    pub ssha: usize,
    /// DES entries holding the `*` lock marker.
    pub disabled: usize,
    /// Salted-MD5 values that were not 37 characters long.
    pub bad_length_smd5: usize,
}

impl ExtractStats {
    pub fn record(&mut self, record: &HashRecord) {
        match record {
            HashRecord::DesCrypt { .. } => self.des += 1,
            HashRecord::SaltedMd5 { .. } => self.smd5 += 1,
            HashRecord::SaltedSha { .. } => self.ssha += 1,
        }
    }

    pub fn emitted(&self) -> usize {
        self.des + self.smd5 + self.ssha
    }

    pub fn skipped(&self) -> usize {
        self.disabled + self.bad_length_smd5
    }
}

impl AddAssign for ExtractStats {
    fn add_assign(&mut self, rhs: Self) {
        self.des += rhs.des;
        self.smd5 += rhs.smd5;
        self.ssha += rhs.ssha;
        self.disabled += rhs.disabled;
        self.bad_length_smd5 += rhs.bad_length_smd5;
    }
}

impl fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emitted={} (des={}, smd5={}, ssha={}), skipped={} (disabled={}, bad_length_smd5={})",
            self.emitted(),
            self.des,
            self.smd5,
            self.ssha,
            self.skipped(),
            self.disabled,
            self.bad_length_smd5
        )
    }
}
