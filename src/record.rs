//! Hash record model for entries pulled out of an AIX `/etc/security/passwd`
//! file, and their serialization to the `username:hash` lines consumed by
//! John the Ripper and similar tools.
//!
//! A [`HashRecord`] is built by [`crate::stanza::parse_attribute`], rendered
//! once with [`HashRecord::to_line`] and dropped.
use std::fmt;

/// Placeholder username for attribute lines seen before any stanza header.
pub const UNKNOWN_USERNAME: &str = "?";

/// Length of the header the AIX salted-MD5 encoding stores ahead of the
/// salt, e.g. `{smd5}`. Replaced by `$1$` in standard mode.
pub const SMD5_HEADER_LEN: usize = 6;

/// Exact length of a well-formed salted-MD5 value; anything else is dropped.
pub const SMD5_ENCODED_LEN: usize = 37;

/// Marker for canonical MD5-crypt hashes.
pub const MD5_CRYPT_MAGIC: &str = "$1$";

/// How salted-MD5 values are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Md5Mode {
    /// Pass the value through untouched.
    #[default]
    Native,
    /// Rewrite as `$1$salt$digest` (systems with `lpa_options = std_hash=true`).
    Standard,
}

impl From<bool> for Md5Mode {
    fn from(standard: bool) -> Self {
        if standard {
            Md5Mode::Standard
        } else {
            Md5Mode::Native
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashRecord {
    /// Traditional 13-character crypt(3) hash. Never holds the `*` lock marker.
    DesCrypt { username: String, hash: String },
    /// `{smd5}` value, always [`SMD5_ENCODED_LEN`] characters long.
    SaltedMd5 { username: String, raw37: String },
    /// `{sshaN}` value split into its three `$` fields.
    SaltedSha {
        username: String,
        cost: String,
        salt: String,
        digest: String,
    },
}

impl HashRecord {
    pub fn username(&self) -> &str {
        match self {
            HashRecord::DesCrypt { username, .. }
            | HashRecord::SaltedMd5 { username, .. }
            | HashRecord::SaltedSha { username, .. } => username,
        }
    }

    /// Render the hash part only, without the `username:` prefix.
    pub fn hash_text(&self, mode: Md5Mode) -> String {
        match self {
            HashRecord::DesCrypt { hash, .. } => hash.clone(),
            HashRecord::SaltedMd5 { raw37, .. } => match mode {
                Md5Mode::Native => raw37.clone(),
                Md5Mode::Standard => {
                    format!("{}{}", MD5_CRYPT_MAGIC, skip_chars(raw37, SMD5_HEADER_LEN))
                }
            },
            HashRecord::SaltedSha {
                cost, salt, digest, ..
            } => format!("{}${}${}", cost, salt, digest),
        }
    }

    /// Render the full output line (no trailing newline).
    pub fn to_line(&self, mode: Md5Mode) -> String {
        format!("{}:{}", self.username(), self.hash_text(mode))
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(Md5Mode::Native))
    }
}

fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}
