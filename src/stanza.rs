//! Line-level parsing of AIX passwd stanzas.
//!
//! The file is a list of stanzas:
//!
//! ```text
//! root:
//!         password = 8Ql0ECRWiDbpA
//!         lastupdate = 1343220070
//! ```
//!
//! Hash schemes are recognized by substring sniffing on the raw line, not by
//! parsing the value. When several tags appear on one line the precedence is
//! `smd5`, then `ssha`, then plain DES.
use crate::record::{HashRecord, SMD5_ENCODED_LEN};

const PASSWORD_ATTR: &str = "password = ";
const SMD5_TAG: &str = "smd5";
const SSHA_TAG: &str = "ssha";
const DES_LOCKED: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StanzaError {
    #[error("malformed ssha value for {username}: expected 3 '$' fields, got {fields}")]
    MalformedShaTriple { username: String, fields: usize },
}

/// Attribute line categories, in the order they are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    SaltedMd5,
    SaltedSha,
    DesCrypt,
}

/// Remove one trailing `\n`, leaving any `\r` or other whitespace in place.
pub fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// Username opened by a stanza header (`name:`), or `None` for other lines.
pub fn stanza_username(line: &str) -> Option<&str> {
    if !line.ends_with(':') {
        return None;
    }
    line.split(':').next()
}

pub fn classify(line: &str) -> Option<AttributeKind> {
    if !line.contains(PASSWORD_ATTR) {
        return None;
    }
    if line.contains(SMD5_TAG) {
        Some(AttributeKind::SaltedMd5)
    } else if line.contains(SSHA_TAG) {
        Some(AttributeKind::SaltedSha)
    } else {
        Some(AttributeKind::DesCrypt)
    }
}

/// Text after the first `=`, trimmed.
pub fn attribute_value(line: &str) -> &str {
    line.split_once('=').map(|(_, v)| v.trim()).unwrap_or("")
}

/// Turn one attribute line into a record.
///
/// `Ok(None)` means the line is not a password attribute, or holds a locked
/// DES entry or a salted-MD5 value of the wrong length.
pub fn parse_attribute(username: &str, line: &str) -> Result<Option<HashRecord>, StanzaError> {
    let Some(kind) = classify(line) else {
        return Ok(None);
    };
    let value = attribute_value(line);
    let record = match kind {
        AttributeKind::SaltedMd5 => {
            if value.chars().count() != SMD5_ENCODED_LEN {
                return Ok(None);
            }
            HashRecord::SaltedMd5 {
                username: username.to_string(),
                raw37: value.to_string(),
            }
        }
        AttributeKind::SaltedSha => {
            let fields: Vec<&str> = value.split('$').collect();
            let [cost, salt, digest] = fields.as_slice() else {
                return Err(StanzaError::MalformedShaTriple {
                    username: username.to_string(),
                    fields: fields.len(),
                });
            };
            HashRecord::SaltedSha {
                username: username.to_string(),
                cost: cost.to_string(),
                salt: salt.to_string(),
                digest: digest.to_string(),
            }
        }
        AttributeKind::DesCrypt => {
            if value == DES_LOCKED {
                return Ok(None);
            }
            HashRecord::DesCrypt {
                username: username.to_string(),
                hash: value.to_string(),
            }
        }
    };
    Ok(Some(record))
}
