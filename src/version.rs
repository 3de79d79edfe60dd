//! Version gate for `\needver`.
//!
//! The declared version must equal the version recorded in the database
//! exactly; there is no range or compatibility matching. Parse failures and
//! mismatches are distinct errors so callers can tell a bad script from a
//! wrong environment.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::engine::Engine;
use crate::error::{Result, ScriptError};

/// A parsed version: `[v]N(.N)*[-prerelease][+metadata]`.
///
/// Equality pads missing numeric segments with zeros, so `9.6` equals
/// `9.6.0`. Metadata is validated and then dropped.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    prerelease: Option<String>,
    original: String,
}

fn is_ident_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '~')
}

fn is_dotted_ident(s: &str) -> bool {
    s.split('.').all(is_ident_part)
}

impl FromStr for Version {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || ScriptError::parse(format!("cannot parse version ({s})"));

        let body = s.strip_prefix('v').unwrap_or(s);
        let body = match body.split_once('+') {
            Some((b, m)) if is_dotted_ident(m) => b,
            Some(_) => return Err(bad()),
            None => body,
        };

        let numeric_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (numbers, suffix) = body.split_at(numeric_end);

        let segments = numbers
            .split('.')
            .map(|seg| seg.parse::<u64>().map_err(|_| bad()))
            .collect::<Result<Vec<_>>>()?;

        let prerelease = if suffix.is_empty() {
            None
        } else {
            let pre = suffix.strip_prefix('-').unwrap_or(suffix);
            if !is_dotted_ident(pre) {
                return Err(bad());
            }
            Some(pre.to_string())
        };

        Ok(Self {
            segments,
            prerelease,
            original: s.to_string(),
        })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        let len = self.segments.len().max(other.segments.len());
        let padded = |v: &Version, i: usize| v.segments.get(i).copied().unwrap_or(0);
        (0..len).all(|i| padded(self, i) == padded(other, i)) && self.prerelease == other.prerelease
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Require the engine to report exactly `declared`.
pub async fn check(engine: &mut dyn Engine, declared: &str) -> Result<()> {
    let wanted: Version = declared.parse()?;

    let reported_raw = engine
        .reported_version()
        .await
        .map_err(|e| ScriptError::engine(format!("cannot get version from database: {e}")))?
        .unwrap_or_default();

    let reported: Version = reported_raw
        .trim()
        .parse()
        .map_err(|_| ScriptError::parse(format!("cannot parse database version ({reported_raw})")))?;

    if reported != wanted {
        return Err(ScriptError::VersionMismatch {
            declared: declared.to_string(),
            reported: reported_raw,
        });
    }

    info!("Version ok ({})", wanted);
    Ok(())
}
