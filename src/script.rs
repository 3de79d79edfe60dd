//! Script text loading.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// A script split into lines, with `\r\n` line endings normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    /// Read a script file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Could not read DATA file from {:?}", path.as_ref()))?;
        Ok(Self::from_text(&text))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_is_normalized() {
        let script = Script::from_text("SELECT 1;\r\n\\go\r\nSELECT 2;");
        assert_eq!(script.lines(), ["SELECT 1;", "\\go", "SELECT 2;"]);
    }

    #[test]
    fn test_trailing_newline_leaves_empty_last_line() {
        let script = Script::from_text("a\n");
        assert_eq!(script.lines(), ["a", ""]);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = Script::load_from_file("/nonexistent/script.sql").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/script.sql"));
    }
}
