//! Extension allow-list
//!
//! Parsed from plain filter text (one pattern per line, e.g. `*.cpp`) with
//! all-or-nothing semantics: one malformed line rejects the whole filter so
//! a partially applied allow-list can never happen.

use crate::{ConvError, Result};
use std::path::Path;

/// Ordered set of extensions, each stored with its leading dot and the case
/// it was given. The empty filter accepts every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Parse raw filter text.
    ///
    /// CRLF is normalized to LF, empty lines are dropped, and the extension
    /// of every remaining line is extracted. Any line without an extractable
    /// extension fails the parse; no partial filter is produced.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut extensions: Vec<String> = Vec::new();

        for line in raw.replace("\r\n", "\n").split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let ext = extension_of(line)
                .ok_or_else(|| ConvError::FilterParse(line.to_string()))?;
            if !extensions.iter().any(|e| e == &ext) {
                extensions.push(ext);
            }
        }

        Ok(Self { extensions })
    }

    /// Serialize back to filter text, one `*<ext>` pattern per line.
    /// `parse(serialize(f)) == f` for any filter.
    pub fn serialize(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| format!("*{ext}\n"))
            .collect()
    }

    /// True if the filter is empty or the path's extension is allowed.
    /// Matching is ASCII case-insensitive.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{ext}");
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&dotted))
    }

    /// Load a persisted filter. A missing file is the empty filter.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Persist the filter as plain text.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialize())?;
        Ok(())
    }
}

/// Extension of a filter line: the substring from the last dot, or None when
/// there is no dot or the line ends in one.
fn extension_of(line: &str) -> Option<String> {
    let idx = line.rfind('.')?;
    let ext = &line[idx..];
    if ext.len() < 2 {
        return None;
    }
    Some(ext.to_string())
}
