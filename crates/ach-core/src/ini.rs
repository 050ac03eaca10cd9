//! Sectioned key/value text as written by steam-emu style crackers.
//!
//! ```text
//! ### comment
//! [ACH_WIN_ONE_GAME]
//! Achieved=1
//! UnlockTime=1700000000
//! ```

use std::collections::BTreeMap;

use crate::parse::ParseError;

const COMMENT_PREFIX: &str = "###";

/// A single value, stored numerically when it looks like a number.
#[derive(Debug, Clone, PartialEq)]
pub enum IniValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl IniValue {
    pub(crate) fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Integer(n);
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Self::Float(f),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Integer view of the value. Floats are truncated; text never converts.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "unlock times and counters fit in i64; fractional parts are noise"
    )]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) => Some(f.trunc() as i64),
            Self::Text(_) => None,
        }
    }

    /// Whether the value counts as "set" for an unlock flag.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Integer(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        }
    }
}

pub type Section = BTreeMap<String, IniValue>;

/// A parsed sectioned document: section name to its key/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    sections: BTreeMap<String, Section>,
}

impl IniDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, section)| (name.as_str(), section))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Parses sectioned text.
///
/// A `key=value` line before the first `[section]` header and a line that is
/// neither a header nor a pair both fail the whole document. Reopening a
/// section merges into it.
pub fn parse_sections(text: &str) -> Result<IniDocument, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::MalformedLine { line: line_no });
        };
        let Some(section) = current.as_ref().and_then(|name| sections.get_mut(name)) else {
            return Err(ParseError::OrphanKey { line: line_no });
        };
        section.insert(key.trim().to_string(), IniValue::parse(value.trim()));
    }

    Ok(IniDocument { sections })
}
