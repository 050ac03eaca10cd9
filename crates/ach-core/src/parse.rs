//! Reading unlock files into typed per-cracker records.
//!
//! Each cracker's file is decoded into its own record shape, so the adapter
//! can match on the cracker instead of probing field names at runtime.

use std::collections::BTreeMap;
use std::fs;
use std::io;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::cracker::{AchievementFile, Cracker};
use crate::ini::{self, IniDocument, IniValue, Section};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("key/value pair before any section header on line {line}")]
    OrphanKey { line: usize },
    #[error("malformed line {line}")]
    MalformedLine { line: usize },
}

impl ParseError {
    /// Whether the error just means the file isn't there (yet).
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

/// Codex/Rune entry: `Achieved`, `UnlockTime`, `CurProgress`, `MaxProgress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SteamEmuEntry {
    pub achieved: bool,
    pub unlock_time: Option<i64>,
    pub cur_progress: Option<i64>,
    pub max_progress: Option<i64>,
}

impl SteamEmuEntry {
    fn from_section(section: &Section) -> Self {
        Self {
            achieved: section.get("Achieved").is_some_and(ini::IniValue::is_truthy),
            unlock_time: section.get("UnlockTime").and_then(ini::IniValue::as_i64),
            cur_progress: section.get("CurProgress").and_then(ini::IniValue::as_i64),
            max_progress: section.get("MaxProgress").and_then(ini::IniValue::as_i64),
        }
    }
}

/// `OnlineFix` entry: `achieved`, `timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineFixEntry {
    pub achieved: bool,
    pub timestamp: Option<i64>,
}

impl OnlineFixEntry {
    fn from_section(section: &Section) -> Self {
        Self {
            achieved: section.get("achieved").is_some_and(ini::IniValue::is_truthy),
            timestamp: section.get("timestamp").and_then(ini::IniValue::as_i64),
        }
    }
}

/// Goldberg entry: `earned`, `earned_time`.
///
/// Both fields accept any JSON scalar and follow the sectioned formats'
/// rules: numbers and `"true"`/`"yes"` count as earned, floats truncate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GoldbergEntry {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub earned: bool,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub earned_time: Option<i64>,
}

fn json_scalar(value: Value) -> Option<IniValue> {
    match value {
        Value::Bool(flag) => Some(IniValue::Integer(i64::from(flag))),
        Value::Number(n) => n
            .as_i64()
            .map(IniValue::Integer)
            .or_else(|| n.as_f64().map(IniValue::Float)),
        Value::String(text) => Some(IniValue::parse(text.trim())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(json_scalar(Value::deserialize(deserializer)?).as_ref().is_some_and(IniValue::is_truthy))
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(json_scalar(Value::deserialize(deserializer)?).as_ref().and_then(IniValue::as_i64))
}

/// Key under which an achievement id is stored in an [`UnlockRecord`].
///
/// Crackers don't agree with storefronts on the case of ids, so ids are
/// compared ignoring ASCII case.
pub fn entry_key(id: &str) -> String {
    id.to_ascii_uppercase()
}

/// Parsed contents of one unlock file, keyed by [`entry_key`] of the
/// achievement id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockRecord {
    Codex(BTreeMap<String, SteamEmuEntry>),
    Rune(BTreeMap<String, SteamEmuEntry>),
    OnlineFix(BTreeMap<String, OnlineFixEntry>),
    Goldberg(BTreeMap<String, GoldbergEntry>),
}

impl UnlockRecord {
    pub const fn cracker(&self) -> Cracker {
        match self {
            Self::Codex(_) => Cracker::Codex,
            Self::Rune(_) => Cracker::Rune,
            Self::OnlineFix(_) => Cracker::OnlineFix,
            Self::Goldberg(_) => Cracker::Goldberg,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Codex(entries) | Self::Rune(entries) => entries.len(),
            Self::OnlineFix(entries) => entries.len(),
            Self::Goldberg(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn steam_emu_entries(doc: &IniDocument) -> BTreeMap<String, SteamEmuEntry> {
    doc.sections()
        .map(|(id, section)| (entry_key(id), SteamEmuEntry::from_section(section)))
        .collect()
}

fn online_fix_entries(doc: &IniDocument) -> BTreeMap<String, OnlineFixEntry> {
    doc.sections()
        .map(|(id, section)| (entry_key(id), OnlineFixEntry::from_section(section)))
        .collect()
}

/// Decodes file contents for the given cracker.
pub fn parse_unlock_text(cracker: Cracker, text: &str) -> Result<UnlockRecord, ParseError> {
    match cracker {
        Cracker::Codex => Ok(UnlockRecord::Codex(steam_emu_entries(&ini::parse_sections(text)?))),
        Cracker::Rune => Ok(UnlockRecord::Rune(steam_emu_entries(&ini::parse_sections(text)?))),
        Cracker::OnlineFix => Ok(UnlockRecord::OnlineFix(online_fix_entries(
            &ini::parse_sections(text)?,
        ))),
        Cracker::Goldberg => parse_goldberg(text),
    }
}

/// Entries that aren't objects of the expected shape are skipped rather than
/// failing the whole file.
fn parse_goldberg(text: &str) -> Result<UnlockRecord, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let raw: BTreeMap<String, Value> = serde_json::from_str(text)?;
    let mut entries = BTreeMap::new();
    for (id, value) in raw {
        match serde_json::from_value::<GoldbergEntry>(value) {
            Ok(entry) => {
                entries.insert(entry_key(&id), entry);
            }
            Err(err) => tracing::debug!(id = %id, error = %err, "skipping malformed goldberg entry"),
        }
    }
    Ok(UnlockRecord::Goldberg(entries))
}

/// Reads and decodes an unlock file.
pub fn try_read_unlock_file(file: &AchievementFile) -> Result<UnlockRecord, ParseError> {
    let bytes = fs::read(&file.path)?;
    let text = String::from_utf8_lossy(&bytes);
    parse_unlock_text(file.cracker, &text)
}

/// Reads an unlock file, returning `None` when there is no usable data.
///
/// Missing files are expected (nothing unlocked yet) and logged at debug;
/// unreadable or malformed files are logged as warnings.
pub fn read_unlock_file(file: &AchievementFile) -> Option<UnlockRecord> {
    match try_read_unlock_file(file) {
        Ok(record) => {
            tracing::debug!(
                path = ?file.path,
                cracker = %file.cracker,
                entries = record.len(),
                "parsed unlock file"
            );
            Some(record)
        }
        Err(err) if err.is_missing() => {
            tracing::debug!(path = ?file.path, "unlock file not present");
            None
        }
        Err(err) => {
            tracing::warn!(path = ?file.path, cracker = %file.cracker, error = %err, "failed to parse unlock file");
            None
        }
    }
}
