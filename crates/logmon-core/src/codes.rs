//! Result codes and the code → description lookup table.
//!
//! Every outcome the monitor can record is a numeric [`ResultCode`]. The
//! description shown to consumers comes from a [`ResultCodeTable`], which is
//! either the built-in table or one loaded from an external YAML document.
//! The table is a pure lookup: unknown codes describe as `"undefined"`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use phf::phf_map;
use serde::Deserialize;

use crate::error::MonitorError;

/// Description returned for codes that are not in the table.
pub const UNDEFINED_DESCRIPTION: &str = "undefined";

static BUILTIN: phf::Map<u16, &'static str> = phf_map! {
    0u16 => "Success",
    1u16 => "File is missing or cannot be accessed",
    2u16 => "Invalid command usage",
    4u16 => "Document format is invalid",
    5u16 => "Configuration field is missing or invalid",
    6u16 => "Required output field is missing",
    7u16 => "Another instance is already running",
    8u16 => "Platform is not supported",
    21u16 => "No matching logfile found",
    99u16 => "Undefined error",
};

/// Terminal and recorded outcomes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    MissingFile,
    InvalidUsage,
    MalformedDocument,
    InvalidField,
    MissingOutputField,
    DuplicateProcess,
    UnsupportedPlatform,
    NoMatchingLogfile,
    Undefined,
}

impl ResultCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            ResultCode::Success => 0,
            ResultCode::MissingFile => 1,
            ResultCode::InvalidUsage => 2,
            ResultCode::MalformedDocument => 4,
            ResultCode::InvalidField => 5,
            ResultCode::MissingOutputField => 6,
            ResultCode::DuplicateProcess => 7,
            ResultCode::UnsupportedPlatform => 8,
            ResultCode::NoMatchingLogfile => 21,
            ResultCode::Undefined => 99,
        }
    }

    pub const fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            0 => ResultCode::Success,
            1 => ResultCode::MissingFile,
            2 => ResultCode::InvalidUsage,
            4 => ResultCode::MalformedDocument,
            5 => ResultCode::InvalidField,
            6 => ResultCode::MissingOutputField,
            7 => ResultCode::DuplicateProcess,
            8 => ResultCode::UnsupportedPlatform,
            21 => ResultCode::NoMatchingLogfile,
            99 => ResultCode::Undefined,
            _ => return None,
        })
    }

    /// Codes that stop a run as soon as their event has been appended.
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            ResultCode::MissingFile
                | ResultCode::MalformedDocument
                | ResultCode::InvalidField
                | ResultCode::DuplicateProcess
        )
    }

    /// Built-in description, independent of any loaded table.
    pub fn default_description(self) -> &'static str {
        BUILTIN
            .get(&self.as_u16())
            .copied()
            .unwrap_or(UNDEFINED_DESCRIPTION)
    }

    /// Process exit status for this code.
    pub fn exit_status(self) -> u8 {
        // every defined code is below 256
        self.as_u16() as u8
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[derive(Debug, Deserialize)]
struct CodeEntry {
    rc: serde_yaml::Value,
    desc: String,
}

/// Static mapping of numeric code → description.
#[derive(Debug, Clone)]
pub struct ResultCodeTable {
    entries: HashMap<u16, String>,
}

impl ResultCodeTable {
    /// The compiled-in table.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .entries()
                .map(|(code, desc)| (*code, (*desc).to_string()))
                .collect(),
        }
    }

    /// Load a table from a YAML sequence of `{rc, desc}` entries. `rc` may be
    /// written as a number or a quoted string.
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let text = std::fs::read_to_string(path).map_err(|e| MonitorError::missing_file(path, e))?;
        let raw: Vec<CodeEntry> = serde_yaml::from_str(&text)
            .map_err(|e| MonitorError::malformed(path, e.to_string()))?;

        let mut entries = HashMap::with_capacity(raw.len());
        for entry in raw {
            let code = match &entry.rc {
                serde_yaml::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
                serde_yaml::Value::String(s) => s.trim().parse::<u16>().ok(),
                _ => None,
            };
            let Some(code) = code else {
                return Err(MonitorError::malformed(
                    path,
                    format!("result code {:?} is not a number", entry.rc),
                ));
            };
            entries.insert(code, entry.desc);
        }
        Ok(Self { entries })
    }

    /// A table holding exactly `entries`.
    pub fn from_entries<S: Into<String>>(entries: impl IntoIterator<Item = (u16, S)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, desc)| (code, desc.into()))
                .collect(),
        }
    }

    /// Description for `code`, or `"undefined"` when the table has none.
    pub fn describe(&self, code: u16) -> &str {
        self.entries
            .get(&code)
            .map(String::as_str)
            .filter(|desc| !desc.is_empty())
            .unwrap_or(UNDEFINED_DESCRIPTION)
    }
}

impl Default for ResultCodeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
