//! Monitor and read-format documents.
//!
//! The monitor document is a YAML sequence of mappings, one per watched log
//! source, each with a non-empty `patternmatch` sequence:
//!
//! ```yaml
//! - logicalname: http-server-log
//!   instance: http
//!   logfilename: /var/log/http/access\.log\.\d+
//!   eventtype: InitializationError
//!   readtype: incremental
//!   rotation: N
//!   deduplicate: Y
//!   responsible: Support Application 001
//!   logfield1: fieldx1
//!   patternmatch:
//!     - patternsearch: ERROR
//!       matchtype: substring
//!       severity: sev1
//! ```
//!
//! Every spec is validated before any is returned, and the resulting error
//! lists all problems found, not just the first.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::error::MonitorError;
use crate::types::{MatchType, MonitorSpec, PatternMatch, ReadMode, Rotation};

const REQUIRED_SPEC_KEYS: &[&str] = &[
    "logfilename",
    "logicalname",
    "instance",
    "eventtype",
    "readtype",
    "rotation",
    "deduplicate",
    "responsible",
];
const OPTIONAL_SPEC_KEYS: &[&str] = &[
    "logfield1",
    "logfield2",
    "alarmonerror",
    "alarmonerrorsev",
    "patternmatch",
];
const PATTERN_KEYS: &[&str] = &["patternsearch", "matchtype", "severity", "alarmonmatch"];

/// Load and validate the monitor document at `path`.
pub fn load_monitor_specs(path: &Path) -> Result<Vec<MonitorSpec>, MonitorError> {
    let text = std::fs::read_to_string(path).map_err(|e| MonitorError::missing_file(path, e))?;
    parse_monitor_specs(path, &text)
}

/// Validate monitor document text. `path` is only used in error messages.
pub fn parse_monitor_specs(path: &Path, text: &str) -> Result<Vec<MonitorSpec>, MonitorError> {
    let document: Value =
        serde_yaml::from_str(text).map_err(|e| MonitorError::malformed(path, e.to_string()))?;
    let Value::Sequence(entries) = document else {
        return Err(MonitorError::malformed(path, "expected a sequence of monitor specs"));
    };

    let mut specs = Vec::with_capacity(entries.len());
    let mut problems = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Value::Mapping(map) = entry else {
            return Err(MonitorError::malformed(
                path,
                format!("spec {index} is not a mapping"),
            ));
        };
        if let Some(spec) = validate_spec(index, map, &mut problems) {
            specs.push(spec);
        }
    }

    if problems.is_empty() {
        Ok(specs)
    } else {
        Err(MonitorError::InvalidField { problems })
    }
}

fn validate_spec(index: usize, map: &Mapping, problems: &mut Vec<String>) -> Option<MonitorSpec> {
    let label = scalar(map, "logicalname")
        .map(|name| format!("spec {index} ({name})"))
        .unwrap_or_else(|| format!("spec {index}"));
    let before = problems.len();

    warn_unknown_keys(&label, map, &[REQUIRED_SPEC_KEYS, OPTIONAL_SPEC_KEYS]);

    for key in REQUIRED_SPEC_KEYS {
        if scalar(map, key).is_none() {
            problems.push(format!("{label}: missing `{key}`"));
        }
    }

    let logical_name = scalar(map, "logicalname").unwrap_or_default();
    if logical_name.chars().any(char::is_whitespace) {
        problems.push(format!("{label}: `logicalname` must not contain whitespace"));
    }

    let read_mode = enumerated(map, "readtype", ReadMode::parse, &label, problems);
    let rotation = enumerated(map, "rotation", Rotation::parse, &label, problems);
    let deduplicate = enumerated(map, "deduplicate", parse_flag, &label, problems);
    let alarm_on_error = match scalar(map, "alarmonerror") {
        Some(_) => enumerated(map, "alarmonerror", parse_flag, &label, problems),
        None => Some(false),
    };

    let file_pattern = scalar(map, "logfilename").unwrap_or_default();
    let split = match MonitorSpec::split_file_pattern(&file_pattern) {
        Ok(split) => Some(split),
        Err(e) => {
            problems.push(format!("{label}: `logfilename` is not a valid expression: {e}"));
            None
        }
    };

    let patterns = validate_patterns(&label, map, problems);

    if problems.len() > before {
        return None;
    }
    let (directory, basename) = split?;
    Some(MonitorSpec {
        logical_name,
        instance: scalar(map, "instance").unwrap_or_default(),
        file_pattern,
        directory,
        basename,
        event_type: scalar(map, "eventtype").unwrap_or_default(),
        read_mode: read_mode?,
        rotation: rotation?,
        deduplicate: deduplicate?,
        responsible: scalar(map, "responsible").unwrap_or_default(),
        field1: scalar(map, "logfield1").unwrap_or_default(),
        field2: scalar(map, "logfield2").unwrap_or_default(),
        alarm_on_error: alarm_on_error?,
        alarm_on_error_severity: scalar(map, "alarmonerrorsev"),
        patterns,
    })
}

fn validate_patterns(label: &str, map: &Mapping, problems: &mut Vec<String>) -> Vec<PatternMatch> {
    let entries = match map.get("patternmatch") {
        Some(Value::Sequence(entries)) if !entries.is_empty() => entries,
        Some(Value::Sequence(_)) | None | Some(Value::Null) => {
            problems.push(format!("{label}: missing `patternmatch`"));
            return Vec::new();
        }
        Some(_) => {
            problems.push(format!("{label}: `patternmatch` must be a sequence"));
            return Vec::new();
        }
    };

    let mut patterns = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let label = format!("{label} pattern {index}");
        let Value::Mapping(pattern) = entry else {
            problems.push(format!("{label}: must be a mapping"));
            continue;
        };
        warn_unknown_keys(&label, pattern, &[PATTERN_KEYS]);

        let Some(text) = scalar(pattern, "patternsearch") else {
            problems.push(format!("{label}: missing `patternsearch`"));
            continue;
        };
        if scalar(pattern, "matchtype").is_none() {
            problems.push(format!("{label}: missing `matchtype`"));
            continue;
        }
        let Some(match_type) = enumerated(pattern, "matchtype", MatchType::parse, &label, problems)
        else {
            continue;
        };
        let alarm_on_match = match scalar(pattern, "alarmonmatch") {
            Some(_) => {
                match enumerated(pattern, "alarmonmatch", parse_flag, &label, problems) {
                    Some(flag) => flag,
                    None => continue,
                }
            }
            None => false,
        };

        match PatternMatch::new(match_type, text) {
            Ok(mut rule) => {
                rule.severity = scalar(pattern, "severity");
                rule.alarm_on_match = alarm_on_match;
                patterns.push(rule);
            }
            Err(e) => problems.push(format!("{label}: invalid regexp: {e}")),
        }
    }
    patterns
}

fn enumerated<T>(
    map: &Mapping,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
    label: &str,
    problems: &mut Vec<String>,
) -> Option<T> {
    // absence is reported by the required-key pass
    let value = scalar(map, key)?;
    let parsed = parse(&value);
    if parsed.is_none() {
        problems.push(format!("{label}: invalid value {value:?} for `{key}`"));
    }
    parsed
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

/// Non-empty scalar value of `key`, rendered as text.
fn scalar(map: &Mapping, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn warn_unknown_keys(label: &str, map: &Mapping, known: &[&[&str]]) {
    for key in map.keys() {
        let name = key.as_str().unwrap_or_default();
        if !known.iter().any(|keys| keys.contains(&name)) {
            warn!(%label, key = ?key, "ignoring unknown key");
        }
    }
}

// ---------------------------------------------------------------------------
// Read format
// ---------------------------------------------------------------------------

/// How read mode renders each drained record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFormat {
    pub separator: String,
    pub fields: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldList {
    Words(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
struct RawReadFormat {
    separator: Option<String>,
    fields: Option<FieldList>,
}

/// Load the read-format document: a mapping with `separator` and `fields`
/// (either a whitespace-separated string or a list).
pub fn load_read_format(path: &Path) -> Result<ReadFormat, MonitorError> {
    let text = std::fs::read_to_string(path).map_err(|e| MonitorError::missing_file(path, e))?;
    parse_read_format(path, &text)
}

pub fn parse_read_format(path: &Path, text: &str) -> Result<ReadFormat, MonitorError> {
    let document: Value =
        serde_yaml::from_str(text).map_err(|e| MonitorError::malformed(path, e.to_string()))?;
    if !document.is_mapping() {
        return Err(MonitorError::malformed(path, "expected a mapping"));
    }
    let raw: RawReadFormat = serde_yaml::from_value(document)
        .map_err(|e| MonitorError::malformed(path, e.to_string()))?;

    let mut problems = Vec::new();
    let separator = raw.separator.filter(|s| !s.is_empty());
    if separator.is_none() {
        problems.push("read format: missing `separator`".to_string());
    }
    let fields: Vec<String> = match raw.fields {
        Some(FieldList::Words(words)) => words.split_whitespace().map(str::to_string).collect(),
        Some(FieldList::List(list)) => list.into_iter().filter(|f| !f.trim().is_empty()).collect(),
        None => Vec::new(),
    };
    if fields.is_empty() {
        problems.push("read format: missing `fields`".to_string());
    }

    match separator {
        Some(separator) if problems.is_empty() => Ok(ReadFormat { separator, fields }),
        _ => Err(MonitorError::InvalidField { problems }),
    }
}
