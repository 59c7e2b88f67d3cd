//! Event mailbox: the durable store shared by the run and read processes.
//!
//! The store is a JSON Lines file: one [`OutputEvent`] object per line.
//!
//! - [`MailboxWriter`] only ever appends whole lines; it reopens the file
//!   for every append so a reader's swap is picked up immediately.
//! - [`MailboxReader`] loads every record, flips the unread ones to read,
//!   rewrites the store through [`atomic::replace_file`] and hands back the
//!   batch for rendering.
//!
//! There is no lock between the two. An append that lands after the reader
//! loaded the store but before its rename is lost; this is a known
//! limitation of the design.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::atomic;
use crate::codes::{ResultCode, ResultCodeTable};
use crate::document::ReadFormat;
use crate::error::MonitorError;
use crate::types::{MatchRecord, Watch};

/// Fields every record must carry for the reader to accept the store.
pub const REQUIRED_FIELDS: &[&str] = &[
    "logicalname",
    "logfilename",
    "rc",
    "rcdesc",
    "message",
    "timestamp",
    "read",
];

/// Placeholder rendered for requested fields that are absent or empty.
pub const NULL_FIELD: &str = "NULL";

/// One mailbox record, as written by the run process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    #[serde(rename = "logicalname")]
    pub logical_name: String,
    pub instance: String,
    #[serde(rename = "logfilename")]
    pub file_name: String,
    #[serde(rename = "eventtype")]
    pub event_type: String,
    #[serde(rename = "logeventtype")]
    pub log_event_type: String,
    pub responsible: String,
    pub tag: String,
    #[serde(rename = "logfield1")]
    pub field1: String,
    #[serde(rename = "logfield2")]
    pub field2: String,
    pub severity: String,
    pub rc: u16,
    #[serde(rename = "rcdesc")]
    pub description: String,
    pub resource: String,
    pub message: String,
    #[serde(rename = "actualnumberofhits")]
    pub hits: u64,
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: i64,
    pub read: bool,
}

/// A record before the writer fills in its defaults.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub code: ResultCode,
    pub logical_name: String,
    pub instance: String,
    pub file_name: String,
    pub event_type: String,
    pub responsible: String,
    pub field1: String,
    pub field2: String,
    pub severity: String,
    pub log_event_type: Option<String>,
    pub tag: Option<String>,
    pub resource: Option<String>,
    pub message: Option<String>,
    pub matched_content: Option<String>,
    pub hits: Option<u64>,
    pub timestamp: Option<i64>,
}

impl EventDraft {
    /// A draft with no identity, used for run-level failures.
    pub fn new(code: ResultCode) -> Self {
        Self {
            code,
            logical_name: String::new(),
            instance: String::new(),
            file_name: String::new(),
            event_type: String::new(),
            responsible: String::new(),
            field1: String::new(),
            field2: String::new(),
            severity: String::new(),
            log_event_type: None,
            tag: None,
            resource: None,
            message: None,
            matched_content: None,
            hits: None,
            timestamp: None,
        }
    }

    /// A draft identified by a watch and the file it refers to.
    pub fn for_watch(watch: Watch<'_>, file: &Path, code: ResultCode) -> Self {
        let spec = watch.spec;
        Self {
            logical_name: spec.logical_name.clone(),
            instance: spec.instance.clone(),
            file_name: file.display().to_string(),
            event_type: spec.event_type.clone(),
            responsible: spec.responsible.clone(),
            field1: spec.field1.clone(),
            field2: spec.field2.clone(),
            severity: watch.pattern.severity.clone().unwrap_or_default(),
            ..Self::new(code)
        }
    }

    pub fn with_match(mut self, record: &MatchRecord) -> Self {
        self.matched_content = Some(record.content.clone());
        self.hits = Some(record.count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Fill every unset field and resolve the description.
    pub fn complete(self, codes: &ResultCodeTable) -> OutputEvent {
        let resource = self.resource.unwrap_or_else(|| {
            [
                self.instance.as_str(),
                self.file_name.as_str(),
                self.event_type.as_str(),
                self.field1.as_str(),
                self.field2.as_str(),
            ]
            .join(":")
        });
        let message = self
            .message
            .or(self.matched_content)
            .unwrap_or_default();
        OutputEvent {
            log_event_type: self.log_event_type.unwrap_or_else(|| self.event_type.clone()),
            tag: self.tag.unwrap_or_else(|| self.responsible.clone()),
            rc: self.code.as_u16(),
            description: codes.describe(self.code.as_u16()).to_string(),
            resource,
            message,
            hits: self.hits.unwrap_or(0),
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            read: false,
            logical_name: self.logical_name,
            instance: self.instance,
            file_name: self.file_name,
            event_type: self.event_type,
            responsible: self.responsible,
            field1: self.field1,
            field2: self.field2,
            severity: self.severity,
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Append-only side of the mailbox.
#[derive(Debug, Clone)]
pub struct MailboxWriter {
    path: PathBuf,
    codes: ResultCodeTable,
}

impl MailboxWriter {
    pub fn new(path: impl Into<PathBuf>, codes: ResultCodeTable) -> Self {
        Self {
            path: path.into(),
            codes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Complete `draft` and append it as one line.
    ///
    /// When the code is fatal the event is still written first, then
    /// [`MonitorError::Terminated`] is returned so the run stops.
    pub fn append(&self, draft: EventDraft) -> Result<OutputEvent, MonitorError> {
        let event = draft.complete(&self.codes);
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MonitorError::missing_file(&self.path, e))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| MonitorError::io(&self.path, e))?;

        debug!(
            rc = event.rc,
            logical_name = %event.logical_name,
            hits = event.hits,
            "appended event"
        );

        if ResultCode::from_u16(event.rc).is_some_and(ResultCode::is_fatal) {
            error!(rc = event.rc, description = %event.description, "fatal event recorded");
            return Err(MonitorError::Terminated {
                code: ResultCode::from_u16(event.rc).unwrap_or(ResultCode::Undefined),
                description: event.description,
            });
        }
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// A mailbox record as loaded by the reader. Unknown keys are preserved.
pub type Record = Map<String, Value>;

/// What the reader's rewrite keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRetention {
    /// Every record, with the drained ones now marked read.
    KeepAll,
    /// Only the records drained by this pass.
    LastBatch,
}

impl ReadRetention {
    pub fn from_keep_read(keep_read: bool) -> Self {
        if keep_read {
            ReadRetention::KeepAll
        } else {
            ReadRetention::LastBatch
        }
    }
}

/// Drain side of the mailbox.
#[derive(Debug, Clone)]
pub struct MailboxReader {
    path: PathBuf,
    retention: ReadRetention,
}

impl MailboxReader {
    pub fn new(path: impl Into<PathBuf>, retention: ReadRetention) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    /// Load every record, mark the unread ones read, persist, and return
    /// them in store order.
    ///
    /// Nothing is persisted or returned if any record is unparsable or lacks
    /// one of [`REQUIRED_FIELDS`].
    pub fn drain(&self) -> Result<Vec<Record>, MonitorError> {
        let mut records = match self.load()? {
            Some(records) => records,
            None => {
                info!(path = %self.path.display(), "mailbox does not exist yet, nothing to drain");
                return Ok(Vec::new());
            }
        };

        for (index, record) in records.iter().enumerate() {
            if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !record.contains_key(**f)) {
                error!(index, field = *field, "mailbox record is missing a required field");
                return Err(MonitorError::MissingOutputField {
                    index,
                    field: (*field).to_string(),
                });
            }
        }

        let mut batch = Vec::new();
        for record in records.iter_mut() {
            if is_unread(record) {
                record.insert("read".to_string(), Value::Bool(true));
                batch.push(record.clone());
            }
        }

        if batch.is_empty() {
            debug!(path = %self.path.display(), total = records.len(), "no unread records");
            return Ok(batch);
        }

        let kept = match self.retention {
            ReadRetention::KeepAll => &records,
            ReadRetention::LastBatch => &batch,
        };
        atomic::replace_file(&self.path, |out| {
            for record in kept {
                serde_json::to_writer(&mut *out, record)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        })
        .map_err(|e| MonitorError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            drained = batch.len(),
            kept = kept.len(),
            "drained mailbox"
        );
        Ok(batch)
    }

    fn load(&self) -> Result<Option<Vec<Record>>, MonitorError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MonitorError::missing_file(&self.path, e)),
        };

        let mut records = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                MonitorError::malformed(&self.path, format!("line {}: {e}", number + 1))
            })?;
            let Value::Object(record) = value else {
                return Err(MonitorError::malformed(
                    &self.path,
                    format!("line {}: expected an object", number + 1),
                ));
            };
            records.push(record);
        }
        Ok(Some(records))
    }
}

fn is_unread(record: &Record) -> bool {
    match record.get("read") {
        Some(Value::Bool(read)) => !read,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("n"),
        _ => false,
    }
}

/// Render one record as a delimited line in the requested field order.
pub fn render(record: &Record, format: &ReadFormat) -> String {
    format
        .fields
        .iter()
        .map(|field| match record.get(field) {
            None | Some(Value::Null) => NULL_FIELD.to_string(),
            Some(Value::String(s)) if s.is_empty() => NULL_FIELD.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(format.separator.as_str())
}
