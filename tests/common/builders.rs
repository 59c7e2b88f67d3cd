//! Test builders for monitor and read-format documents.
//!
//! These produce YAML text for readability in harnesses. They panic on
//! invalid input rather than returning `Result`.

// ---------------------------------------------------------------------------
// SpecBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for one entry of a monitor document.
///
/// # Example
///
/// ```rust
/// let doc = monitor_document(&[
///     SpecBuilder::new("app", "/var/log/app\\.log")
///         .deduplicate(true)
///         .pattern("substring", "ERROR"),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    logical_name: String,
    file_name: String,
    instance: String,
    event_type: Option<String>,
    read_type: String,
    deduplicate: bool,
    responsible: String,
    field1: Option<String>,
    patterns: Vec<(String, String, Option<String>)>,
}

impl SpecBuilder {
    pub fn new(logical_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            file_name: file_name.into(),
            instance: "host1".to_string(),
            event_type: Some("AppLog".to_string()),
            read_type: "incremental".to_string(),
            deduplicate: false,
            responsible: "ops-team".to_string(),
            field1: None,
            patterns: Vec::new(),
        }
    }

    pub fn full(mut self) -> Self {
        self.read_type = "full".to_string();
        self
    }

    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn field1(mut self, value: impl Into<String>) -> Self {
        self.field1 = Some(value.into());
        self
    }

    pub fn without_event_type(mut self) -> Self {
        self.event_type = None;
        self
    }

    pub fn pattern(mut self, match_type: &str, search: &str) -> Self {
        self.patterns
            .push((match_type.to_string(), search.to_string(), None));
        self
    }

    pub fn pattern_with_severity(mut self, match_type: &str, search: &str, severity: &str) -> Self {
        self.patterns.push((
            match_type.to_string(),
            search.to_string(),
            Some(severity.to_string()),
        ));
        self
    }

    fn to_yaml(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("- logicalname: {}\n", quote(&self.logical_name)));
        out.push_str(&format!("  instance: {}\n", quote(&self.instance)));
        out.push_str(&format!("  logfilename: {}\n", quote(&self.file_name)));
        if let Some(event_type) = &self.event_type {
            out.push_str(&format!("  eventtype: {}\n", quote(event_type)));
        }
        out.push_str(&format!("  readtype: {}\n", self.read_type));
        out.push_str("  rotation: N\n");
        out.push_str(&format!(
            "  deduplicate: {}\n",
            if self.deduplicate { "Y" } else { "N" }
        ));
        out.push_str(&format!("  responsible: {}\n", quote(&self.responsible)));
        if let Some(field1) = &self.field1 {
            out.push_str(&format!("  logfield1: {}\n", quote(field1)));
        }
        out.push_str("  patternmatch:\n");
        for (match_type, search, severity) in &self.patterns {
            out.push_str(&format!("    - patternsearch: {}\n", quote(search)));
            out.push_str(&format!("      matchtype: {match_type}\n"));
            if let Some(severity) = severity {
                out.push_str(&format!("      severity: {}\n", quote(severity)));
            }
        }
        out
    }
}

/// Single-quoted YAML scalar; backslashes stay literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a whole monitor document.
pub fn monitor_document(specs: &[SpecBuilder]) -> String {
    specs.iter().map(SpecBuilder::to_yaml).collect()
}

/// Render a read-format document.
pub fn read_format_document(separator: &str, fields: &[&str]) -> String {
    format!(
        "separator: {}\nfields: {}\n",
        quote(separator),
        quote(&fields.join(" "))
    )
}
