//! Mailbox assertions for logmon harnesses.
//!
//! These wrap `pretty_assertions` and name the record that broke the
//! expectation, so a failing harness shows which event was wrong.

use serde_json::Value;

/// Assert that every record carries `rc == code`.
pub fn assert_all_rc(records: &[Value], code: u16) {
    for (index, record) in records.iter().enumerate() {
        pretty_assertions::assert_eq!(
            record["rc"],
            Value::from(code),
            "record {index} has an unexpected result code: {record}"
        );
    }
}

/// `(message, actualnumberofhits)` pairs in store order.
pub fn hits(records: &[Value]) -> Vec<(String, u64)> {
    records
        .iter()
        .map(|record| {
            (
                record["message"].as_str().unwrap_or_default().to_string(),
                record["actualnumberofhits"].as_u64().unwrap_or_default(),
            )
        })
        .collect()
}

/// Assert the number of records that are still unread.
#[macro_export]
macro_rules! assert_unread {
    ($records:expr, $expected:expr) => {{
        let records: &[serde_json::Value] = &$records;
        let unread = records
            .iter()
            .filter(|r| r["read"] == serde_json::Value::Bool(false))
            .count();
        if unread != $expected {
            panic!(
                "assert_unread! failed: expected {} unread records, found {}.\n  records: {:#?}",
                $expected, unread, records
            );
        }
    }};
}
