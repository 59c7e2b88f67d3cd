//! Per-cycle deduplication of match records.

use std::collections::HashMap;

use crate::types::MatchRecord;

/// Collapse records with identical content into one record whose count is
/// the sum of the group's counts, keeping first-seen order. With `enabled`
/// false the records pass through unchanged.
///
/// Because counts are summed, running the function on its own output
/// reproduces that output.
pub fn deduplicate(records: Vec<MatchRecord>, enabled: bool) -> Vec<MatchRecord> {
    if !enabled {
        return records;
    }

    let mut groups: Vec<MatchRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        match index.get(&record.content) {
            Some(&slot) => groups[slot].count += record.count,
            None => {
                index.insert(record.content.clone(), groups.len());
                groups.push(record);
            }
        }
    }
    groups
}
