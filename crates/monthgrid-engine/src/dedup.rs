//! Duplicate collapse for a single day bucket.
//!
//! Events synchronized from an external source can arrive as multiple
//! near-identical copies differing only in completeness: one carries the
//! URL and etag confirming remote sync, another is a bare local stub. This
//! module collapses each such group into its single most-complete
//! representative, with one deterministic priority order and no
//! date-specific carve-outs.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use monthgrid_core::PlacedEvent;

/// Grouping key for duplicate candidates.
///
/// Entries whose sync uid is shared inside the bucket group by uid; all
/// others group by the (title, start instant, calendar) identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Uid(String),
    Identity(String, i64, String),
}

/// Collapses duplicated sync copies within one day's entries.
///
/// The survivor of each group occupies the position of the group's first
/// member, so the operation is order-stable and idempotent.
pub fn dedup_day(entries: Vec<PlacedEvent>) -> Vec<PlacedEvent> {
    if entries.len() < 2 {
        return entries;
    }

    let mut uid_counts: HashMap<String, usize> = HashMap::new();
    for entry in &entries {
        if let Some(uid) = entry.event.uid.as_deref() {
            if !uid.is_empty() {
                *uid_counts.entry(uid.to_string()).or_default() += 1;
            }
        }
    }

    let mut kept: Vec<PlacedEvent> = Vec::with_capacity(entries.len());
    let mut slots: HashMap<DedupKey, usize> = HashMap::new();

    for entry in entries {
        let key = dedup_key(&entry, &uid_counts);
        match slots.entry(key) {
            Entry::Occupied(slot) => {
                let index = *slot.get();
                if challenger_wins(&kept[index], &entry) {
                    kept[index] = entry;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(entry);
            }
        }
    }

    kept
}

fn dedup_key(entry: &PlacedEvent, uid_counts: &HashMap<String, usize>) -> DedupKey {
    if let Some(uid) = entry.event.uid.as_deref() {
        if !uid.is_empty() && uid_counts.get(uid).copied().unwrap_or(0) > 1 {
            return DedupKey::Uid(uid.to_string());
        }
    }
    DedupKey::Identity(
        entry.event.title.clone(),
        entry.start_millis(),
        entry.event.calendar_id.clone(),
    )
}

/// Decides whether the challenger is the more complete copy.
///
/// Priority order: remote URL presence, etag presence, populated field
/// count, combined title+description length. Ties keep the incumbent, so a
/// second pass over already-deduplicated entries changes nothing.
fn challenger_wins(incumbent: &PlacedEvent, challenger: &PlacedEvent) -> bool {
    let a = &incumbent.event;
    let b = &challenger.event;

    if a.has_remote_url() != b.has_remote_url() {
        return b.has_remote_url();
    }
    if a.has_etag() != b.has_etag() {
        return b.has_etag();
    }
    if a.populated_field_count() != b.populated_field_count() {
        return b.populated_field_count() > a.populated_field_count();
    }
    b.text_weight() > a.text_weight()
}
