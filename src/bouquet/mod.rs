//! Bouquet merge engine.
//!
//! Discovered services become candidate records, are merged into the existing
//! set by identity, then regrouped under one header per marker id and written
//! back as a whole file.

pub mod index;
pub mod record;
pub mod reload;
pub mod store;

use std::cmp::Ordering;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::constants::{FALLBACK_ONID_HEX, FALLBACK_TSID_HEX, NAME_PREFIX};
use crate::types::{BouquetCategory, BouquetRecord, DiscoveredService, TuningContext};
use record::{header_marker, write_header, write_record};

pub use record::{BouquetFile, parse_bouquet};
pub use reload::{HttpReloader, NoReload, ServiceListReloader};
pub use store::BouquetStore;

/// Records sharing one marker id, in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub marker_id: String,
    pub title: String,
    pub records: Vec<BouquetRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub added: usize,
    pub updated: usize,
}

/// Upper-case hex of the tuned frequency in MHz
pub fn transport_stream_id_hex(frequency_mhz: u32) -> String {
    if frequency_mhz == 0 {
        FALLBACK_TSID_HEX.to_string()
    } else {
        format!("{frequency_mhz:X}")
    }
}

fn leading_number(marker_id: &str) -> Option<u64> {
    let end = marker_id
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(marker_id.len());
    marker_id[..end].parse().ok()
}

/// Upper-case hex of the marker id's leading digits
pub fn original_network_id_hex(marker_id: &str) -> String {
    match leading_number(marker_id) {
        Some(n) => format!("{n:X}"),
        None => FALLBACK_ONID_HEX.to_string(),
    }
}

/// `Channel One - TV (4095)`; a blank name is replaced by `SID <id>`.
/// The label is stored trimmed, the way the bouquet reader returns it.
pub fn display_label(service: &DiscoveredService, marker_id: &str) -> String {
    let name = service.name.trim();
    let label = if name.is_empty() {
        format!("SID {} - {} ({})", service.service_id, service.kind, marker_id.trim())
    } else {
        format!("{} - {} ({})", name, service.kind, marker_id.trim())
    };
    label.trim().to_string()
}

pub fn candidate_record(
    service: &DiscoveredService,
    marker_id: &str,
    output_url: &str,
    tuning: &TuningContext,
) -> BouquetRecord {
    BouquetRecord {
        service_id: service.service_id,
        transport_stream_id_hex: transport_stream_id_hex(tuning.frequency_mhz),
        original_network_id_hex: original_network_id_hex(marker_id),
        url: output_url.to_string(),
        display_label: display_label(service, marker_id),
        kind: service.kind,
        marker_id: marker_id.to_string(),
    }
}

/// Matching identity updates kind and marker in place; anything else is appended
pub fn merge_records(existing: &mut Vec<BouquetRecord>, candidates: Vec<BouquetRecord>) -> MergeCounts {
    let mut counts = MergeCounts::default();
    for candidate in candidates {
        match existing.iter_mut().find(|r| r.identity() == candidate.identity()) {
            Some(current) => {
                current.kind = candidate.kind;
                current.marker_id = candidate.marker_id;
                counts.updated += 1;
            }
            None => {
                existing.push(candidate);
                counts.added += 1;
            }
        }
    }
    counts
}

/// Numeric by leading digits, then lexical; ids without digits go last
pub fn compare_markers(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// `[<satellite> ]<Category> <marker>`
pub fn group_title(category: BouquetCategory, satellite_label: &str, marker_id: &str) -> String {
    let satellite_label = satellite_label.trim();
    if satellite_label.is_empty() {
        format!("{} {}", category.title(), marker_id)
    } else {
        format!("{} {} {}", satellite_label, category.title(), marker_id)
    }
}

/// One group per marker id, sorted; records inside sorted by service id.
///
/// A group keeps its existing title unless it is in `refreshed`, in which case
/// the title is rebuilt from the current satellite label.
pub fn group_records(
    category: BouquetCategory,
    records: Vec<BouquetRecord>,
    existing_titles: &IndexMap<String, String>,
    refreshed: &HashSet<String>,
    satellite_label: &str,
) -> Vec<Group> {
    let mut by_marker: IndexMap<String, Vec<BouquetRecord>> = IndexMap::new();
    for record in records {
        by_marker.entry(record.marker_id.clone()).or_default().push(record);
    }

    let mut groups: Vec<Group> = by_marker
        .into_iter()
        .map(|(marker_id, mut records)| {
            records.sort_by(|a, b| {
                a.service_id
                    .cmp(&b.service_id)
                    .then_with(|| a.display_label.cmp(&b.display_label))
            });
            let title = match existing_titles.get(&marker_id) {
                Some(title) if !refreshed.contains(&marker_id) && header_marker(title) == Some(marker_id.as_str()) => {
                    title.clone()
                }
                _ => group_title(category, satellite_label, &marker_id),
            };
            Group { marker_id, title, records }
        })
        .collect();

    groups.sort_by(|a, b| compare_markers(&a.marker_id, &b.marker_id));
    groups
}

/// Whole-file text: name line, then each group's header and records
pub fn serialize_bouquet(name: &str, groups: &[Group]) -> String {
    let mut out = format!("{NAME_PREFIX}{name}\n");
    for (idx, group) in groups.iter().enumerate() {
        write_header(&mut out, idx + 1, &group.title);
        for record in &group.records {
            write_record(&mut out, record);
        }
    }
    out
}
