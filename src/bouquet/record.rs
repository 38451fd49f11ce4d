// bouquet/record.rs
//! enigma2 bouquet line pairs.
//!
//! Every entry is a `#SERVICE` descriptor followed by an optional
//! `#DESCRIPTION`. Descriptors tagged `1:0` are stream records, `1:64` are
//! group headers (markers). Colons inside the url are written as `%3a`.

use indexmap::IndexMap;
use tracing::debug;

use crate::constants::*;
use crate::types::{BouquetRecord, ServiceKind};

/// Parsed contents of one bouquet file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BouquetFile {
    /// `#NAME` line, when present
    pub name: Option<String>,
    /// marker id -> group title, in file order
    pub headers: IndexMap<String, String>,
    pub records: Vec<BouquetRecord>,
}

enum Entry {
    Header(String),
    Record(BouquetRecord),
}

fn encode_url(url: &str) -> String {
    url.replace(':', "%3a")
}

fn decode_url(url: &str) -> String {
    url.replace("%3a", ":").replace("%3A", ":")
}

pub fn write_record(out: &mut String, record: &BouquetRecord) {
    out.push_str(&format!(
        "{}{}:{}:{}:{:X}:{}:{}:0:0:0:0:{}:{}\n",
        SERVICE_PREFIX,
        RECORD_TAG.0,
        RECORD_TAG.1,
        record.kind.service_type(),
        record.service_id,
        record.transport_stream_id_hex,
        record.original_network_id_hex,
        encode_url(&record.url),
        record.display_label
    ));
    out.push_str(&format!("{}{}\n", DESCRIPTION_PREFIX, record.display_label));
}

/// Group header; `number` is the 1-based position of the group in the file
pub fn write_header(out: &mut String, number: usize, title: &str) {
    out.push_str(&format!(
        "{}{}:{}:{}:0:0:0:0:0:0:0::{}\n",
        SERVICE_PREFIX, HEADER_TAG.0, HEADER_TAG.1, number, title
    ));
    out.push_str(&format!("{}{}\n", DESCRIPTION_PREFIX, title));
}

/// Marker id carried by a group title: its last whitespace-separated token
pub fn header_marker(title: &str) -> Option<&str> {
    title.split_whitespace().last()
}

fn hex_field(raw: &str) -> Option<String> {
    let raw = raw.trim();
    u64::from_str_radix(raw, 16).ok()?;
    let digits = raw.trim_start_matches('0').to_uppercase();
    Some(if digits.is_empty() { "0".to_string() } else { digits })
}

/// Descriptor payload (text after `#SERVICE `) plus its description line
fn parse_entry(payload: &str, description: Option<&str>, current_marker: Option<&str>) -> Option<Entry> {
    let fields: Vec<&str> = payload.splitn(DESCRIPTOR_FIXED_FIELDS + 2, ':').collect();
    if fields.len() < DESCRIPTOR_FIXED_FIELDS + 1 {
        return None;
    }
    let tail_label = fields.get(DESCRIPTOR_FIXED_FIELDS + 1).map(|s| s.trim()).unwrap_or_default();
    let label = if tail_label.is_empty() {
        description.map(str::trim).unwrap_or_default()
    } else {
        tail_label
    };

    if (fields[0], fields[1]) == HEADER_TAG {
        return Some(Entry::Header(label.to_string()));
    }
    if (fields[0], fields[1]) != RECORD_TAG {
        return None;
    }

    let kind = ServiceKind::from_service_type(fields[2].trim().parse().ok()?);
    let service_id = u16::from_str_radix(fields[3].trim(), 16).ok()?;
    let transport_stream_id_hex = hex_field(fields[4])?;
    let original_network_id_hex = hex_field(fields[5])?;
    let url = decode_url(fields[DESCRIPTOR_FIXED_FIELDS]);
    if url.is_empty() || label.is_empty() {
        return None;
    }

    let marker_id = match current_marker {
        Some(marker) => marker.to_string(),
        None => u64::from_str_radix(&original_network_id_hex, 16).ok()?.to_string(),
    };

    Some(Entry::Record(BouquetRecord {
        service_id,
        transport_stream_id_hex,
        original_network_id_hex,
        url,
        display_label: label.to_string(),
        kind,
        marker_id,
    }))
}

/// Reads every well-formed entry; anything else is skipped
pub fn parse_bouquet(text: &str) -> BouquetFile {
    let mut file = BouquetFile::default();
    let mut current_marker: Option<String> = None;
    let mut lines = text.lines().map(str::trim_end).enumerate().peekable();

    while let Some((n, line)) = lines.next() {
        if let Some(name) = line.strip_prefix(NAME_PREFIX) {
            if file.name.is_none() {
                file.name = Some(name.trim().to_string());
            }
            continue;
        }
        let Some(payload) = line.strip_prefix(SERVICE_PREFIX) else {
            continue;
        };
        let description = lines
            .peek()
            .and_then(|(_, next)| next.strip_prefix(DESCRIPTION_PREFIX).map(str::to_string));
        if description.is_some() {
            lines.next();
        }

        match parse_entry(payload, description.as_deref(), current_marker.as_deref()) {
            Some(Entry::Header(title)) => match header_marker(&title) {
                Some(marker) => {
                    let marker = marker.to_string();
                    file.headers.entry(marker.clone()).or_insert(title);
                    current_marker = Some(marker);
                }
                None => {
                    debug!("line {}: empty group header", n + 1);
                    current_marker = None;
                }
            },
            Some(Entry::Record(record)) => file.records.push(record),
            None => debug!("line {}: malformed bouquet entry skipped", n + 1),
        }
    }
    file
}
