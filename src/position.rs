//! Orbital position labels for group titles

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// enigma2 reports 0..3599 tenths of a degree east; above 1800 is west
pub fn normalise(raw: i32) -> i32 {
    if raw > 1800 { raw - 3600 } else { raw }
}

/// `48` -> `4.8E`, `3300` -> `30.0W`
pub fn format_position(raw: i32) -> String {
    let pos = normalise(raw);
    if pos < 0 {
        format!("{:.1}W", f64::from(pos.abs()) / 10.0)
    } else {
        format!("{:.1}E", f64::from(pos) / 10.0)
    }
}

/// Satellite name from satellites.xml, else the formatted position
pub fn satellite_name(satellites_xml: &Path, raw: i32) -> String {
    let fallback = format_position(raw);
    let text = match fs::read_to_string(satellites_xml) {
        Ok(text) => text,
        Err(e) => {
            debug!("satellites.xml unavailable ({:?}): {}", satellites_xml, e);
            return fallback;
        }
    };
    match lookup(&text, normalise(raw)) {
        Ok(Some(name)) => name,
        Ok(None) => fallback,
        Err(e) => {
            warn!("Could not parse {:?}: {}", satellites_xml, e);
            fallback
        }
    }
}

fn lookup(xml: &str, position: i32) -> Result<Option<String>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let name = doc
        .descendants()
        .filter(|n| n.has_tag_name("sat"))
        .find(|n| n.attribute("position").and_then(|p| p.trim().parse::<i32>().ok()) == Some(position))
        .and_then(|n| n.attribute("name"))
        .map(str::to_string);
    Ok(name)
}
