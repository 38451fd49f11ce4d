//! Analyzer log parsing.
//!
//! A log is scanned line by line for three markers (service id, name,
//! provider). The provider marker closes a record; anything pending when the
//! text ends is dropped.

pub mod classify;
pub mod logs;
pub mod runner;

use regex::Regex;
use tracing::{debug, trace};

use crate::constants::UNKNOWN_PROVIDER;
use crate::error::{Error, Result};
use crate::settings::AnalysisSettings;
use crate::types::DiscoveredService;

pub use classify::KindClassifier;
pub use logs::LogStore;
pub use runner::AnalyzerRunner;

#[derive(Debug, Clone)]
pub struct AnalysisLogParser {
    id_marker: Regex,
    name_marker: Regex,
    provider_marker: Regex,
    classifier: KindClassifier,
}

/// Record under construction
#[derive(Default)]
struct Pending {
    id: Option<u16>,
    name: Option<String>,
}

impl AnalysisLogParser {
    pub fn new(settings: &AnalysisSettings) -> Result<Self> {
        Ok(Self {
            id_marker: marker(&settings.id_pattern)?,
            name_marker: marker(&settings.name_pattern)?,
            provider_marker: marker(&settings.provider_pattern)?,
            classifier: KindClassifier::from_settings(settings),
        })
    }

    pub fn with_classifier(mut self, classifier: KindClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Services in log order
    pub fn parse(&self, text: &str) -> Vec<DiscoveredService> {
        let mut services = Vec::new();
        let mut pending = Pending::default();

        for (n, line) in text.lines().enumerate() {
            if let Some(raw) = capture(&self.id_marker, line) {
                match raw.parse::<u16>() {
                    Ok(id) => {
                        pending.id = Some(id);
                        pending.name = None;
                    }
                    Err(_) => debug!("line {}: service id {:?} out of range", n + 1, raw),
                }
            } else if let Some(name) = capture(&self.name_marker, line) {
                if pending.id.is_some() {
                    pending.name = Some(clean(name));
                } else {
                    trace!("line {}: name without a pending id", n + 1);
                }
            } else if let Some(provider) = capture(&self.provider_marker, line) {
                let (Some(service_id), Some(name)) = (pending.id, pending.name.take()) else {
                    trace!("line {}: provider without id and name", n + 1);
                    continue;
                };
                let provider = match clean(provider) {
                    p if p.is_empty() => UNKNOWN_PROVIDER.to_string(),
                    p => p,
                };
                let name = if name.is_empty() { format!("SID {service_id}") } else { name };
                let kind = self.classifier.classify(&name, &provider);
                services.push(DiscoveredService {
                    service_id,
                    name,
                    provider,
                    kind,
                });
                pending = Pending::default();
            }
        }

        if pending.id.is_some() {
            debug!("Discarding trailing partial record {:?}", pending.id);
        }
        services
    }
}

/// Markers report their value through the first capture group
fn marker(pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern)?;
    if re.captures_len() < 2 {
        return Err(Error::MarkerWithoutCapture(pattern.to_string()));
    }
    Ok(re)
}

fn capture<'t>(re: &Regex, line: &'t str) -> Option<&'t str> {
    re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn clean(value: &str) -> String {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}
