//! Report generation for the command-line front-end

use serde::Serialize;

use crate::analysis::logs::LogEntry;
use crate::astra::ParsedConfig;
use crate::types::{BlockNamespace, DiscoveredService, MergeOutcome};

/// JSON structure for selectable blocks (internal serialization)
#[derive(Serialize)]
struct BlockJson<'a> {
    label: String,
    key: &'a str,
    namespace: BlockNamespace,
    marker_id: &'a str,
    display_name: &'a str,
    output_url: &'a str,
}

/// JSON structure for the blocks listing (internal serialization)
#[derive(Serialize)]
struct BlocksJson<'a> {
    blocks: Vec<BlockJson<'a>>,
    /// Decaps that never received a channel output
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dangling: Vec<&'a str>,
}

#[derive(Serialize)]
struct ServicesJson<'a> {
    count: usize,
    services: &'a [DiscoveredService],
}

/// Renders results as pretty JSON or plain text
pub struct Reporter;

impl Reporter {
    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{\"error\": \"JSON serialization failed\"}".to_string())
    }

    pub fn blocks_json(config: &ParsedConfig) -> String {
        let blocks = config
            .selectable()
            .map(|b| BlockJson {
                label: b.label(),
                key: &b.key,
                namespace: b.namespace,
                marker_id: &b.marker_id,
                display_name: &b.display_name,
                output_url: &b.output_url,
            })
            .collect();
        let dangling = config
            .decap_blocks
            .values()
            .filter(|d| !config.decap_routed.contains_key(&d.variable_name))
            .map(|d| d.variable_name.as_str())
            .collect();
        Self::to_json(&BlocksJson { blocks, dangling })
    }

    pub fn blocks_text(config: &ParsedConfig) -> String {
        if config.is_empty() {
            return "No blocks available\n".to_string();
        }
        let mut out = String::new();
        for block in config.selectable() {
            let tag = match block.namespace {
                BlockNamespace::Decap => "T2MI",
                BlockNamespace::PassThrough => "Abertis",
            };
            out.push_str(&format!("[{tag}] {}  ->  {}\n", block.label(), block.output_url));
        }
        out
    }

    pub fn services_json(services: &[DiscoveredService]) -> String {
        Self::to_json(&ServicesJson {
            count: services.len(),
            services,
        })
    }

    pub fn services_text(services: &[DiscoveredService]) -> String {
        if services.is_empty() {
            return "No services found\n".to_string();
        }
        services
            .iter()
            .map(|s| format!("{:>5}  {:<5}  {}  ({})\n", s.service_id, s.kind.to_string(), s.name, s.provider))
            .collect()
    }

    pub fn logs_json(logs: &[LogEntry]) -> String {
        Self::to_json(&logs)
    }

    pub fn logs_text(logs: &[LogEntry]) -> String {
        if logs.is_empty() {
            return "No saved logs\n".to_string();
        }
        logs.iter()
            .map(|l| {
                let when = l
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                format!("{when}  {:>8}  {}\n", l.size, l.name)
            })
            .collect()
    }

    pub fn outcome_json(outcome: &MergeOutcome) -> String {
        Self::to_json(outcome)
    }

    pub fn outcome_text(outcome: &MergeOutcome) -> String {
        match outcome {
            MergeOutcome::NothingToDo { category } => {
                format!("No services discovered, {} left unchanged\n", category.file_name())
            }
            MergeOutcome::Written(summary) => {
                let mut text = format!(
                    "Wrote {} records to {} ({} added, {} updated{})\n",
                    summary.records_written,
                    summary.path.display(),
                    summary.added,
                    summary.updated,
                    if summary.index_updated { ", added to bouquets.tv" } else { "" }
                );
                if let Some(err) = &summary.index_error {
                    text.push_str(&format!("Warning: bouquets.tv not updated: {err}\n"));
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astra::ConfigParser;
    use crate::types::{BouquetCategory, MergeSummary, ServiceKind};
    use std::path::PathBuf;

    const CONF: &str = r#"
        decapA = make_t2mi_decap({ name = "Ch1", pid = 4095 })
        orphan = make_t2mi_decap({ name = "Lonely", pid = 4096 })
        make_channel({ input = { "t2mi://decapA" }, output = { "http://0.0.0.0:9999/out1" } })
    "#;

    #[test]
    fn test_blocks_json_lists_selectable_and_dangling() {
        let config = ConfigParser::default().parse(CONF);
        let value: serde_json::Value = serde_json::from_str(&Reporter::blocks_json(&config)).unwrap();
        assert_eq!(value["blocks"][0]["label"], "4095 - Ch1");
        assert_eq!(value["blocks"][0]["namespace"], "decap");
        assert_eq!(value["dangling"][0], "orphan");
    }

    #[test]
    fn test_blocks_text() {
        let config = ConfigParser::default().parse(CONF);
        assert_eq!(Reporter::blocks_text(&config), "[T2MI] 4095 - Ch1  ->  http://0.0.0.0:9999/out1\n");
        assert_eq!(Reporter::blocks_text(&ParsedConfig::default()), "No blocks available\n");
    }

    #[test]
    fn test_services_json_kind_names() {
        let services = vec![DiscoveredService {
            service_id: 101,
            name: "Channel One".into(),
            provider: "ProvX".into(),
            kind: ServiceKind::Tv,
        }];
        let value: serde_json::Value = serde_json::from_str(&Reporter::services_json(&services)).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["services"][0]["kind"], "TV");
    }

    #[test]
    fn test_outcome_rendering() {
        let outcome = MergeOutcome::Written(MergeSummary {
            category: BouquetCategory::T2mi,
            path: PathBuf::from("/etc/enigma2/userbouquet.ciefp_t2mi.tv"),
            records_written: 3,
            added: 1,
            updated: 2,
            index_updated: true,
            index_error: None,
        });
        let value: serde_json::Value = serde_json::from_str(&Reporter::outcome_json(&outcome)).unwrap();
        assert_eq!(value["status"], "written");
        assert_eq!(value["records_written"], 3);
        assert_eq!(
            Reporter::outcome_text(&outcome),
            "Wrote 3 records to /etc/enigma2/userbouquet.ciefp_t2mi.tv (1 added, 2 updated, added to bouquets.tv)\n"
        );

        assert!(value.get("index_error").is_none());

        let unindexed = MergeOutcome::Written(MergeSummary {
            category: BouquetCategory::T2mi,
            path: PathBuf::from("/etc/enigma2/userbouquet.ciefp_t2mi.tv"),
            records_written: 1,
            added: 1,
            updated: 0,
            index_updated: false,
            index_error: Some("permission denied".into()),
        });
        let value: serde_json::Value = serde_json::from_str(&Reporter::outcome_json(&unindexed)).unwrap();
        assert_eq!(value["index_error"], "permission denied");
        assert!(Reporter::outcome_text(&unindexed).ends_with("Warning: bouquets.tv not updated: permission denied\n"));

        let nothing = MergeOutcome::NothingToDo { category: BouquetCategory::Abertis };
        let value: serde_json::Value = serde_json::from_str(&Reporter::outcome_json(&nothing)).unwrap();
        assert_eq!(value["status"], "nothing_to_do");
        assert_eq!(value["category"], "abertis");
    }
}
