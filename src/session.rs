//! Selection and merge requests.
//!
//! Picking a block and merging a log are two separate operator actions. The
//! selection made by the first is carried into the second as a value instead
//! of living on a long-lived object.

use tracing::{info, warn};

use crate::analysis::AnalysisLogParser;
use crate::astra::{ConfigParser, ConfigStore};
use crate::bouquet::{BouquetStore, ServiceListReloader, reload};
use crate::error::Result;
use crate::settings::Settings;
use crate::types::{BouquetCategory, DiscoveredService, MergeOutcome, ResolvedBlock, TuningContext};

/// A block the operator picked, with the bouquet it feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub block: ResolvedBlock,
    pub category: BouquetCategory,
}

impl Selection {
    pub fn new(block: ResolvedBlock) -> Self {
        let category = block.namespace.category();
        Self { block, category }
    }
}

/// Looks up a block by label or key in the current astra.conf
pub fn select_block(store: &ConfigStore, parser: &ConfigParser, label_or_key: &str) -> Result<Option<Selection>> {
    let parsed = store.parse(parser)?;
    Ok(parsed.find(label_or_key).cloned().map(Selection::new))
}

pub struct MergeRequest {
    pub selection: Selection,
    pub log_text: String,
    pub tuning: TuningContext,
}

pub struct Pipeline {
    log_parser: AnalysisLogParser,
    bouquets: BouquetStore,
    reloader: Box<dyn ServiceListReloader>,
}

impl Pipeline {
    pub fn new(log_parser: AnalysisLogParser, bouquets: BouquetStore, reloader: Box<dyn ServiceListReloader>) -> Self {
        Self {
            log_parser,
            bouquets,
            reloader,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            AnalysisLogParser::new(&settings.analysis)?,
            BouquetStore::new(&settings.bouquet_dir),
            reload::reloader_for(&settings.reload_url)?,
        ))
    }

    pub fn services(&self, log_text: &str) -> Vec<DiscoveredService> {
        self.log_parser.parse(log_text)
    }

    /// Parse the log, merge into the selection's bouquet, then ask for a reload.
    /// A failed reload is logged and does not change the outcome.
    pub async fn merge(&self, request: MergeRequest) -> Result<MergeOutcome> {
        let services = self.services(&request.log_text);
        let Selection { block, category } = &request.selection;
        info!("Merging {} services from block {}", services.len(), block.label());

        let outcome = self.bouquets.merge_and_persist(
            *category,
            &services,
            &block.marker_id,
            &block.output_url,
            &request.tuning,
        )?;

        if let MergeOutcome::Written(_) = outcome {
            if let Err(e) = self.reloader.reload().await {
                warn!("Bouquet written but reload failed: {}", e);
            }
        }
        Ok(outcome)
    }
}
