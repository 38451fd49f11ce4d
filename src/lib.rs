// src/lib.rs
//! T2MI / Abertis bouquet builder for enigma2 receivers running astra.
//!
//! Blocks are read from astra.conf, an analyzer run against a block's output
//! yields a log of services, and those services are merged into a per-category
//! enigma2 bouquet.

pub mod analysis;
pub mod astra;
pub mod bouquet;
pub mod constants;
pub mod error;
pub mod logging;
pub mod position;
pub mod report;
pub mod session;
pub mod settings;
pub mod types;

pub use analysis::{AnalysisLogParser, AnalyzerRunner, KindClassifier, LogStore};
pub use astra::{ConfigParser, ConfigStore, ParsedConfig};
pub use bouquet::{BouquetStore, HttpReloader, NoReload, ServiceListReloader};
pub use error::{Error, Result};
pub use session::{MergeRequest, Pipeline, Selection, select_block};
pub use settings::Settings;
pub use types::*;
