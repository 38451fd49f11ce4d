use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A named decap statement from astra.conf (`decapA = make_t2mi_decap({...})`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigBlock {
    pub variable_name: String,
    pub pid: Option<u16>,
    pub display_name: String,
    /// Attached by the first channel statement that routes this decap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// A channel (wiring) statement: one input feeding one output url
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelBlock {
    pub display_name: String,
    pub input_reference: String,
    pub output_url: String,
    pub is_pass_through: bool,
}

/// The two marker-id namespaces a resolved block can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockNamespace {
    /// Routed through a decap block, keyed by the decap variable name
    Decap,
    /// Piped straight from an input url, keyed by the input reference token
    PassThrough,
}

impl BlockNamespace {
    /// Bouquet category records from this namespace are merged into
    pub fn category(self) -> BouquetCategory {
        match self {
            BlockNamespace::Decap => BouquetCategory::T2mi,
            BlockNamespace::PassThrough => BouquetCategory::Abertis,
        }
    }
}

/// A selectable block: always carries an output url
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBlock {
    pub key: String,
    pub namespace: BlockNamespace,
    pub marker_id: String,
    pub display_name: String,
    pub output_url: String,
}

impl ResolvedBlock {
    /// Label the operator picks from, e.g. `4095 - Ch1`
    pub fn label(&self) -> String {
        format!("{} - {}", self.marker_id, self.display_name)
    }
}

/// TV or radio, decided from service keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceKind {
    #[serde(rename = "TV")]
    Tv,
    Radio,
}

impl ServiceKind {
    /// Service type digit used in bouquet descriptors
    pub fn service_type(self) -> u8 {
        match self {
            ServiceKind::Tv => crate::constants::SERVICE_TYPE_TV,
            ServiceKind::Radio => crate::constants::SERVICE_TYPE_RADIO,
        }
    }

    pub fn from_service_type(digit: u8) -> Self {
        if digit == crate::constants::SERVICE_TYPE_RADIO {
            ServiceKind::Radio
        } else {
            ServiceKind::Tv
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Tv => f.write_str("TV"),
            ServiceKind::Radio => f.write_str("Radio"),
        }
    }
}

/// One service recovered from an analyzer log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredService {
    pub service_id: u16,
    pub name: String,
    pub provider: String,
    pub kind: ServiceKind,
}

/// Merge identity: `(service_id, tsid, onid, url, label)`
pub type RecordIdentity<'a> = (u16, &'a str, &'a str, &'a str, &'a str);

/// One persisted bouquet entry (descriptor + description line pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BouquetRecord {
    pub service_id: u16,
    pub transport_stream_id_hex: String,
    pub original_network_id_hex: String,
    pub url: String,
    pub display_label: String,
    pub kind: ServiceKind,
    pub marker_id: String,
}

impl BouquetRecord {
    pub fn identity(&self) -> RecordIdentity<'_> {
        (
            self.service_id,
            &self.transport_stream_id_hex,
            &self.original_network_id_hex,
            &self.url,
            &self.display_label,
        )
    }
}

/// The two fixed bouquet files this tool maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BouquetCategory {
    T2mi,
    Abertis,
}

impl BouquetCategory {
    pub fn stem(self) -> &'static str {
        match self {
            BouquetCategory::T2mi => "ciefp_t2mi",
            BouquetCategory::Abertis => "ciefp_abertis",
        }
    }

    /// Human title used for `#NAME` and group headers
    pub fn title(self) -> &'static str {
        match self {
            BouquetCategory::T2mi => "T2MI",
            BouquetCategory::Abertis => "Abertis",
        }
    }

    pub fn file_name(self) -> String {
        format!("userbouquet.{}.tv", self.stem())
    }

    /// Prefix of saved analyzer logs for this category
    pub fn log_prefix(self) -> &'static str {
        match self {
            BouquetCategory::T2mi => "astra",
            BouquetCategory::Abertis => "abertis",
        }
    }
}

/// Tuning facts supplied by the receiver at merge time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuningContext {
    /// e.g. `Eutelsat 4.8E`; empty when unknown
    pub satellite_label: String,
    /// 0 when unknown
    pub frequency_mhz: u32,
}

/// Counters reported after a successful bouquet write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub category: BouquetCategory,
    pub path: PathBuf,
    pub records_written: usize,
    pub added: usize,
    pub updated: usize,
    pub index_updated: bool,
    /// Set when the bouquet was written but `bouquets.tv` could not be updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_error: Option<String>,
}

/// Result of a merge-and-persist request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// No services were discovered; nothing was written
    NothingToDo { category: BouquetCategory },
    Written(MergeSummary),
}
