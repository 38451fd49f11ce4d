//! Constants for astra.conf resolution, analyzer logs and enigma2 bouquets

/// Bouquet line prefixes
pub const NAME_PREFIX: &str = "#NAME ";
pub const SERVICE_PREFIX: &str = "#SERVICE ";
pub const DESCRIPTION_PREFIX: &str = "#DESCRIPTION ";

/// Service reference type/flag pairs
pub const RECORD_TAG: (&str, &str) = ("1", "0");
pub const HEADER_TAG: (&str, &str) = ("1", "64");

/// Service type digit in a record descriptor
pub const SERVICE_TYPE_TV: u8 = 1;
pub const SERVICE_TYPE_RADIO: u8 = 2;

/// Fields before the url/label tail of a descriptor
pub const DESCRIPTOR_FIXED_FIELDS: usize = 10;

/// Used when the tuned frequency is unknown (0 MHz)
pub const FALLBACK_TSID_HEX: &str = "1";
/// Used when the marker id carries no leading digits
pub const FALLBACK_ONID_HEX: &str = "1";

/// Index file and its header when created from scratch
pub const INDEX_FILE: &str = "bouquets.tv";
pub const INDEX_HEADER: &str = "#NAME User - bouquets (TV)";

/// Provider placeholder for records whose provider marker carried no value
pub const UNKNOWN_PROVIDER: &str = "N/A";

/// Analyzer output lines worth keeping
pub const ANALYZER_LINE_TAG: &str = "INFO:";

/// Default analyzer log markers (one capture group each)
pub const DEFAULT_ID_PATTERN: &str = r"(?i)\bsid:\s*(\d+)";
pub const DEFAULT_NAME_PATTERN: &str = r"(?i)\bservice:\s*(.*)$";
pub const DEFAULT_PROVIDER_PATTERN: &str = r"(?i)\bprovider:\s*(.*)$";

/// Keywords that mark a service as radio (case-insensitive substring)
pub const DEFAULT_RADIO_KEYWORDS: &[&str] = &["radio", "rádio", "radyo", "радио", " fm", "fm "];

/// Output urls containing this are candidates for pass-through blocks
pub const DEFAULT_PASS_THROUGH_MARKER: &str = "abertis";

/// Transform format that marks a pass-through channel
pub const PIPE_FORMAT: &str = "pipe";

/// Wildcard bind address rewritten before handing an output url to the analyzer
pub const WILDCARD_HOST: &str = "0.0.0.0";
pub const LOOPBACK_HOST: &str = "127.0.0.1";
