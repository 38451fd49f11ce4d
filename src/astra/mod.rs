//! astra.conf block resolution.
//!
//! Decap statements are collected into a symbol table first, then channel
//! statements either link a decap (exact variable name from a `t2mi://NAME`
//! input) or register a pass-through block keyed by the input reference token.
//! Only blocks that end up with an output url are selectable.

pub mod lexer;
pub mod parser;
pub mod store;
pub mod writer;

use std::sync::LazyLock;

use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_PASS_THROUGH_MARKER, PIPE_FORMAT};
use crate::types::{BlockNamespace, ChannelBlock, ConfigBlock, ResolvedBlock};
use parser::{Statement, Table, Value};

pub use store::ConfigStore;

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/*$").expect("static pattern"));

/// Everything recovered from one astra.conf text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    pub decap_blocks: IndexMap<String, ConfigBlock>,
    pub channels: Vec<ChannelBlock>,
    pub decap_routed: IndexMap<String, ResolvedBlock>,
    pub pass_through: IndexMap<String, ResolvedBlock>,
}

impl ParsedConfig {
    pub fn namespace(&self, ns: BlockNamespace) -> &IndexMap<String, ResolvedBlock> {
        match ns {
            BlockNamespace::Decap => &self.decap_routed,
            BlockNamespace::PassThrough => &self.pass_through,
        }
    }

    /// Decap-routed blocks first, then pass-through, each in file order
    pub fn selectable(&self) -> impl Iterator<Item = &ResolvedBlock> {
        self.decap_routed.values().chain(self.pass_through.values())
    }

    pub fn is_empty(&self) -> bool {
        self.decap_routed.is_empty() && self.pass_through.is_empty()
    }

    /// Looks a block up by operator label (`4095 - Ch1`), falling back to its key
    pub fn find(&self, label_or_key: &str) -> Option<&ResolvedBlock> {
        self.selectable()
            .find(|b| b.label() == label_or_key)
            .or_else(|| self.selectable().find(|b| b.key == label_or_key))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigParser {
    pass_through_marker: String,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THROUGH_MARKER)
    }
}

impl ConfigParser {
    pub fn new(pass_through_marker: &str) -> Self {
        Self {
            pass_through_marker: pass_through_marker.to_lowercase(),
        }
    }

    pub fn parse(&self, text: &str) -> ParsedConfig {
        let statements = parser::parse_statements(&lexer::tokenize(text));
        let mut config = ParsedConfig::default();

        for stmt in statements.iter().filter(|s| is_decap_statement(s)) {
            self.collect_decap(stmt, &mut config);
        }
        for stmt in statements.iter().filter(|s| !is_decap_statement(s)) {
            self.collect_channel(stmt, &mut config);
        }

        for block in config.decap_blocks.values() {
            match (&block.output, block.pid) {
                (Some(output), Some(pid)) => {
                    config.decap_routed.insert(
                        block.variable_name.clone(),
                        ResolvedBlock {
                            key: block.variable_name.clone(),
                            namespace: BlockNamespace::Decap,
                            marker_id: pid.to_string(),
                            display_name: block.display_name.clone(),
                            output_url: output.clone(),
                        },
                    );
                }
                (Some(_), None) => warn!("Decap '{}' has an output but no pid, not selectable", block.variable_name),
                (None, _) => debug!("Decap '{}' has no channel output", block.variable_name),
            }
        }

        debug!(
            "Parsed astra.conf: {} decaps, {} channels, {} decap-routed, {} pass-through",
            config.decap_blocks.len(),
            config.channels.len(),
            config.decap_routed.len(),
            config.pass_through.len()
        );
        config
    }

    fn collect_decap(&self, stmt: &Statement, config: &mut ParsedConfig) {
        let Some(variable) = stmt.binding.as_ref() else { return };
        let Some(name) = stmt.args.get("name").and_then(Value::as_str) else {
            debug!("line {}: decap '{}' without a name, skipped", stmt.line, variable);
            return;
        };
        let pid = stmt
            .args
            .get("pid")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok());

        match config.decap_blocks.entry(variable.clone()) {
            Entry::Occupied(_) => {
                warn!("line {}: decap '{}' defined again, keeping the first definition", stmt.line, variable);
            }
            Entry::Vacant(slot) => {
                slot.insert(ConfigBlock {
                    variable_name: variable.clone(),
                    pid,
                    display_name: name.to_string(),
                    output: None,
                });
            }
        }
    }

    fn collect_channel(&self, stmt: &Statement, config: &mut ParsedConfig) {
        let (Some(input), Some(output)) = (first_url(&stmt.args, "input"), first_url(&stmt.args, "output")) else {
            return;
        };
        let token = reference_token(input);
        let name = stmt.args.get("name").and_then(Value::as_str).unwrap_or_default();

        let is_pipe = stmt
            .args
            .get("transform")
            .and_then(Value::as_table)
            .is_some_and(|t| t.contains_str_field("format", PIPE_FORMAT));
        let has_marker = output.to_lowercase().contains(&self.pass_through_marker);

        if is_pipe && has_marker {
            let Some(marker_id) = trailing_number(output) else {
                debug!("line {}: pass-through output {} has no numeric suffix", stmt.line, output);
                return;
            };
            let display_name = if name.is_empty() { token.clone() } else { name.to_string() };
            config.channels.push(ChannelBlock {
                display_name: display_name.clone(),
                input_reference: input.to_string(),
                output_url: output.to_string(),
                is_pass_through: true,
            });
            match config.pass_through.entry(token.clone()) {
                Entry::Occupied(_) => warn!("line {}: pass-through '{}' repeated, keeping the first", stmt.line, token),
                Entry::Vacant(slot) => {
                    slot.insert(ResolvedBlock {
                        key: token,
                        namespace: BlockNamespace::PassThrough,
                        marker_id,
                        display_name,
                        output_url: output.to_string(),
                    });
                }
            }
            return;
        }

        config.channels.push(ChannelBlock {
            display_name: name.to_string(),
            input_reference: input.to_string(),
            output_url: output.to_string(),
            is_pass_through: false,
        });

        let symbol = decap_symbol(input);
        match config.decap_blocks.get_mut(symbol) {
            Some(block) if block.output.is_none() => block.output = Some(output.to_string()),
            Some(block) => warn!(
                "line {}: decap '{}' already routed to {:?}, ignoring {}",
                stmt.line, block.variable_name, block.output, output
            ),
            None => debug!("line {}: channel input {} matches no decap", stmt.line, input),
        }
    }
}

fn is_decap_statement(stmt: &Statement) -> bool {
    stmt.binding.is_some() && stmt.function.contains("decap")
}

/// `input = "url"` or `input = { "url", ... }`
fn first_url<'t>(args: &'t Table, key: &str) -> Option<&'t str> {
    match args.get(key)? {
        Value::Str(s) => Some(s),
        Value::Table(t) => t.positional().find_map(Value::as_str),
        _ => None,
    }
}

/// Last path segment of a url with colons removed
pub fn reference_token(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed).replace(':', "")
}

/// `t2mi://decapA#pnr=1` -> `decapA`
pub fn decap_symbol(input: &str) -> &str {
    let rest = input.split_once("://").map(|(_, r)| r).unwrap_or(input);
    let end = rest.find(['/', '#', '?', '&']).unwrap_or(rest.len());
    &rest[..end]
}

fn trailing_number(url: &str) -> Option<String> {
    TRAILING_DIGITS
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
