use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use astra_bouquet::astra::writer::{self, NewDecap, NewPassThrough};
use astra_bouquet::logging::init_logging;
use astra_bouquet::position::satellite_name;
use astra_bouquet::report::Reporter;
use astra_bouquet::{
    AnalyzerRunner, ConfigParser, ConfigStore, LogStore, MergeRequest, Pipeline, Settings, TuningContext,
    select_block,
};

#[derive(Parser)]
#[clap(name = "astra-bouquet", version, about = "Build enigma2 bouquets from astra T2MI / Abertis blocks")]
struct Opt {
    /// Settings file (TOML); missing file means defaults
    #[clap(long, default_value = "/etc/enigma2/astra-bouquet.toml")]
    config: PathBuf,

    /// Print JSON instead of text
    #[clap(long, default_value_t = false)]
    json: bool,

    /// Debug logging
    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List selectable blocks from astra.conf
    Blocks,

    /// Run the analyzer against a block's output and save the log
    Analyze {
        /// Block label (`4095 - Ch1`) or key
        block: String,

        /// Override the configured run time in seconds
        #[clap(long)]
        seconds: Option<u64>,

        /// Print the log without saving it
        #[clap(long, default_value_t = false)]
        no_save: bool,
    },

    /// Show the services found in a saved log
    Services {
        /// Log file name (or path)
        log: String,
    },

    /// List saved analyzer logs, newest first
    Logs,

    /// Delete a saved analyzer log
    RmLog { log: String },

    /// Merge a log's services into the block's bouquet
    Merge {
        block: String,
        log: String,

        /// Tuned frequency in MHz
        #[clap(long, default_value_t = 0)]
        frequency: u32,

        /// enigma2 orbital position (tenths of a degree, 0-3599)
        #[clap(long, conflicts_with = "satellite")]
        position: Option<i32>,

        /// Satellite label used in group titles
        #[clap(long)]
        satellite: Option<String>,
    },

    /// Append a T2MI decap and its channel to astra.conf
    AddDecap {
        #[clap(long)]
        variable: String,
        #[clap(long)]
        name: String,
        #[clap(long)]
        pid: u16,
        #[clap(long)]
        plp: Option<u8>,
        /// Source stream url
        #[clap(long)]
        input: String,
        #[clap(long)]
        output: String,
    },

    /// Append a piped pass-through channel to astra.conf
    AddPassThrough {
        #[clap(long)]
        name: String,
        #[clap(long)]
        input: String,
        #[clap(long)]
        output: String,
        /// Command the stream is piped through
        #[clap(long)]
        command: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    let settings = Settings::load(&opt.config).with_context(|| format!("loading {}", opt.config.display()))?;
    init_logging(&settings.log_level, opt.verbose);

    let config_store = ConfigStore::new(&settings.astra_conf);
    let config_parser = ConfigParser::new(&settings.pass_through_marker);
    let logs = LogStore::new(&settings.log_dir);

    match opt.command {
        Command::Blocks => {
            let parsed = config_store.parse(&config_parser)?;
            if opt.json {
                println!("{}", Reporter::blocks_json(&parsed));
            } else {
                print!("{}", Reporter::blocks_text(&parsed));
            }
        }

        Command::Analyze { block, seconds, no_save } => {
            let Some(selection) = select_block(&config_store, &config_parser, &block)? else {
                bail!("no block named {block:?} in {}", settings.astra_conf.display());
            };
            let duration = Duration::from_secs(seconds.unwrap_or(settings.analyze_seconds));
            let runner = AnalyzerRunner::new(&settings.astra_binary, duration);
            info!("Running {}", runner.command_line(&selection.block.output_url));

            let output = runner.run(&selection.block.output_url).await?;
            print!("{}", output.text());
            if !no_save {
                let path = logs.save(selection.category, &selection.block.marker_id, &output.text())?;
                eprintln!("Saved {}", path.display());
            }
        }

        Command::Services { log } => {
            let text = logs
                .read(&log)?
                .with_context(|| format!("log {log:?} not found in {}", logs.dir().display()))?;
            let services = Pipeline::from_settings(&settings)?.services(&text);
            if opt.json {
                println!("{}", Reporter::services_json(&services));
            } else {
                print!("{}", Reporter::services_text(&services));
            }
        }

        Command::Logs => {
            let entries = logs.list()?;
            if opt.json {
                println!("{}", Reporter::logs_json(&entries));
            } else {
                print!("{}", Reporter::logs_text(&entries));
            }
        }

        Command::RmLog { log } => {
            if !logs.delete(&log)? {
                bail!("log {log:?} not found in {}", logs.dir().display());
            }
        }

        Command::Merge { block, log, frequency, position, satellite } => {
            let Some(selection) = select_block(&config_store, &config_parser, &block)? else {
                bail!("no block named {block:?} in {}", settings.astra_conf.display());
            };
            let log_text = logs
                .read(&log)?
                .with_context(|| format!("log {log:?} not found in {}", logs.dir().display()))?;
            let satellite_label = match (satellite, position) {
                (Some(label), _) => label,
                (None, Some(raw)) => satellite_name(&settings.satellites_xml, raw),
                (None, None) => String::new(),
            };

            let pipeline = Pipeline::from_settings(&settings)?;
            let outcome = pipeline
                .merge(MergeRequest {
                    selection,
                    log_text,
                    tuning: TuningContext { satellite_label, frequency_mhz: frequency },
                })
                .await?;
            if opt.json {
                println!("{}", Reporter::outcome_json(&outcome));
            } else {
                print!("{}", Reporter::outcome_text(&outcome));
            }
        }

        Command::AddDecap { variable, name, pid, plp, input, output } => {
            let statement = writer::render_decap(&NewDecap {
                variable: &variable,
                name: &name,
                pid,
                plp,
                input: &input,
                output: &output,
            })?;
            config_store.append(&statement)?;
        }

        Command::AddPassThrough { name, input, output, command } => {
            let statement = writer::render_pass_through(&NewPassThrough {
                name: &name,
                input: &input,
                output: &output,
                command: &command,
            });
            config_store.append(&statement)?;
        }
    }

    Ok(())
}
