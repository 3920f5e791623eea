use std::path::PathBuf;

use anyhow::{bail, Result};
use attrcalc::{TypeCheck, DEFAULT_BATCH_FILE, DEFAULT_PROGRESS_EVERY};
use clap::Parser;

use crate::builtin::Builtin;

/// Run an attribute calculator over a batch of encoded documents and PUT
/// the results to a collector.
#[derive(Parser, Debug)]
#[command(name = "ac-runner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Two-letter language code used to build the shared vocabulary
    #[arg(value_name = "ISO2")]
    pub iso2_code: String,

    /// Collector URL the computed attributes are PUT to
    #[arg(value_name = "PAYLOAD_URL")]
    pub payload_url: String,

    /// Declared data type: INTEGER, FLOAT, BOOLEAN, CATEGORY, TEXT or EMBEDDING_LIST
    #[arg(value_name = "DATA_TYPE")]
    pub data_type: String,

    /// Batch file (JSON array of raw records)
    #[arg(short, long, env = "AC_INPUT", default_value = DEFAULT_BATCH_FILE)]
    pub input: PathBuf,

    /// Emit a progress line every N records
    #[arg(long, env = "AC_PROGRESS_EVERY", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// Built-in calculator to run
    #[arg(short, long, value_enum, env = "AC_CALCULATOR")]
    pub calculator: Option<Builtin>,

    /// Record field the built-in calculator reads
    #[arg(long, env = "AC_FIELD", default_value = "text")]
    pub field: String,

    /// External calculator command, e.g. "python3 ac_plugin.py"
    #[arg(long, env = "AC_PLUGIN_CMD", value_name = "COMMAND")]
    pub plugin_cmd: Option<String>,

    /// Sign the result payload with this HMAC secret
    #[arg(long, env = "AC_REPORT_SECRET", hide_env_values = true)]
    pub report_secret: Option<String>,
}

/// Where the calculator comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum PluginSpec {
    Builtin { kind: Builtin, field: String },
    Process { program: String, args: Vec<String> },
}

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub lang: String,
    pub payload_url: String,
    pub check: TypeCheck,
    pub input: PathBuf,
    pub progress_every: usize,
    pub plugin: PluginSpec,
    pub report_secret: Option<String>,
}

impl RunnerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        // Unknown types fail here, before the batch is even read.
        let check = TypeCheck::for_name(&cli.data_type)?;

        if !cli.payload_url.starts_with("http://") && !cli.payload_url.starts_with("https://") {
            bail!("PAYLOAD_URL must start with http:// or https://");
        }
        if cli.progress_every == 0 {
            bail!("--progress-every must be at least 1");
        }

        let plugin = match (cli.calculator, cli.plugin_cmd) {
            (Some(kind), None) => PluginSpec::Builtin { kind, field: cli.field },
            (None, Some(cmd)) => {
                let mut parts = cmd.split_whitespace().map(str::to_string);
                let Some(program) = parts.next() else {
                    bail!("--plugin-cmd is empty");
                };
                PluginSpec::Process { program, args: parts.collect() }
            }
            (Some(_), Some(_)) => bail!("pass either --calculator or --plugin-cmd, not both"),
            (None, None) => bail!("no calculator configured: pass --calculator or --plugin-cmd"),
        };

        Ok(Self {
            lang: cli.iso2_code,
            payload_url: cli.payload_url,
            check,
            input: cli.input,
            progress_every: cli.progress_every,
            plugin,
            report_secret: cli.report_secret.filter(|s| !s.is_empty()),
        })
    }
}
