use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::{json, Value as JsonValue};

use mergemine_core::ProtocolParams;
use mergemine_root::{parse_json_args, replay, MergeMiningContract, MergeMiningView, ReplayCall};
use mergemine_state::MemoryStorage;
use mergemine_vm::abi::encode_by_name;
use mergemine_vm::METHODS;

#[derive(Parser)]
#[command(name = "mergemine")]
#[command(about = "Merge-mining contract replay and encoding tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON list of calls to a fresh in-memory contract
    Replay {
        /// Protocol parameters (TOML, YAML or JSON)
        #[arg(long)]
        params: PathBuf,

        /// JSON array of calls
        #[arg(long)]
        calls: PathBuf,
    },

    /// List every method with its signature and selector
    Selectors,

    /// Encode a call payload
    Encode {
        method: String,

        /// JSON array of arguments in method-table order
        #[arg(default_value = "[]")]
        args: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { params, calls } => run_replay(params, calls),
        Commands::Selectors => {
            for method in METHODS.iter() {
                println!("0x{}  {}", hex::encode(method.selector()), method.signature());
            }
            Ok(())
        }
        Commands::Encode { method, args } => {
            let args: Vec<JsonValue> = serde_json::from_str(&args).context("arguments must be a JSON array")?;
            let values = parse_json_args(&method, &args)?;
            let payload = encode_by_name(&method, &values)?;
            println!("0x{}", hex::encode(payload));
            Ok(())
        }
    }
}

fn run_replay(params_path: PathBuf, calls_path: PathBuf) -> Result<()> {
    let params = ProtocolParams::from_file(&params_path)
        .with_context(|| format!("loading parameters from {}", params_path.display()))?;
    let raw = fs::read_to_string(&calls_path).with_context(|| format!("reading {}", calls_path.display()))?;
    let calls: Vec<ReplayCall> = serde_json::from_str(&raw).context("parsing replay calls")?;
    if calls.is_empty() {
        bail!("{} contains no calls", calls_path.display());
    }

    let contract = MergeMiningContract::new(params)?;
    let mut storage = MemoryStorage::new();
    info!("Replaying {} calls from {}", calls.len(), calls_path.display());
    let summary = replay(&contract, &mut storage, &calls)?;

    let view = MergeMiningView::new(&storage, contract.params());
    let report = json!({
        "records": summary.records,
        "header_chain": summary.header_chain,
        "share_chains": view.share_chains()?,
        "time_challenges": view.time_challenges()?,
        "administrator": view.merge_mining_info()?.administrator,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
