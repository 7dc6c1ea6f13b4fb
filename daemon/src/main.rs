//! Chain management daemon: inspect configuration and the local mirror.

use std::path::PathBuf;

use anyhow::Context;
use chainops_node::{init_logging, NodeConfig};
use chainops_store::{ChainStore, ContractStore, LedgerStore, RelationStore, VoteStore};
use chainops_store_lmdb::{environment::DATABASE_COUNT, LmdbEnvironment};
use chainops_types::Timestamp;
use clap::Parser;

#[derive(Parser)]
#[command(name = "chainops-daemon", about = "Permissioned chain management daemon")]
struct Cli {
    /// Data directory of the mirror database.
    #[arg(long, env = "CHAINOPS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CHAINOPS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHAINOPS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CHAINOPS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Mirrored chain data.
    Mirror {
        #[command(subcommand)]
        action: MirrorAction,
    },
    /// Governance proposals.
    Proposals {
        #[command(subcommand)]
        action: ProposalsAction,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

#[derive(clap::Subcommand)]
enum MirrorAction {
    /// Summarize what is mirrored for one chain.
    Status {
        #[arg(long)]
        chain: String,
    },
}

#[derive(clap::Subcommand)]
enum ProposalsAction {
    /// List the proposals of one chain, oldest first.
    List {
        #[arg(long)]
        chain: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            NodeConfig::from_toml_file(&path)
                .with_context(|| format!("loading config file {path}"))?
        }
        None => NodeConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_mirror(config: &NodeConfig) -> anyhow::Result<LmdbEnvironment> {
    LmdbEnvironment::open(&config.data_dir, DATABASE_COUNT, config.map_size)
        .with_context(|| format!("opening mirror at {}", config.data_dir.display()))
}

fn mirror_status(store: &LmdbEnvironment, chain_id: &str) -> anyhow::Result<()> {
    let chain = store
        .get_chain(chain_id)
        .with_context(|| format!("chain {chain_id} is not mirrored"))?;
    println!("chain:        {} ({})", chain.chain_id, chain.chain_name);
    println!("status:       {:?}", chain.status);
    println!("consensus:    {}", chain.consensus);
    println!("version:      {}", chain.version);
    println!("sequence:     {}", chain.sequence);
    println!(
        "block:        capacity {} / interval {}ms / tx timeout {}s",
        chain.block_tx_capacity, chain.block_interval, chain.tx_timeout
    );
    match store.max_block_height(chain_id)? {
        Some(height) => println!("height:       {height}"),
        None => println!("height:       (no blocks)"),
    }
    println!("transactions: {}", store.transaction_count(chain_id)?);
    println!("orgs:         {}", store.chain_orgs(chain_id)?.len());
    println!("nodes:        {}", store.chain_org_nodes(chain_id)?.len());
    println!("contracts:    {}", store.list_contracts(chain_id)?.len());
    if let Some(record) = store.latest_config_record(chain_id, Timestamp::now())? {
        println!(
            "last config:  height {} at {}",
            record.height, record.timestamp
        );
    }
    Ok(())
}

fn list_proposals(store: &LmdbEnvironment, chain_id: &str) -> anyhow::Result<()> {
    let proposals = store.list_proposals(chain_id)?;
    if proposals.is_empty() {
        println!("no proposals for chain {chain_id}");
        return Ok(());
    }
    for proposal in proposals {
        let outcome = proposal
            .outcome
            .as_ref()
            .map(|o| format!("{o:?}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {:?}  {}  [{}]",
            proposal.multi_id, proposal.resource, proposal.status, proposal.description, outcome
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;

    match &cli.command {
        Command::Config {
            action: ConfigAction::Show,
        } => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Mirror {
            action: MirrorAction::Status { chain },
        } => {
            let store = open_mirror(&config)?;
            tracing::debug!(chain = %chain, "reading mirror status");
            mirror_status(&store, chain)?;
        }
        Command::Proposals {
            action: ProposalsAction::List { chain },
        } => {
            let store = open_mirror(&config)?;
            list_proposals(&store, chain)?;
        }
    }

    Ok(())
}
