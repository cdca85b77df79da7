use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::Address;
use clap::{ArgAction, Args, Parser};
use color_eyre::eyre::{Context, Result};
use explorer_data::network::{load_env, Network, NetworkProfile};
use explorer_data::types::ContractDescriptor;
use explorer_graph::render::{
    output_base, render_pdf, summary_table, write_dot, write_json,
};
use explorer_graph::{ContractGraph, ContractResolver, TraversalBudget, TraversalEngine};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "Contract Explorer";

#[derive(Parser, Debug)]
#[command(name = "contract-explorer")]
#[command(about = "Discover and graph references between EVM smart contracts")]
#[command(version)]
struct Cli {
    /// Target smart contract address.
    #[arg(short, long)]
    address: Address,

    /// Follow zero-argument address getters recursively.
    #[arg(short, long)]
    recursive: bool,

    /// Output file name; `.pdf` is stripped and re-added by the renderer.
    #[arg(short, long, default_value = "output")]
    output: String,

    #[command(flatten)]
    network: NetworkArgs,

    /// Stop after this many contracts have been resolved.
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Do not expand contracts deeper than this (the seed is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Also write the graph as `<output>.json`.
    #[arg(long)]
    json: bool,

    /// Only write the DOT file, skip the graphviz PDF conversion.
    #[arg(long)]
    no_pdf: bool,

    /// Read credentials from this file instead of `./.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,

    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,

    #[arg(long, short = 'q')]
    quiet: bool,
}

/// Exactly one network must be selected.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct NetworkArgs {
    /// Ethereum network.
    #[arg(short, long)]
    ethereum: bool,

    /// Gnosis network.
    #[arg(short, long)]
    gnosis: bool,

    /// Polygon network.
    #[arg(short, long)]
    polygon: bool,
}

impl NetworkArgs {
    fn selected(&self) -> Network {
        if self.gnosis {
            Network::Gnosis
        } else if self.polygon {
            Network::Polygon
        } else {
            Network::Ethereum
        }
    }
}

impl Cli {
    fn budget(&self) -> TraversalBudget {
        TraversalBudget {
            max_nodes: self.max_nodes,
            max_depth: self.max_depth,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    println!("-=[ {} v{} ]=-\n", APP_NAME, env!("CARGO_PKG_VERSION"));

    let env = load_env(cli.env_file.as_deref())?;
    let profile = NetworkProfile::from_env(cli.network.selected(), &env)
        .wrap_err("network configuration is incomplete")?;
    let (explorer, rpc) = profile.clients()?;

    info!(
        network = %profile.network,
        rpc_url = %profile.rpc_url,
        explorer = %explorer.endpoint(),
        poa = profile.poa,
        "network selected"
    );

    if cli.recursive {
        let chain_id = rpc
            .chain_id()
            .await
            .wrap_err("RPC endpoint is required for recursive discovery")?;
        info!(chain_id, "RPC connection successful");
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(format!("exploring {}", cli.address));
    pb.enable_steady_tick(Duration::from_millis(100));

    let observer_pb = pb.clone();
    let mut engine = TraversalEngine::new(ContractResolver::new(explorer), rpc)
        .with_budget(cli.budget())
        .with_observer(move |contract| {
            // `println` on the bar is a no-op when stderr is not a terminal.
            observer_pb.suspend(|| println!("{}", progress_line(contract)));
            observer_pb.set_message(format!("resolved {}", contract.address));
        });

    let mut graph = ContractGraph::new();
    let stats = engine
        .discover(&mut graph, cli.address, cli.recursive)
        .await
        .wrap_err("contract discovery failed")?;
    pb.finish_and_clear();

    if graph.is_empty() {
        warn!(address = %cli.address, "no verified contract found at seed address");
    } else {
        println!("{}", summary_table(&graph));
    }
    if stats.truncated {
        warn!(budget = ?engine.budget(), "traversal stopped early by budget");
    }

    let base = PathBuf::from(output_base(&cli.output));
    write_outputs(&graph, &base, cli.json, cli.no_pdf)?;

    info!(
        nodes = graph.len(),
        edges = graph.edges().len(),
        dead_ends = stats.dead_ends,
        failed_calls = stats.failed_calls,
        "explore command finished"
    );
    Ok(())
}

fn progress_line(contract: &ContractDescriptor) -> String {
    format!("[+] {} - {}", contract.address, contract.name)
}

fn write_outputs(graph: &ContractGraph, base: &Path, json: bool, no_pdf: bool) -> Result<()> {
    let dot_path = write_dot(graph, base)?;

    if json {
        let json_path = write_json(graph, base)?;
        info!(path = %json_path.display(), "JSON written");
    }

    if no_pdf {
        println!("[+] Graph rendered. Check `{}`", dot_path.display());
        return Ok(());
    }

    match render_pdf(&dot_path, base) {
        Ok(pdf_path) => println!(
            "[+] Graph rendered. Check `{}` and `{}`",
            dot_path.display(),
            pdf_path.display()
        ),
        Err(err) => {
            warn!("PDF rendering skipped: {:#}", err);
            println!("[+] Graph rendered. Check `{}`", dot_path.display());
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
