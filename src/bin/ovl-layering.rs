use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ovl-layering", version)]
struct Cli {
    /// Log resolver stages to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one frame and print the decision as JSON.
    Resolve(ResolveArgs),
    /// Emit the built-in five-layer test request.
    Pattern(PatternArgs),
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Input request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Hardware topology JSON.
    #[arg(long)]
    topology: PathBuf,

    /// Resolver configuration JSON (defaults when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the decision here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PatternArgs {
    /// Write the request here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Resolve(args) => cmd_resolve(args),
        Command::Pattern(args) => cmd_pattern(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ovl_layering=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_request_json(path: &Path) -> anyhow::Result<ovl_layering::LayeringRequest> {
    let f = File::open(path).with_context(|| format!("open request '{}'", path.display()))?;
    let r = BufReader::new(f);
    let req = serde_json::from_reader(r).with_context(|| "parse request JSON")?;
    Ok(req)
}

fn emit_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output JSON")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, text)
                .with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let mut req = read_request_json(&args.in_path)?;
    let topology = ovl_layering::StaticTopology::from_path(&args.topology)
        .with_context(|| format!("load topology '{}'", args.topology.display()))?;
    let cfg = match &args.config {
        Some(path) => ovl_layering::LayeringConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => ovl_layering::LayeringConfig::default(),
    };

    let resolver = ovl_layering::Resolver::with_topology(cfg, Arc::new(topology))?;
    let decision = resolver.resolve(&mut req).context("resolve frame")?;
    emit_json(&decision, args.out.as_deref())
}

fn cmd_pattern(args: PatternArgs) -> anyhow::Result<()> {
    emit_json(&ovl_layering::test_pattern(), args.out.as_deref())
}
