//! reldata CLI: statistics over knowledge graphs stored on disk.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use reldata::config::{OutputFormat, ReldataConfig};
use reldata::data::IndividualFactory;
use reldata::io::{self, KgReader};
use reldata::stats::GraphStats;

#[derive(Parser)]
#[command(name = "reldata", version, about = "Inspect relational-learning knowledge graphs")]
struct Cli {
    /// TOML config file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print class, relation and literal statistics.
    Stats {
        /// Directory containing the graph files.
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Only process the graph with this base name.
        #[arg(long)]
        base_name: Option<String>,

        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,

        /// Read graphs one after another.
        #[arg(long)]
        sequential: bool,
    },

    /// List the graphs and graph sequences in a directory.
    List {
        /// Directory to scan.
        #[arg(long)]
        input_dir: Option<PathBuf>,
    },

    /// Show the effective configuration as TOML.
    Config {
        /// Save it to this file instead of printing it.
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<ReldataConfig> {
    match path {
        Some(path) => Ok(ReldataConfig::load(path)?),
        None => Ok(ReldataConfig::default()),
    }
}

fn run_stats(config: &ReldataConfig) -> Result<()> {
    IndividualFactory::set_check_names(config.check_names);
    let reader = KgReader::new().parallel(config.parallel);
    let dir = config.input_dir.as_path();
    let announce = config.output == OutputFormat::Table;

    let names = match &config.base_name {
        Some(base_name) => vec![base_name.clone()],
        None => io::find_knowledge_graphs(dir)?,
    };
    if names.is_empty() {
        println!("No data was found in '{}'!", dir.display());
        return Ok(());
    }
    if announce {
        for name in &names {
            println!("processing {}/{name}...", dir.display());
        }
    }

    let graphs = match &config.base_name {
        Some(base_name) => vec![(base_name.clone(), reader.read(dir, base_name)?)],
        None => reader.read_all(dir)?,
    };
    let stats = GraphStats::from_graphs(graphs.iter().map(|(_, kg)| kg));

    match config.output {
        OutputFormat::Table => print!("{}", stats.render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?),
    }
    Ok(())
}

fn run_list(dir: &Path) -> Result<()> {
    let graphs = io::find_knowledge_graphs(dir)?;
    let sequences = io::find_sequences(dir)?;
    if graphs.is_empty() && sequences.is_empty() {
        println!("No data was found in '{}'!", dir.display());
        return Ok(());
    }
    for name in &graphs {
        println!("graph     {name}");
    }
    for name in &sequences {
        println!("sequence  {name} ({} steps)", io::sequence_length(dir, name));
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Stats {
            input_dir,
            base_name,
            json,
            sequential,
        } => {
            if let Some(dir) = input_dir {
                config.input_dir = dir;
            }
            if base_name.is_some() {
                config.base_name = base_name;
            }
            if json {
                config.output = OutputFormat::Json;
            }
            if sequential {
                config.parallel = false;
            }
            run_stats(&config)?;
        }

        Commands::List { input_dir } => {
            let dir = input_dir.unwrap_or(config.input_dir);
            run_list(&dir)?;
        }

        Commands::Config { save } => match save {
            Some(path) => {
                config.save(&path)?;
                println!("Saved configuration to {}", path.display());
            }
            None => print!("{}", toml::to_string_pretty(&config).into_diagnostic()?),
        },
    }

    Ok(())
}
