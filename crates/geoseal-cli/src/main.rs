use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// geoseal command-line interface.
#[derive(Parser)]
#[command(name = "geoseal")]
#[command(about = "Privacy-preserving authenticated spatio-textual search")]
#[command(version)]
struct Cli {
    /// Config file (TOML); defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the authenticated index and keys from a CSV dataset.
    Setup {
        /// Input CSV with id,x,y,keywords columns.
        #[arg(long)]
        csv: PathBuf,

        /// Output directory for aui.bin and keys.bin.
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// CSV field delimiter.
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Run one compute service provider.
    Serve {
        /// AUI blob to preload; can also arrive later via /load_index.
        #[arg(long)]
        aui: Option<PathBuf>,

        /// Listen port.
        #[arg(long, default_value = "8001")]
        port: u16,
    },

    /// Push an AUI blob to every CSP endpoint.
    Provision {
        /// AUI blob path.
        #[arg(long)]
        aui: PathBuf,

        /// CSP base URLs, one per party.
        #[arg(long, num_args = 1..)]
        csp: Vec<String>,
    },

    /// Plan, dispatch, combine, decrypt, and verify one query.
    Query {
        /// Query string: keywords with an optional "R: a,b,c,d" range.
        query: String,

        /// AUI blob path.
        #[arg(long)]
        aui: PathBuf,

        /// Key blob path.
        #[arg(long)]
        keys: PathBuf,

        /// CSP base URLs, one per party.
        #[arg(long, num_args = 1..)]
        csp: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Setup {
            csv,
            out_dir,
            delimiter,
        } => commands::setup(&config, &csv, &out_dir, delimiter),
        Commands::Serve { aui, port } => commands::serve(aui.as_deref(), port).await,
        Commands::Provision { aui, csp } => commands::provision(&aui, &csp).await,
        Commands::Query {
            query,
            aui,
            keys,
            csp,
        } => commands::query(&config, &query, &aui, &keys, &csp).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
