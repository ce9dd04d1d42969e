#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use modlens_core::ResolverConfig;
use std::path::PathBuf;

use commands::ResolveArgs;

#[derive(Parser, Debug)]
#[command(name = "modlens")]
#[command(author, version, about = "Resolve module specifiers and inspect imports/exports", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (default resolution anchor)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve a specifier to its canonical location
    Resolve {
        specifier: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Print a filesystem path instead of a URL
        #[arg(long)]
        path: bool,
    },

    /// List static, dynamic and type imports
    Imports {
        /// File or directory to scan
        path: PathBuf,
    },

    /// List export declarations
    Exports {
        /// File or directory to scan
        path: PathBuf,

        /// List type-only exports instead
        #[arg(long)]
        types: bool,

        /// Print exported names only
        #[arg(long)]
        names: bool,
    },

    /// Names a module exports, following `export * from` chains
    ExportNames {
        specifier: String,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Detect ESM and CommonJS syntax
    Syntax {
        /// File or directory to scan
        path: PathBuf,

        /// Ignore code inside comments
        #[arg(long)]
        strip_comments: bool,
    },

    /// Check whether Node can import a module without a loader
    Check {
        specifier: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Allowed protocols (default: node, file, data)
        #[arg(long = "allow-protocol", value_name = "PROTOCOL")]
        allow_protocols: Vec<String>,
    },

    /// Find the package subpath that exports a file
    Subpath {
        /// Path or file URL inside node_modules
        path: String,
    },

    /// Rewrite import specifiers to resolved locations
    Rewrite {
        file: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = ResolverConfig::new(cwd.clone());
    let json = cli.json;

    tracing::debug!(cwd = %cwd.display(), command = ?cli.command, "starting");

    match cli.command {
        Commands::Resolve {
            specifier,
            resolve,
            path,
        } => commands::resolve::run(config, &specifier, &resolve, path, json),
        Commands::Imports { path } => commands::imports::run(&cwd.join(path), json),
        Commands::Exports { path, types, names } => {
            commands::exports::run(&cwd.join(path), types, names, json)
        }
        Commands::ExportNames { specifier, resolve } => {
            commands::exports::run_names(config, &specifier, &resolve, json)
        }
        Commands::Syntax {
            path,
            strip_comments,
        } => commands::syntax::run(&cwd.join(path), strip_comments, json),
        Commands::Check {
            specifier,
            resolve,
            allow_protocols,
        } => commands::check::run(config, &specifier, &resolve, allow_protocols, json),
        Commands::Subpath { path } => commands::subpath::run(&path, json),
        Commands::Rewrite { file, resolve } => {
            commands::rewrite::run(config, &cwd.join(file), &resolve, json)
        }
    }
}
