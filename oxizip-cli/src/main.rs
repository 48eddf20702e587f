//! OxiZip CLI - list, extract, test and create ZIP archives.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{ExtractOptions, ListOptions, cmd_create, cmd_extract, cmd_list, cmd_test};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "oxizip")]
#[command(author, version, about = "Pure Rust ZIP reader with a streaming DEFLATE decoder")]
#[command(long_about = "
OxiZip reads ZIP and zip64 archives and decodes stored and DEFLATE entries
without any external compression library. Archives it creates are stored
(uncompressed).

Examples:
  oxizip list archive.zip
  oxizip list -v archive.zip
  oxizip extract archive.zip -o out/
  oxizip extract archive.zip docs/readme.txt --stdout
  oxizip test archive.zip
  oxizip create archive.zip file1.txt dir/
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show offsets, sizes and modification times
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only files matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Files to extract (all if empty)
        files: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Write file contents to standard output
        #[arg(short = 'p', long)]
        stdout: bool,

        /// Include only files matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Decoder history window in bytes
        #[arg(long, default_value_t = oxizip_deflate::window::DEFLATE_WINDOW_SIZE)]
        window_size: usize,

        /// Input buffer size in bytes
        #[arg(long, default_value_t = oxizip_core::bitstream::DEFAULT_INPUT_BUFFER_SIZE)]
        buffer_size: usize,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decode every entry and check its size
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Create a new archive of stored entries
    #[command(alias = "c")]
    Create {
        /// Output archive file
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            archive,
            verbose,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            files,
            output,
            stdout,
            include,
            exclude,
            window_size,
            buffer_size,
            verbose,
            progress,
        } => cmd_extract(
            &archive,
            &ExtractOptions {
                output: &output,
                files: &files,
                include: &include,
                exclude: &exclude,
                stdout,
                window_size,
                buffer_size,
                verbose,
                progress,
            },
        ),
        Commands::Test { archive, verbose } => cmd_test(&archive, verbose),
        Commands::Create {
            archive,
            files,
            verbose,
        } => cmd_create(&archive, &files, verbose),
    };

    if let Err(e) = result {
        eprintln!("oxizip: {}", e);
        std::process::exit(1);
    }
}
