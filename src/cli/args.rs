//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--config <path>`: Read this config file instead of searching
//! - `--db <file>`: Store document to open
//! - `--data-dir <dir>`: Directory for the commit log and tags
//! - `--author <name>`: Author recorded on commits
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Errors only

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Verdant - a versioned key-value store with branches, merges and tags
#[derive(Parser, Debug)]
#[command(name = "vdb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to read instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store document to open
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Directory holding the commit log and tags
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Author recorded on commits
    #[arg(long, global = true, value_name = "NAME")]
    pub author: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive shell (the default)
    Repl,

    /// Accept relayed commits over TCP
    #[command(
        after_help = "\
PROTOCOL:
    Each connection sends one line \"commit <message>\" and receives
    \"Commit received\" or \"Invalid command\" before the server closes it."
    )]
    Serve {
        /// Listen address (default: config relay.addr or 127.0.0.1:8080)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Send a commit message to a running relay server
    Send {
        /// Commit message
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Server address (default: config relay.addr or 127.0.0.1:8080)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Show the effective configuration
    Config {
        /// Save the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}
