use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chunker", version, about = "Upload markdown documents to the Chunker API")]
pub struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session token for later commands
    Login {
        /// Username (prompted for when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Show where navigating to a route leads
    Open {
        /// Route path, e.g. /dashboard
        path: String,
    },
    /// Upload a markdown file
    Upload {
        file: PathBuf,
    },
    /// List files stored on the backend
    Files,
    /// Split a markdown file into chunks on the backend and print them
    Chunk {
        file: PathBuf,
    },
}
