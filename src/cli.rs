//! Command-line surface, grounded on the teacher's own env-var-driven
//! startup configuration in `main.rs`, generalized to a proper `clap`
//! parser (as used elsewhere in the retrieved pack for CLI entry points).

use std::path::PathBuf;

use clap::Parser;

/// A minimal LSP server for C/C++ that answers code-intelligence queries
/// via fixed-string search instead of a real compiler front end.
#[derive(Debug, Parser)]
#[command(name = "super-lazy-clangd", version, about)]
pub struct Cli {
    /// Restrict every search to this explicit list of files instead of
    /// recursively walking the workspace root.
    #[arg(long)]
    pub files: Option<Vec<String>>,

    /// Workspace root to search from. Overrides whatever `rootUri` /
    /// `rootPath` the client later sends in `initialize`.
    #[arg(long)]
    pub root: Option<String>,

    /// Name or path of the fixed-string search binary to invoke.
    #[arg(long, default_value = "grep")]
    pub grep_bin: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
