use std::path::PathBuf;

use clap::Parser;

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Top-level CLI parser for the `idmig` binary.
#[derive(Debug, Parser)]
#[command(
    name = "idmig",
    version,
    about = "Migrate users, roles, permissions and organizations from Auth0 to Descope"
)]
pub struct Cli {
    /// Fetch everything and report what would be migrated, without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose mode (debug logging, merged ids and bindings in the report)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (errors only, no progress spinner)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Import users with their bcrypt hashes from a password export
    #[arg(long, value_name = "FILE")]
    pub with_passwords: Option<PathBuf>,

    /// Read users from a newline-delimited export instead of the user listing
    #[arg(long, value_name = "FILE")]
    pub from_json: Option<PathBuf>,

    /// Source-side search query narrowing the users to migrate
    #[arg(long, value_name = "FILTER", conflicts_with = "from_json")]
    pub query: Option<String>,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Do not migrate roles, permissions or role bindings
    #[arg(long)]
    pub skip_roles: bool,

    /// Do not migrate organizations or tenant bindings
    #[arg(long)]
    pub skip_tenants: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
