use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::{Overrides, Secret};

#[derive(Parser)]
#[command(name = "elasticstack")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Manage Elasticsearch security roles and role mappings declaratively", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Cluster connection flags; they override the environment and config file
#[derive(Args)]
pub struct ConnectionArgs {
    /// Cluster URL (overrides ELASTICSEARCH_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Username (overrides ELASTICSEARCH_USER)
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password (overrides ELASTICSEARCH_PASS / ELASTICSEARCH_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Provider config file
    #[arg(long, global = true, env = "ELASTICSTACK_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone().map(Secret::new),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a resource from a state file
    Create(WriteArgs),

    /// Overwrite a resource from a state file
    Update(WriteArgs),

    /// Show the current state of a resource
    Read(NameArgs),

    /// Delete a resource
    Delete(NameArgs),

    /// Adopt an existing resource by its id
    Import(NameArgs),

    /// Show the provider schema, or the schema of one resource type
    Schema {
        /// Resource type, e.g. elasticstack_auth_role
        resource_type: Option<String>,
    },

    /// List the resource types this provider manages
    Types,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct WriteArgs {
    /// Resource type, e.g. elasticstack_auth_role
    pub resource_type: String,

    /// Declarative state (.toml or .json)
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct NameArgs {
    /// Resource type, e.g. elasticstack_auth_role
    pub resource_type: String,

    /// Resource name (the remote id)
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "elasticstack",
            "create",
            "elasticstack_auth_role",
            "--file",
            "readers.toml",
            "--url",
            "http://localhost:9200",
        ])
        .unwrap();

        assert_eq!(cli.connection.url.as_deref(), Some("http://localhost:9200"));
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.resource_type, "elasticstack_auth_role");
                assert_eq!(args.file, PathBuf::from("readers.toml"));
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_password_flag_becomes_secret() {
        let cli = Cli::try_parse_from([
            "elasticstack",
            "-vv",
            "read",
            "elasticstack_auth_role",
            "readers",
            "--password",
            "hunter2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let overrides = cli.connection.overrides();
        assert!(!format!("{overrides:?}").contains("hunter2"));
        assert_eq!(overrides.password.unwrap().expose(), "hunter2");
    }
}
