mod cli;
mod commands;
mod config;
mod provider;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::ProviderConfig;
use declarative::Operation;
use provider::Provider;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // Commands that never talk to the cluster
    match &cli.command {
        Command::Schema { resource_type } => return commands::schema::show(resource_type.as_deref()),
        Command::Types => {
            commands::schema::types();
            return Ok(());
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "elasticstack", &mut io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = ProviderConfig::load(&cli.connection.overrides(), cli.connection.config.as_deref())?;
    if ctx.verbose > 0 {
        log::info!("using cluster {}", config.elasticsearch_url);
    }
    let provider = Provider::configure(&config)?;

    let result = match &cli.command {
        Command::Create(args) => commands::resource::write(
            &ctx,
            &provider,
            Operation::Create,
            &args.resource_type,
            &args.file,
        ),
        Command::Update(args) => commands::resource::write(
            &ctx,
            &provider,
            Operation::Update,
            &args.resource_type,
            &args.file,
        ),
        Command::Read(args) => {
            commands::resource::read(&ctx, &provider, &args.resource_type, &args.name)
        }
        Command::Delete(args) => {
            commands::resource::delete(&ctx, &provider, &args.resource_type, &args.name)
        }
        Command::Import(args) => {
            commands::resource::import(&ctx, &provider, &args.resource_type, &args.name)
        }
        Command::Schema { .. } | Command::Types | Command::Completions { .. } => Ok(()),
    };

    if let Err(err) = &result
        && let Some(api) = err.downcast_ref::<secapi::Error>()
    {
        ui::error(api.category().description());
        ui::dim(api.category().advice());
    }
    result
}
