//! Callgate CLI: the `callgate` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { expr, sql, json } => commands::parse::run(expr, sql, json),

        Commands::Resolve {
            token,
            context,
            raw,
            json,
        } => commands::resolve::run(token, context, raw, json),

        Commands::Invoke {
            expr,
            registry,
            context,
            config,
            raw,
            method,
            tag,
            version,
            eager,
            strict,
            json,
        } => commands::invoke::run(commands::invoke::Args {
            expr,
            registry,
            context,
            config,
            raw,
            method,
            tag,
            version,
            eager,
            strict,
            json,
        }),

        Commands::RegistryCheck { registry, json } => {
            commands::registry_check::run(registry, json)
        }
    }
}
