// Copyright (c) 2024 The Botho Foundation

//! Gen3.0 sale tooling
//!
//! Builds allow-list roots and proofs, checks deployment configuration and
//! replays call scripts against an in-memory sale.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gen30-sale")]
#[command(about = "Gen3.0 sale tooling - allow-lists, configuration and offline replay")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the root of an allow-list
    Root {
        /// File with one address per line
        list: PathBuf,
    },

    /// Print the membership proof of an address
    Proof {
        /// File with one address per line
        list: PathBuf,

        /// Address to prove
        address: String,
    },

    /// Validate a sale configuration file
    CheckConfig {
        /// Path to the TOML configuration
        config: PathBuf,

        /// Member list to compare against the configured root
        #[arg(long)]
        members: Option<PathBuf>,

        /// Follower list to compare against the configured root
        #[arg(long)]
        followers: Option<PathBuf>,
    },

    /// Replay a call script against a fresh sale
    Replay {
        /// Path to the TOML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the TOML call script
        script: PathBuf,

        /// Member list used to fill in missing presale proofs
        #[arg(long)]
        members: Option<PathBuf>,

        /// Follower list used to fill in missing presale proofs
        #[arg(long)]
        followers: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Root { list } => commands::allowlist::root(&list),
        Commands::Proof { list, address } => commands::allowlist::proof(&list, &address),
        Commands::CheckConfig {
            config,
            members,
            followers,
        } => commands::check_config::run(&config, members.as_deref(), followers.as_deref()),
        Commands::Replay {
            config,
            script,
            members,
            followers,
        } => commands::replay::run(&config, &script, members.as_deref(), followers.as_deref()),
    }
}
