mod handlers;

use std::collections::BTreeSet;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use kelect_core::config::LockConfiguration;
use kelect_core::naming::derive_resource_name;
use kelect_core::LeaseResourceType;

#[derive(Parser)]
#[command(
    name = "kelect",
    about = "kelect: inspect and drive leader-election leases",
    version
)]
struct Cli {
    /// Storage backend: "memory" or "sqlite:<path>"
    #[arg(long, global = true, default_value = "memory", env = "KELECT_STORAGE")]
    storage: String,

    /// JSON lock configuration file; flags override its values
    #[arg(long, global = true, env = "KELECT_CONFIG")]
    config: Option<String>,

    #[arg(long, global = true, env = "KELECT_NAMESPACE")]
    namespace: Option<String>,

    /// Shared record name (ConfigMap) or name prefix (Lease)
    #[arg(long, global = true, env = "KELECT_RESOURCE_NAME")]
    resource_name: Option<String>,

    /// "ConfigMap" or "Lease"
    #[arg(long, global = true, env = "KELECT_RESOURCE_TYPE")]
    resource_type: Option<LeaseResourceType>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GroupArgs {
    /// Election group
    #[arg(long)]
    group: String,

    /// Candidate identity, repeatable; a leader outside this set is not valid
    #[arg(long = "member")]
    members: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resource name derived from a prefix and a group
    Name { prefix: String, group: String },

    /// Print the decoded leader of a group
    Status(GroupArgs),

    /// Make one attempt at leadership of a group
    Acquire {
        #[command(flatten)]
        target: GroupArgs,

        /// Identity to claim under
        #[arg(long, env = "KELECT_IDENTITY")]
        identity: Option<String>,

        /// Take the lease even while another holder's lease is still valid
        #[arg(long)]
        force: bool,
    },

    /// Clear a group's leader
    Release(GroupArgs),

    /// Refresh a group's renew time, subject to the minimum update interval
    Renew(GroupArgs),

    /// Print version information
    Version,
}

fn load_config(cli: &Cli, identity: Option<String>) -> Result<LockConfiguration, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config {}: {}", path, e))?;
            serde_json::from_str(&raw).map_err(|e| format!("Invalid config {}: {}", path, e))?
        }
        None => LockConfiguration::default(),
    };

    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(resource_name) = &cli.resource_name {
        config.resource_name = resource_name.clone();
    }
    if let Some(resource_type) = cli.resource_type {
        config.lease_resource_type = resource_type;
    }
    if let Some(identity) = identity {
        config.identity = identity;
    }
    Ok(config)
}

fn member_set(members: &[String], identity: Option<&str>) -> BTreeSet<String> {
    members
        .iter()
        .cloned()
        .chain(identity.map(str::to_string))
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode output: {}", e))?;
    println!("{}", out);
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Name { prefix, group } => {
            println!("{}", derive_resource_name(prefix, group));
            Ok(())
        }
        Commands::Status(target) => {
            let client = handlers::create_client(&cli.storage, load_config(&cli, None)?)?;
            print_json(&handlers::status(&client, &target.group, &member_set(&target.members, None))?)
        }
        Commands::Acquire {
            target,
            identity,
            force,
        } => {
            let config = load_config(&cli, identity.clone())?;
            let members = member_set(&target.members, Some(&config.identity));
            let client = handlers::create_client(&cli.storage, config)?;
            print_json(&handlers::acquire(&client, &target.group, &members, *force)?)
        }
        Commands::Release(target) => {
            let client = handlers::create_client(&cli.storage, load_config(&cli, None)?)?;
            print_json(&handlers::release(&client, &target.group, &member_set(&target.members, None))?)
        }
        Commands::Renew(target) => {
            let client = handlers::create_client(&cli.storage, load_config(&cli, None)?)?;
            print_json(&handlers::renew(&client, &target.group, &member_set(&target.members, None))?)
        }
        Commands::Version => {
            println!("kelect {}", env!("CARGO_PKG_VERSION"));
            println!("Lease backends for leader election");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
