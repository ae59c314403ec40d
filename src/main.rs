use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use greenops_provider::config::{DecodePolicy, ProviderConfig};
use greenops_provider::greenops::auth::HeaderToken;
use greenops_provider::greenops::GreenOpsClient;
use greenops_provider::resource::{self, ApplyAction, ClusterResource, ResourceData};
use greenops_provider::state::StateStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as LogFileBuilder, Rotation};
use tracing_subscriber::EnvFilter;

/// Manage GreenOps clusters and their agent API keys
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-greenops", version, about, long_about = None)]
struct Args {
    /// Base address of the GreenOps API [env: SERVICE_ADDRESS]
    #[arg(long, global = true)]
    address: Option<String>,

    /// Organization owning the clusters [env: ORG_NAME, default: org]
    #[arg(long, global = true)]
    org: Option<String>,

    /// API token [env: SERVICE_TOKEN]
    #[arg(long, global = true)]
    token: Option<String>,

    /// Send the token verbatim in this header instead of `Authorization: Bearer`
    #[arg(long, global = true)]
    token_header: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 180, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Treat malformed API payloads as empty instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    /// State file tracking managed clusters
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Provider log verbosity; RUST_LOG overrides it when set
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the provider schema as JSON
    Schema,
    /// Show tracked clusters
    Show {
        /// Resource address to show (all when omitted)
        #[arg(long)]
        resource: Option<String>,
        /// Print api keys instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },
    #[command(flatten)]
    Lifecycle(LifecycleCommand),
}

/// Which tracked instance a command works on
#[derive(ClapArgs, Debug)]
struct Target {
    /// Cluster name
    #[arg(long)]
    name: String,

    /// Address of the instance in state; defaults to the cluster name.
    /// Applying a new name under the same address replaces the cluster.
    #[arg(long)]
    resource: Option<String>,
}

impl Target {
    fn address(&self) -> &str {
        self.resource.as_deref().unwrap_or(&self.name)
    }

    /// Tracked state for this instance, or a fresh one for `name`
    fn tracked_or_new(&self, state: &StateStore) -> ResourceData {
        state
            .get(self.address())
            .cloned()
            .unwrap_or_else(|| ResourceData::new(&self.name))
    }
}

/// Commands that talk to the GreenOps API
#[derive(Subcommand, Debug)]
enum LifecycleCommand {
    /// Create the cluster, update it if already tracked, or replace it when
    /// its name changed
    Apply {
        #[command(flatten)]
        target: Target,
        /// Rotate the api key on this and every later apply
        #[arg(long)]
        rotate: bool,
        #[arg(long)]
        description: Option<String>,
    },
    /// Re-check a tracked cluster against the API
    Refresh {
        #[command(flatten)]
        target: Target,
    },
    /// Rotate the api key once
    Rotate {
        #[command(flatten)]
        target: Target,
    },
    /// Delete the cluster's api keys and stop tracking it
    Destroy {
        #[command(flatten)]
        target: Target,
    },
    /// Start tracking an existing cluster
    Import {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive for our own crates; dependencies stay at `warn`
    fn directive(self) -> Option<String> {
        let level = match self {
            LogLevel::Off => return None,
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        Some(format!(
            "warn,greenops_provider={level},terraform_provider_greenops={level}"
        ))
    }
}

/// Log to `provider.log` next to the state file. Stdout carries command
/// output only.
fn setup_logging(level: LogLevel, dir: &Path) -> Option<WorkerGuard> {
    let directive = level.directive()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let appender = match LogFileBuilder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix("provider")
        .filename_suffix("log")
        .build(dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Logging disabled, cannot write to {}: {}", dir.display(), e);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        "terraform-provider-greenops {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        dir.join("provider.log").display()
    );
    Some(guard)
}

/// Resolve flags against the registered schema (flag > env > default)
fn provider_config(args: &Args) -> Result<ProviderConfig> {
    let explicit: HashMap<&str, String> = [
        ("address", &args.address),
        ("org", &args.org),
        ("token", &args.token),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.clone().map(|value| (field, value)))
    .collect();

    let decode = if args.lenient {
        DecodePolicy::Lenient
    } else {
        DecodePolicy::Strict
    };

    // The timeout is checked by clap, everything else by resolve_config
    let config = resource::provider()
        .resolve_config(&explicit, |var| std::env::var(var).ok())
        .context("Failed to resolve provider configuration")?
        .with_timeout(Duration::from_secs(args.timeout))
        .with_decode_policy(decode);
    Ok(config)
}

fn configure(args: &Args, config: &ProviderConfig) -> Result<ClusterResource<GreenOpsClient>> {
    let clusters = match &args.token_header {
        Some(header) => resource::configure_with_signer(
            config,
            Arc::new(HeaderToken::new(header, &config.token)),
        )?,
        None => resource::configure(config)?,
    };
    Ok(clusters)
}

fn print_entry(address: &str, data: &ResourceData, show_secrets: bool) {
    let apikey = match (&data.apikey, show_secrets) {
        (Some(key), true) => key.as_str(),
        (Some(_), false) => "<sensitive>",
        (None, _) => "-",
    };
    println!(
        "{}\tname={}\tid={}\trotate={}\tapikey={}\tdescription={}",
        address,
        data.name,
        data.id().unwrap_or("-"),
        data.rotate,
        apikey,
        data.description.as_deref().unwrap_or("-"),
    );
}

fn show(state: &StateStore, address: Option<&str>, show_secrets: bool) -> Result<()> {
    match address {
        Some(address) => {
            let data = state
                .get(address)
                .with_context(|| format!("{} is not tracked", address))?;
            print_entry(address, data, show_secrets);
        }
        None => {
            for (address, entry) in state.entries() {
                print_entry(address, &entry.data, show_secrets);
            }
        }
    }
    Ok(())
}

async fn run_lifecycle(
    command: &LifecycleCommand,
    clusters: &ClusterResource<GreenOpsClient>,
    state: &mut StateStore,
) -> Result<()> {
    match command {
        LifecycleCommand::Apply {
            target,
            rotate,
            description,
        } => {
            let prior = state.get(target.address()).cloned();
            let desired = ResourceData::new(&target.name)
                .with_rotate(*rotate)
                .with_description(description.clone());

            let (data, action) = clusters
                .apply(prior, desired)
                .await
                .with_context(|| format!("Failed to apply cluster {}", target.name))?;
            let verb = match action {
                ApplyAction::Created => "created",
                ApplyAction::Updated => "updated",
                ApplyAction::Replaced => "replaced",
            };
            println!("cluster {}: {}", target.name, verb);
            state.record(target.address(), &data);
        }
        LifecycleCommand::Refresh { target } => {
            let mut data = state
                .get(target.address())
                .cloned()
                .with_context(|| format!("{} is not tracked", target.address()))?;
            clusters.read(&mut data).await?;
            println!(
                "cluster {}: {}",
                data.name,
                if data.is_present() { "present" } else { "gone" }
            );
            state.record(target.address(), &data);
        }
        LifecycleCommand::Rotate { target } => {
            let mut data = target.tracked_or_new(state);
            clusters
                .rotate(&mut data)
                .await
                .with_context(|| format!("Failed to rotate api key of {}", data.name))?;
            println!("cluster {}: api key rotated", data.name);
            state.record(target.address(), &data);
        }
        LifecycleCommand::Destroy { target } => {
            let mut data = target.tracked_or_new(state);
            clusters
                .delete(&mut data)
                .await
                .with_context(|| format!("Failed to delete cluster {}", data.name))?;
            println!("cluster {}: destroyed", data.name);
            state.record(target.address(), &data);
        }
        LifecycleCommand::Import { target } => match clusters.import(&target.name).await? {
            Some(data) => {
                println!("cluster {}: imported", target.name);
                state.record(target.address(), &data);
            }
            None => anyhow::bail!("Cluster {} does not exist", target.name),
        },
    }
    Ok(())
}

async fn run(args: Args, state_path: &Path) -> Result<()> {
    match &args.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&resource::provider())?);
        }
        Command::Show {
            resource,
            show_secrets,
        } => {
            let state = StateStore::load(state_path)?;
            show(&state, resource.as_deref(), *show_secrets)?;
        }
        Command::Lifecycle(command) => {
            let config = provider_config(&args)?;
            let clusters = configure(&args, &config)?;
            let mut state = StateStore::load(state_path)?;
            tracing::debug!("Using state file {:?}", state.path());

            run_lifecycle(command, &clusters, &mut state).await?;
            state.save()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let state_path = args.state.clone().unwrap_or_else(StateStore::default_path);
    let log_dir = state_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(StateStore::default_dir);
    let _log_guard = setup_logging(args.log_level, &log_dir);

    let result = run(args, &state_path).await;
    if let Err(err) = &result {
        tracing::error!("{:#}", err);
    }
    result
}
