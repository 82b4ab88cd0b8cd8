mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "free5gc-webui-operator",
    about = "Lifecycle operator for the free5gc WebUI: writes webuicfg.yaml, starts the webconsole, reports status",
    version,
    propagate_version = true
)]
struct Cli {
    /// Operator config file (YAML); defaults apply when absent
    #[arg(long, global = true, env = "WEBUI_OPERATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Host directory that mirrors the workload container's filesystem
    #[arg(long, global = true, env = "WEBUI_OPERATOR_ROOT", default_value = "/")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the operator: publish the service, then reconcile until interrupted
    Run {
        /// Namespace the service is published in
        #[arg(long, env = "WEBUI_OPERATOR_NAMESPACE", default_value = "default")]
        namespace: String,

        /// Application name used for the Kubernetes service (default: service_name)
        #[arg(long, env = "WEBUI_OPERATOR_APP")]
        app: Option<String>,

        /// Skip publishing the Kubernetes service
        #[arg(long)]
        no_publish: bool,

        /// Record process plans instead of starting processes
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the rendered config artifact
    Render,

    /// Print the process plan the operator applies
    Plan {
        /// Output as JSON instead of YAML
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Show the effective operator config and validate it
    Config {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run {
            namespace,
            app,
            no_publish,
            dry_run,
        } => cmd::run::run(
            &cli.root,
            config_path,
            cmd::run::RunOptions {
                namespace,
                app,
                publish: !no_publish,
                dry_run,
            },
        ),
        Commands::Render => cmd::render::run(config_path),
        Commands::Plan { json } => cmd::plan::run(config_path, json),
        Commands::Config { json } => cmd::config::run(config_path, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
