use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use condo_gateway::client::{ClientRegistry, TenantDirectory};
use condo_gateway::config::{load_config, GatewayConfig, ModeSetting};
use condo_gateway::tenant::{parse_tenant, HostMode, Origin, OriginResolver};

#[derive(Parser)]
#[command(name = "condo-cli")]
#[command(about = "Inspect tenant resolution and call tenant APIs through the gateway", long_about = None)]
struct Cli {
    /// Gateway configuration file.
    #[arg(short, long, env = "CONDO_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Auto,
    Local,
    Production,
}

impl From<Mode> for ModeSetting {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => ModeSetting::Auto,
            Mode::Local => ModeSetting::Local,
            Mode::Production => ModeSetting::Production,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tenant and backend origin for a host name
    Resolve {
        host: String,
        /// Override the configured parsing mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
    /// List tenants known to the platform directory
    Tenants {
        /// Override the configured directory URL
        #[arg(long)]
        url: Option<String>,
    },
    /// GET an API path through the gateway at ORIGIN
    Get { origin: String, path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    match cli.command {
        Commands::Resolve { host, mode } => {
            let setting = mode.map_or(config.tenancy.mode, ModeSetting::from);
            let host_mode = HostMode::for_host(setting, &host);
            let tenant = parse_tenant(&host, host_mode);
            let resolver = OriginResolver::from_config(&config.tenancy)?;
            print_json(&json!({
                "host": host,
                "mode": format!("{host_mode:?}").to_lowercase(),
                "tenant": tenant.as_ref().map(ToString::to_string),
                "origin": resolver.resolve(tenant.as_ref()).to_string(),
            }))?;
        }
        Commands::Tenants { url } => {
            let mut directory_config = config.directory.clone();
            if let Some(url) = url {
                directory_config.url = url;
            }
            let directory = TenantDirectory::new(reqwest::Client::new(), &directory_config);
            let tenants: Vec<String> = directory
                .fetch()
                .await
                .iter()
                .map(ToString::to_string)
                .collect();
            print_json(&json!(tenants))?;
        }
        Commands::Get { origin, path } => {
            let origin = Origin::parse(&origin)?;
            let registry = ClientRegistry::new(reqwest::Client::new(), config.tenancy.mode);
            let client = registry.client_for(&origin);
            let res = client.get(&path).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: {} returned status {}", client.url(&path), status);
            }
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => print_json(&json)?,
                Err(_) => println!("{text}"),
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
