//! apollo-sync command line client.
//!
//! Connects to a config service, prints one value and exits, or keeps the
//! client running with `--watch` until Ctrl-C.
//!
//! ```text
//! apollo-sync --meta http://apollo-meta:8080 --app-id demo --key timeout
//! apollo-sync --config client.toml --key datasource --json --watch
//! ```

use std::path::PathBuf;

use clap::Parser;

use apollo_sync::config::loader::{apply_env_overrides, read_config};
use apollo_sync::config::schema::DEFAULT_NAMESPACE;
use apollo_sync::observability::{logging, metrics};
use apollo_sync::{ClientConfig, ConfigClient};

#[derive(Parser)]
#[command(name = "apollo-sync")]
#[command(about = "Fetch configuration from an Apollo config service", long_about = None)]
struct Cli {
    /// TOML configuration file; APOLLO_* variables and flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Meta server address
    #[arg(long)]
    meta: Option<String>,

    #[arg(long)]
    app_id: Option<String>,

    /// Shared secret enabling signed requests
    #[arg(long)]
    secret: Option<String>,

    #[arg(long)]
    cluster: Option<String>,

    #[arg(long)]
    env: Option<String>,

    /// Namespaces to synchronize, comma separated
    #[arg(long, value_delimiter = ',')]
    namespaces: Vec<String>,

    /// Namespace the key is read from
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Key to print
    #[arg(short, long, default_value = "config_local")]
    key: String,

    /// Parse the value as JSON and pretty-print it
    #[arg(long)]
    json: bool,

    /// Keep polling and reprint the value after every change until Ctrl-C
    #[arg(short, long)]
    watch: bool,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<String>,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => {
                let mut config = ClientConfig::default();
                apply_env_overrides(&mut config);
                config
            }
        };

        if let Some(meta) = &self.meta {
            config.meta_server_address = meta.clone();
        }
        if let Some(app_id) = &self.app_id {
            config.app_id = app_id.clone();
        }
        if let Some(secret) = &self.secret {
            config.app_secret = Some(secret.clone());
        }
        if let Some(cluster) = &self.cluster {
            config.cluster = cluster.clone();
        }
        if let Some(env) = &self.env {
            config.env = env.clone();
        }
        if !self.namespaces.is_empty() {
            config.namespaces = self.namespaces.clone();
        }
        if !config.namespaces.contains(&self.namespace) {
            config.namespaces.push(self.namespace.clone());
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_address = Some(addr.clone());
        }
        Ok(config)
    }

    fn render(&self, client: &ConfigClient) -> String {
        if self.json {
            let value = client.get_structured(&self.key, &self.namespace);
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        } else {
            client.get_or(&self.key, &self.namespace, "")
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.client_config()?;

    logging::init_logging(&config.observability);

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<std::net::SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let client = ConfigClient::connect(config).await?;
    let mut last = cli.render(&client);
    println!("{}", last);

    if cli.watch {
        let mut ticker = tokio::time::interval(client.config().cycle_time());
        ticker.tick().await;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let current = cli.render(&client);
                    if current != last {
                        println!("{}", current);
                        last = current;
                    }
                }
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl-C");
                    break;
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
