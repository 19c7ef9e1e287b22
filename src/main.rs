//! Experia Box V10 Exporter CLI
//!
//! Serves router metrics over HTTP. Also carries two small tools: `cookies`
//! logs in once and prints the stored session cookies, and `probe` is a
//! container health check against the metrics endpoint.

use clap::{Args, Parser, Subcommand};
use experia_v10_exporter::{
    config::{parse_timeout, ConfigOverrides, ExporterConfig},
    metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig},
    Exporter,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Prometheus exporter for the Experia Box V10 router")]
struct Cli {
    #[command(flatten)]
    router: RouterArgs,
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Args, Debug)]
struct RouterArgs {
    /// TOML configuration file; flags and environment override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Router IP address
    #[arg(long, env = "EXPERIA_V10_ROUTER_IP")]
    router_ip: Option<String>,
    /// Web UI user name
    #[arg(long, env = "EXPERIA_V10_ROUTER_USERNAME")]
    username: Option<String>,
    /// Web UI password
    #[arg(long, env = "EXPERIA_V10_ROUTER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Per-request timeout, e.g. 5s or 500ms
    #[arg(long, env = "EXPERIA_V10_TIMEOUT", value_parser = parse_timeout)]
    timeout: Option<Duration>,
    /// Metrics listen address, e.g. :9100
    #[arg(long, env = "EXPERIA_V10_LISTEN_ADDR")]
    listen_addr: Option<String>,
    /// Ordered, comma-separated interfaces to probe (first one is eth1)
    #[arg(long, env = "EXPERIA_EXPECT_NETDEV_IFACES")]
    interfaces: Option<String>,
}

impl RouterArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            router_ip: self.router_ip.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.timeout,
            listen_addr: self.listen_addr.clone(),
            interfaces: self.interfaces.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve /metrics (default)
    Serve,
    /// Log in once and print the session token and stored cookies
    Cookies,
    /// GET a URL and exit 0 on a 2xx/3xx answer, 1 otherwise
    Probe {
        #[arg(long, default_value = "http://127.0.0.1:9100/metrics")]
        url: String,
        #[arg(long, default_value = "2s", value_parser = parse_timeout)]
        timeout: Duration,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Some(Command::Probe { url, timeout }) = &cli.cmd {
        std::process::exit(probe(url, *timeout));
    }

    let config = match load_config(&cli.router) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.cmd {
        Some(Command::Cookies) => print_cookies(&config),
        _ => match serve(&config) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Exporter failed: {}", e);
                1
            }
        },
    };
    std::process::exit(code);
}

fn load_config(args: &RouterArgs) -> Result<ExporterConfig, experia_v10_exporter::ConfigError> {
    let mut config = match &args.config {
        Some(path) => ExporterConfig::from_file(path)?,
        None => ExporterConfig::default(),
    };
    config.apply_overrides(args.overrides());
    config.validate()?;
    Ok(config)
}

fn serve(config: &ExporterConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Experia V10 Exporter v{}", experia_v10_exporter::VERSION);

    let bind_addr = config.listen_socket()?;
    // Kept until the runtime is gone: the blocking HTTP client must not be
    // dropped from inside it.
    let exporter = Arc::new(Exporter::from_config(config)?);
    info!(
        router = %config.base_url(),
        interfaces = ?exporter.candidates().iter().map(|c| c.device_id()).collect::<Vec<_>>(),
        timeout = ?config.timeout,
        "Exporter configured"
    );

    match exporter.login() {
        Ok(()) => info!("Initial login succeeded"),
        Err(e) => warn!(error = %e, "Initial login failed; retrying on first scrape"),
    }

    let registry = Arc::new(MetricsRegistry::new());
    registry.register_exporter(Arc::clone(&exporter))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let tx = parking_lot::Mutex::new(Some(tx));
    ctrlc::set_handler(move || {
        if let Some(tx) = tx.lock().take() {
            info!("Received Ctrl-C, shutting down");
            let _ = tx.send(());
        }
    })?;

    let server = MetricsServer::new(MetricsServerConfig::from(bind_addr), registry);
    let result = runtime.block_on(server.run_until(async move {
        let _ = rx.await;
    }));
    drop(runtime);
    drop(exporter);

    result?;
    Ok(())
}

fn print_cookies(config: &ExporterConfig) -> i32 {
    let exporter = match Exporter::from_config(config) {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("Failed to build exporter: {}", e);
            return 1;
        }
    };
    if let Err(e) = exporter.login() {
        eprintln!("Login failed: {}", e);
        return 1;
    }
    println!("Login succeeded");
    println!("Session token: {}", exporter.session_token());

    let base = config.base_url();
    for url in [base.clone(), format!("{base}:80"), format!("{base}/")] {
        let cookies = exporter.cookies_for_host(&url);
        println!("Found {} cookies for {}", cookies.len(), url);
        for cookie in cookies {
            println!("Cookie: {}={}", cookie.name, cookie.value);
        }
    }
    0
}

fn probe(url: &str, timeout: Duration) -> i32 {
    let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            return 1;
        }
    };
    match client.get(url).send() {
        Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => 0,
        Ok(resp) => {
            eprintln!("{} answered {}", url, resp.status());
            1
        }
        Err(e) => {
            eprintln!("{} unreachable: {}", url, e);
            1
        }
    }
}
