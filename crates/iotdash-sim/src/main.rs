//! iotdash - Simulated IoT fleet backend
//!
//! Usage:
//!   iotdash serve --port 3000
//!   iotdash poll --module dashboard --count 5
//!   iotdash poll --module telemetry --device-id 3
//!   iotdash list
//!   iotdash tb devices --page-size 20

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use iotdash_sim::{
    AppConfig, SimulationQuery, api, create_shared_state, factories, print_api_docs, server,
};
use iotdash_thingsboard::ThingsBoardClient;
use iotdash_thingsboard::analytics::{calculate_telemetry_stats, transform_for_chart};
use iotdash_thingsboard::models::{AlarmSearchStatus, HistoryQuery, RpcRequest};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "iotdash")]
#[command(about = "Simulated IoT fleet backend with a ThingsBoard client")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG), e.g. debug or iotdash_sim=trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP polling API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Poll the simulation in-process and print the JSON envelope
    Poll {
        /// devices, telemetry, alerts, dashboard or all
        #[arg(short, long, default_value = "all")]
        module: String,

        /// Restrict telemetry to one device
        #[arg(short, long)]
        device_id: Option<String>,

        /// Number of polls to run before printing
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// List device kinds, protocols and alert templates
    List,

    /// ThingsBoard operations
    Tb {
        #[command(subcommand)]
        command: TbCommand,
    },
}

#[derive(Subcommand)]
enum TbCommand {
    /// List tenant devices
    Devices {
        #[arg(long, default_value = "100")]
        page_size: u32,
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Show one device
    Device { id: String },

    /// Latest telemetry values (all keys when none given)
    Latest {
        id: String,
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Historical telemetry with per-key statistics
    History {
        id: String,
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
        /// Window ending now
        #[arg(long, default_value = "24")]
        hours: u32,
        /// Print timestamp-aligned chart rows instead of statistics
        #[arg(long)]
        chart: bool,
    },

    /// List alarms
    Alarms {
        #[arg(long, default_value = "20")]
        page_size: u32,
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(short, long)]
        status: Option<AlarmFilter>,
    },

    /// Acknowledge an alarm
    Ack { alarm_id: String },

    /// Clear an alarm
    Clear { alarm_id: String },

    /// Send an RPC command to a device
    Rpc {
        id: String,
        method: String,
        /// JSON params
        #[arg(short, long)]
        params: Option<String>,
        /// Wait for the device reply
        #[arg(long)]
        two_way: bool,
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Device totals by activity and type
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlarmFilter {
    Any,
    Active,
    Cleared,
    Ack,
    Unack,
}

impl From<AlarmFilter> for AlarmSearchStatus {
    fn from(filter: AlarmFilter) -> Self {
        match filter {
            AlarmFilter::Any => AlarmSearchStatus::Any,
            AlarmFilter::Active => AlarmSearchStatus::Active,
            AlarmFilter::Cleared => AlarmSearchStatus::Cleared,
            AlarmFilter::Ack => AlarmSearchStatus::Ack,
            AlarmFilter::Unack => AlarmSearchStatus::Unack,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging ── (stderr, so `poll` output stays pipeable)
    let filter = match &cli.log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ── Config ──
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);
    config.thingsboard = config.thingsboard.with_env_token();
    for problem in config.validate() {
        warn!(%problem, "configuration problem");
    }

    match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Poll {
            module,
            device_id,
            count,
        } => run_poll(config, module, device_id, count),
        Commands::List => {
            run_list();
            Ok(())
        }
        Commands::Tb { command } => run_tb(config, command).await,
    }
}

async fn run_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    print_api_docs(&config);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let state = create_shared_state(config);
    server::serve(listener, state, server::ctrl_c()).await?;
    Ok(())
}

fn run_poll(config: AppConfig, module: String, device_id: Option<String>, count: u32) -> anyhow::Result<()> {
    let state = create_shared_state(config);
    let query = SimulationQuery {
        module: Some(module),
        device_id,
    };

    let mut last = None;
    for _ in 0..count.max(1) {
        match api::handle_poll(&state, &query) {
            Ok(response) => last = Some(response),
            Err(e) => {
                println!("{}", serde_json::to_string_pretty(&e.body())?);
                anyhow::bail!("poll failed with status {}: {e}", e.status_code());
            }
        }
    }
    if let Some(response) = last {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

fn run_list() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Device Kinds                              ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (kind, groups) in factories::list_device_kinds() {
        println!("║ {:26} {:34} ║", kind, groups);
    }
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Protocols: {:50} ║", factories::list_protocols().join(", "));
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║                     Alert Templates                           ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (kind, severity, title) in factories::list_alert_templates() {
        println!("║ {:12} {:8} {:39} ║", kind, severity, title);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("\nUsage: iotdash poll --module <devices|telemetry|alerts|dashboard|all>");
}

async fn run_tb(config: AppConfig, command: TbCommand) -> anyhow::Result<()> {
    if !config.thingsboard.has_token() {
        warn!(
            env = iotdash_thingsboard::TOKEN_ENV,
            "no ThingsBoard token configured; authenticated calls will fail"
        );
    }
    let tb = ThingsBoardClient::new(&config.thingsboard)?;

    match command {
        TbCommand::Devices { page_size, page } => print_json(&tb.get_devices(page_size, page).await?),
        TbCommand::Device { id } => print_json(&tb.get_device(&id).await?),
        TbCommand::Latest { id, keys } => {
            let keys = if keys.is_empty() {
                tb.get_telemetry_keys(&id).await?
            } else {
                keys
            };
            print_json(&tb.get_latest_telemetry(&id, &keys).await?)
        }
        TbCommand::History {
            id,
            keys,
            hours,
            chart,
        } => {
            let (start, end) = history_window(chrono::Utc::now().timestamp_millis(), hours);
            let history = tb
                .get_historical_telemetry(&id, &HistoryQuery::for_chart(keys, start, end))
                .await?;
            if chart {
                print_json(&transform_for_chart(&history))
            } else {
                let stats: std::collections::BTreeMap<_, _> = history
                    .iter()
                    .map(|(key, series)| (key.clone(), calculate_telemetry_stats(series)))
                    .collect();
                print_json(&stats)
            }
        }
        TbCommand::Alarms {
            page_size,
            page,
            status,
        } => print_json(
            &tb.get_alarms(page_size, page, status.map(Into::into), None)
                .await?,
        ),
        TbCommand::Ack { alarm_id } => {
            tb.acknowledge_alarm(&alarm_id).await?;
            eprintln!("Alarm {alarm_id} acknowledged");
            Ok(())
        }
        TbCommand::Clear { alarm_id } => {
            tb.clear_alarm(&alarm_id).await?;
            eprintln!("Alarm {alarm_id} cleared");
            Ok(())
        }
        TbCommand::Rpc {
            id,
            method,
            params,
            two_way,
            timeout_ms,
        } => {
            let params = params
                .map(|p| serde_json::from_str(&p))
                .transpose()
                .context("--params must be valid JSON")?;
            let rpc = RpcRequest::new(method, params);
            if two_way {
                print_json(&tb.send_two_way_rpc(&id, &rpc, timeout_ms).await?)
            } else {
                tb.send_one_way_rpc(&id, &rpc).await?;
                eprintln!("RPC sent");
                Ok(())
            }
        }
        TbCommand::Stats => print_json(&tb.get_device_stats().await?),
    }
}

/// `(start, end)` in epoch milliseconds for the `hours` ending at `end_ms`.
fn history_window(end_ms: i64, hours: u32) -> (i64, i64) {
    let span = i64::from(hours) * 3_600_000;
    (end_ms.saturating_sub(span), end_ms)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
