use anyhow::Result;
use std::sync::{Arc, Mutex};
use sysdash_daemon::{
    analysis::Analyzer,
    collector::default_collector,
    config::{self, Config},
    dashboard::Dashboard,
    db::MetricsStore,
    sampler::{MetricsSampler, SysinfoCounters},
    scheduler::{SampleAndStore, Scheduler},
    socket::{handle_client, SocketServer},
};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("sysdash daemon starting...");

    // Load configuration
    let config_path = Config::config_path();
    let config = if config_path.exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        info!("No config file found, using defaults");
        Config::default()
    };

    // Initialize database
    let db_path = config
        .storage
        .db_path
        .clone()
        .unwrap_or_else(MetricsStore::default_path);
    let store = Arc::new(MetricsStore::open(&db_path)?);
    store.init_schema()?;
    info!("Metrics store at {:?}", store.path());

    let sampler = Arc::new(Mutex::new(MetricsSampler::new(
        SysinfoCounters::new(),
        config.general.sample_window(),
        config.general.root_mount.clone(),
    )));

    let analyzer = if config::ai_api_key().is_some() {
        warn!(
            "{} is set but no text generation backend is linked; analysis stays disabled",
            config::AI_KEY_ENV
        );
        Analyzer::disabled()
    } else {
        info!("{} not set, analysis disabled", config::AI_KEY_ENV);
        Analyzer::disabled()
    };

    // Create socket server
    let socket_path = config.socket.path.clone().unwrap_or_else(SocketServer::socket_path);
    let server = SocketServer::bind(&socket_path).await?;

    // Background sampling, first tick right away
    let job = SampleAndStore::new(Arc::clone(&sampler), Arc::clone(&store))
        .with_retention(config.general.retention())
        .with_broadcast(server.broadcast_sender());
    let mut scheduler = Scheduler::new(Arc::new(job), config.general.sample_interval());
    scheduler.start();

    let state = Arc::new(Dashboard {
        config,
        store,
        sampler,
        processes: Arc::from(default_collector()),
        analyzer,
    });

    info!("Daemon ready, listening for connections...");

    let mut sigterm = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let state = Arc::clone(&state);
                    let broadcast_rx = server.broadcast_sender().subscribe();
                    tokio::spawn(async move {
                        handle_client(stream, broadcast_rx, state).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}
