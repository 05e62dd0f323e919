use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use homedash::config::ServerConfig;
use homedash::db::store::DbStore;
use homedash::monitoring::PingMonitor;
use homedash::notifications::NotificationDispatcher;
use homedash::scheduler::{JobError, JobScheduler, JobSpec};
use homedash::version::VERSION;
use homedash::versioning::{default_fetchers, KubePodLister, PodVersionResolver, UpdateChecker};

fn init_logging() {
    // Default to `info` with the noisy query layers dialled down when
    // RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("homedash version: {VERSION}");
        return Ok(());
    }

    init_logging();
    info!("Starting homedash, version: {}", VERSION);
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db: DatabaseConnection = Database::connect(opt).await?;
    info!("Database connection established.");

    let store = Arc::new(DbStore::new(db));
    let dispatcher = Arc::new(NotificationDispatcher::new(store.clone()));

    // Pod tracking is optional: outside a cluster (and with no kubeconfig)
    // the update checker runs on registry lookups alone.
    let pod_resolver = match KubePodLister::try_default().await {
        Ok(lister) => Some(Arc::new(PodVersionResolver::new(Arc::new(lister)))),
        Err(e) => {
            warn!(error = %e, "Kubernetes client unavailable; pod version tracking disabled.");
            None
        }
    };

    let checker = Arc::new(UpdateChecker::new(
        store.clone(),
        default_fetchers(&config),
        pod_resolver,
        dispatcher.clone(),
    ));
    let monitor = Arc::new(PingMonitor::new(store.clone(), dispatcher.clone()));

    let scheduler = Arc::new(JobScheduler::new());

    let job_checker = checker.clone();
    scheduler.register(
        JobSpec::new("update-check", Duration::from_secs(6 * 60 * 60)).run_on_start(),
        move || {
            let checker = job_checker.clone();
            async move {
                checker.check_all().await;
                Ok(())
            }
        },
    )?;

    let job_checker = checker.clone();
    scheduler.register(
        JobSpec::new("pod-version-refresh", Duration::from_secs(5 * 60)).run_on_start(),
        move || {
            let checker = job_checker.clone();
            async move {
                checker.refresh_pod_versions().await;
                Ok(())
            }
        },
    )?;

    let job_monitor = monitor.clone();
    scheduler.register(
        JobSpec::new("ping-monitor", Duration::from_secs(60)).run_on_start(),
        move || {
            let monitor = job_monitor.clone();
            async move {
                monitor.ping_all().await;
                Ok(())
            }
        },
    )?;

    let job_monitor = monitor.clone();
    scheduler.register(
        JobSpec::new("ping-history-cleanup", Duration::from_secs(24 * 60 * 60)).run_on_start(),
        move || {
            let monitor = job_monitor.clone();
            async move {
                monitor
                    .cleanup_history()
                    .await
                    .map_err(|e| JobError::Failed(e.to_string()))?;
                Ok(())
            }
        },
    )?;

    scheduler.start();
    info!("Background jobs scheduled.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received; draining jobs.");
    scheduler.shutdown().await;

    Ok(())
}
