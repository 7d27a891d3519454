mod config;
mod database;
mod directory;
mod error;
mod server;
mod timing;

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use directory::store::Directory;
use error::AppError;
use server::server::Server;
use timing::{
    clock::{Clock, ZonedClock},
    refresh::StatusRefresher,
};

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load()?;

    let manager = SqliteConnectionManager::file(&config.database_path);
    let pool = Arc::new(r2d2::Pool::builder().build(manager)?);
    let directory = Directory::setup(pool)?;
    if let Some(seed_file) = &config.seed_file {
        directory.seed_from_file(seed_file)?;
    }

    let clock: Arc<dyn Clock> = Arc::new(ZonedClock::new(config.timezone));
    let (refresher, statuses) =
        StatusRefresher::new(directory.clone(), clock.clone(), config.refresh_interval);
    let server = Server::setup(directory, clock, statuses);

    let (shutdown_sender, shutdown) = watch::channel(false);
    let refresher = tokio::spawn(refresher.run(shutdown));

    let address = SocketAddr::new(config.bind_address, config.port);
    let listener = TcpListener::bind(address).await.map_err(|source| AppError::Bind {
        address: address.to_string(),
        source,
    })?;
    info!(%address, timezone = %config.timezone, "Listening");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("Could not accept connection: {}", err);
                    continue;
                }
            },
            _ = signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        };
        let io = TokioIo::new(stream);
        let server_clone = server.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, server_clone)
                .await
            {
                warn!(%peer, "Connection error: {}", err);
            }
        });
    }

    let _ = shutdown_sender.send(true);
    if let Err(err) = refresher.await {
        warn!("Status refresher ended abnormally: {}", err);
    }
    Ok(())
}
