//! sa-key-rotator-server: HTTP front end for the rotator.
//!
//! Serves `POST /` with a JSON array of rotation requests, typically sent by
//! a scheduler. Each request is rotated on its own task; the response is
//! 200 when all of them succeed and 400 otherwise.

pub mod handler;
pub mod message;

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use sa_key_rotator::Rotator;

pub use message::RotationRequest;

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors from running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub rotator: Rotator,
    /// Parent of the token each rotation runs under.
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(rotator: Rotator) -> Self {
        Self {
            rotator,
            cancel: CancellationToken::new(),
        }
    }
}

/// Build the router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handler::rotate))
        .with_state(state)
}

/// Listen port from a `PORT` value; the default when unset or blank.
pub fn parse_port(value: Option<&str>) -> Result<u16, ServerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(port) => port
            .parse()
            .map_err(|_| ServerError::InvalidPort(port.to_string())),
    }
}

/// Listen port from the environment.
pub fn port_from_env() -> Result<u16, ServerError> {
    parse_port(std::env::var(PORT_ENV).ok().as_deref())
}

/// Serve on every interface at `port` until Ctrl-C or SIGTERM.
pub async fn serve(rotator: Rotator, port: u16) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_on(listener, rotator, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves.
///
/// On shutdown, rotations still in flight are cancelled and the server
/// waits for their responses before returning.
pub async fn serve_on<F>(
    listener: TcpListener,
    rotator: Rotator,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(rotator);
    let cancel = state.cancel.clone();
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening for rotation requests");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutting down, cancelling in-flight rotations");
            cancel.cancel();
        })
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(err = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(err = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
