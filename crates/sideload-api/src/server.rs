//! Upload server setup and lifecycle management.
//!
//! [`UploadServer`] owns the listening socket, the accept loop and the host
//! stay-awake hold. All of it sits behind one async mutex, so concurrent
//! `start`/`stop` calls are serialized and the hold is taken exactly while
//! the server is running.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::Request;
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tower::ServiceExt;

use sideload_core::config::AppConfig;
use sideload_core::error::StartError;
use sideload_core::traits::{Notifier, ResourceHold};

use crate::router::build_router;
use crate::state::AppState;

/// Lifecycle state of the upload server.
#[derive(Debug)]
enum ServiceState {
    Stopped,
    Running(RunningServer),
}

/// Handles owned while the server is up.
#[derive(Debug)]
struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    serve_task: JoinHandle<()>,
    renew_task: JoinHandle<()>,
}

/// The upload-receiving HTTP service.
#[derive(Debug)]
pub struct UploadServer {
    config: Arc<AppConfig>,
    hold: Arc<dyn ResourceHold>,
    state: Mutex<ServiceState>,
}

impl UploadServer {
    /// Create a stopped server.
    pub fn new(config: AppConfig, hold: Arc<dyn ResourceHold>) -> Self {
        Self {
            config: Arc::new(config),
            hold,
            state: Mutex::new(ServiceState::Stopped),
        }
    }

    /// Bind `port` on the configured host and start serving in the
    /// background.
    ///
    /// Returns once the socket is bound and accepting, with the actual
    /// bound address (useful with port `0`). `notifier` is called once per
    /// successful upload for as long as this run lasts.
    pub async fn start(&self, port: u16, notifier: Notifier) -> Result<SocketAddr, StartError> {
        let mut state = self.state.lock().await;
        if matches!(*state, ServiceState::Running(_)) {
            return Err(StartError::AlreadyRunning);
        }

        let app_state = AppState::new(Arc::clone(&self.config), notifier)
            .await
            .map_err(StartError::Prepare)?;
        let router = build_router(app_state);

        let addr = format!("{}:{}", self.config.server.host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StartError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StartError::Bind { addr, source })?;

        let max_hold = self.config.power.max_hold();
        acquire_hold(self.hold.as_ref(), max_hold).await;
        let renew_task = tokio::spawn(renew_hold(Arc::clone(&self.hold), max_hold));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let serve_task = tokio::spawn(serve(
            listener,
            router,
            shutdown_rx,
            self.config.server.shutdown_grace(),
        ));

        tracing::info!("Upload server listening on {}", local_addr);

        *state = ServiceState::Running(RunningServer {
            local_addr,
            shutdown_tx,
            serve_task,
            renew_task,
        });
        Ok(local_addr)
    }

    /// Stop accepting, drain in-flight requests, force-close stragglers,
    /// then release the hold. No-op when already stopped.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let running = match std::mem::replace(&mut *state, ServiceState::Stopped) {
            ServiceState::Running(running) => running,
            ServiceState::Stopped => return,
        };

        tracing::info!("Stopping upload server on {}", running.local_addr);

        running.renew_task.abort();
        let _ = running.renew_task.await;

        let _ = running.shutdown_tx.send(true);
        let mut serve_task = running.serve_task;
        let ceiling = self.config.server.shutdown_timeout();
        if tokio::time::timeout(ceiling, &mut serve_task).await.is_err() {
            tracing::warn!("Accept loop did not finish within {:?}, aborting", ceiling);
            serve_task.abort();
            let _ = serve_task.await;
        }

        self.hold.release().await;
        tracing::info!("Upload server stopped");
    }

    /// Whether the server is currently running.
    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, ServiceState::Running(_))
    }

    /// Bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            ServiceState::Running(running) => Some(running.local_addr),
            ServiceState::Stopped => None,
        }
    }
}

/// Take the hold; a refusal only costs the stay-awake guarantee.
async fn acquire_hold(hold: &dyn ResourceHold, max_hold: Duration) {
    match hold.acquire(max_hold).await {
        Ok(()) => tracing::info!(hold = hold.name(), ?max_hold, "Resource hold acquired"),
        Err(e) => tracing::warn!(
            hold = hold.name(),
            "Serving without resource hold: {}",
            e
        ),
    }
}

/// Re-take the hold each time its ceiling elapses while still running.
async fn renew_hold(hold: Arc<dyn ResourceHold>, max_hold: Duration) {
    let mut ticker = tokio::time::interval(max_hold);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        hold.release().await;
        match hold.acquire(max_hold).await {
            Ok(()) => tracing::debug!(hold = hold.name(), "Resource hold renewed"),
            Err(e) => tracing::warn!(hold = hold.name(), "Resource hold renewal failed: {}", e),
        }
    }
}

/// Accept loop. Returns once the listener is closed and every connection
/// has finished or been force-closed.
async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
    grace: Duration,
) {
    let conn_shutdown = shutdown.clone();
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer_addr,
                            router.clone(),
                            conn_shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::error!("Upload server accept error: {}", e);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.changed() => break,
        }
    }

    drop(listener);

    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            remaining = connections.len(),
            "Force-closing connections after {:?} grace period",
            grace
        );
        connections.abort_all();
        while connections.join_next().await.is_some() {}
    }
}

/// Serve one HTTP/1.1 connection until it closes or shutdown drains it.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
        router.clone().oneshot(req.map(axum::body::Body::new))
    });

    let conn = hyper::server::conn::http1::Builder::new().serve_connection(io, service);
    let mut conn = std::pin::pin!(conn);

    if !*shutdown.borrow_and_update() {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!("Connection from {} ended with error: {}", peer_addr, e);
                }
                return;
            }
            _ = shutdown.changed() => {}
        }
    }

    conn.as_mut().graceful_shutdown();
    if let Err(e) = conn.await {
        tracing::debug!("Connection from {} ended with error: {}", peer_addr, e);
    }
}
