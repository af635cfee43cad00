//! One-shot loopback listener receiving the OAuth redirect.

mod handler;
mod pages;

pub use handler::{CallbackParams, code_from_pasted};

use crate::error::AuthError;
use axum::{Router, routing::get};
use handler::{CallbackOutcome, CallbackState};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Browser redirects are given five minutes to arrive.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct CallbackServer {
    local_addr: SocketAddr,
    redirect_uri: String,
    receiver: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Binds the listener and starts serving `/callback`.
    pub async fn bind(preferred_port: u16, expected_state: &str) -> Result<Self, AuthError> {
        let listener = bind_loopback(preferred_port).await?;
        let local_addr = listener.local_addr()?;
        let redirect_uri = format!("http://{}/callback", local_addr);

        let (sender, receiver) = oneshot::channel();
        let state = CallbackState {
            expected_state: Arc::from(expected_state),
            sender: Arc::new(Mutex::new(Some(sender))),
        };

        let app = Router::new()
            .route("/callback", get(handler::oauth_callback))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal.cancelled_owned())
                .await
            {
                tracing::warn!(error = %e, "Callback listener stopped with an error");
            }
        });

        tracing::info!(%local_addr, "Listening for OAuth redirect");

        Ok(Self {
            local_addr,
            redirect_uri,
            receiver: Some(receiver),
            shutdown,
            task: Some(task),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the single expected redirect and shuts the listener down on every path.
    pub async fn wait_for_code(
        mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        let outcome = match self.receiver.take() {
            Some(receiver) => tokio::select! {
                _ = cancel.cancelled() => Err(AuthError::Cancelled),
                result = tokio::time::timeout(timeout, receiver) => match result {
                    Err(_) => Err(AuthError::CallbackTimeout(timeout)),
                    Ok(Err(_)) => Err(AuthError::Io(std::io::Error::other(
                        "callback listener stopped before a redirect arrived",
                    ))),
                    Ok(Ok(outcome)) => outcome,
                },
            },
            None => Err(AuthError::Io(std::io::Error::other(
                "callback already consumed",
            ))),
        };

        self.stop().await;
        outcome
    }

    async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                tracing::debug!("Callback listener did not drain in time, aborting");
                abort.abort();
            }
        }
        tracing::debug!(local_addr = %self.local_addr, "Callback listener closed");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Preferred port on IPv4 loopback, then an ephemeral IPv4 port, then IPv6 loopback.
fn bind_order(preferred_port: u16) -> Vec<SocketAddr> {
    let mut order = Vec::with_capacity(3);
    if preferred_port != 0 {
        order.push(SocketAddr::from((Ipv4Addr::LOCALHOST, preferred_port)));
    }
    order.push(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)));
    order.push(SocketAddr::from((Ipv6Addr::LOCALHOST, 0)));
    order
}

async fn bind_loopback(preferred_port: u16) -> Result<TcpListener, AuthError> {
    let mut errors = Vec::new();
    for addr in bind_order(preferred_port) {
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "Loopback bind failed");
                errors.push(format!("{addr} ({e})"));
            }
        }
    }
    Err(AuthError::Bind(errors.join("; ")))
}
