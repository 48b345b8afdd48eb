//! Loopback HTTP listener receiving the OAuth redirect.
//!
//! Binds `127.0.0.1:<port>` before the consent URL is shown, serves a
//! single route with axum, and shuts down as soon as a redirect carrying a
//! code (or an error) arrives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::receiver::CodeReceiver;
use crate::error::AdsError;

/// Query string of the redirect: `?code=...&state=...` or `?error=...`.
#[derive(Debug, Deserialize)]
struct RedirectQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Outcome forwarded from the route handler to the waiting receiver.
#[derive(Debug)]
enum RedirectOutcome {
    Code { code: String, state: Option<String> },
    Denied(String),
}

#[derive(Clone)]
struct CallbackState {
    done_tx: Arc<Mutex<Option<oneshot::Sender<RedirectOutcome>>>>,
}

/// Receives the code on a local listener the browser is redirected to.
#[derive(Debug)]
pub struct LoopbackReceiver {
    listener: Option<TcpListener>,
    addr: SocketAddr,
    timeout: Duration,
}

impl LoopbackReceiver {
    /// Binds the listener. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::AuthSetup`] if the port cannot be bound.
    pub async fn bind(port: u16, timeout: Duration) -> Result<Self, AdsError> {
        let requested = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(requested).await.map_err(|e| {
            AdsError::AuthSetup(format!(
                "cannot listen on {requested} for the OAuth redirect: {e}"
            ))
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| AdsError::AuthSetup(format!("listener has no local address: {e}")))?;
        tracing::info!(%addr, "OAuth callback listener bound");
        Ok(Self {
            listener: Some(listener),
            addr,
            timeout,
        })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl CodeReceiver for LoopbackReceiver {
    fn redirect_uri(&self) -> String {
        format!("http://{}/", self.addr)
    }

    async fn receive_code(
        &mut self,
        consent_url: &str,
        expected_state: &str,
    ) -> Result<String, AdsError> {
        let listener = self.listener.take().ok_or_else(|| {
            AdsError::AuthSetup("callback listener was already used".to_string())
        })?;

        let (done_tx, done_rx) = oneshot::channel::<RedirectOutcome>();
        let state = CallbackState {
            done_tx: Arc::new(Mutex::new(Some(done_tx))),
        };
        let app = Router::new()
            .route("/", get(handle_redirect))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "callback server error");
            }
            tracing::debug!("callback server shut down");
        });

        eprintln!("Open this URL in your browser and grant access:\n\n  {consent_url}\n");
        eprintln!(
            "Waiting up to {}s for the redirect to {} ...",
            self.timeout.as_secs(),
            self.redirect_uri()
        );

        let outcome = tokio::time::timeout(self.timeout, done_rx).await;
        let _ = shutdown_tx.send(());
        let _ = server.await;

        match outcome {
            Err(_) => Err(AdsError::AuthSetup(format!(
                "no redirect received within {}s",
                self.timeout.as_secs()
            ))),
            Ok(Err(_)) => Err(AdsError::AuthSetup(
                "callback listener closed before a code arrived".to_string(),
            )),
            Ok(Ok(RedirectOutcome::Denied(reason))) => Err(AdsError::AuthSetup(format!(
                "consent was not granted: {reason}"
            ))),
            Ok(Ok(RedirectOutcome::Code { code, state })) => {
                if state.as_deref() == Some(expected_state) {
                    Ok(code)
                } else {
                    Err(AdsError::AuthSetup(
                        "state parameter does not match this authorization attempt".to_string(),
                    ))
                }
            }
        }
    }
}

async fn handle_redirect(
    State(state): State<CallbackState>,
    Query(query): Query<RedirectQuery>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        if let Some(tx) = state.done_tx.lock().await.take() {
            let _ = tx.send(RedirectOutcome::Denied(format!("{error} {description}")));
        }
        return (
            StatusCode::OK,
            Html(format!(
                "<h2>Authorization failed</h2><p>{}</p><p>{}</p>",
                escape_html(&error),
                escape_html(&description)
            )),
        );
    }

    if let Some(code) = query.code {
        if let Some(tx) = state.done_tx.lock().await.take() {
            let _ = tx.send(RedirectOutcome::Code {
                code,
                state: query.state,
            });
        }
        return (
            StatusCode::OK,
            Html(
                "<h2>Authorization received</h2><p>You can close this window and return to the terminal.</p>"
                    .to_string(),
            ),
        );
    }

    (
        StatusCode::BAD_REQUEST,
        Html("<h2>Missing 'code' query parameter</h2>".to_string()),
    )
}

/// Escapes text for use inside an HTML element.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
