//! Sources of the authorization code for the interactive grant.
//!
//! The consent page redirects the browser to the `redirect_uri` with
//! `?code=...&state=...`. A [`CodeReceiver`] decides what that URI is and
//! how the code gets back to the process: a loopback listener
//! ([`super::callback::LoopbackReceiver`]) or the user pasting it
//! ([`ConsoleReceiver`]).

use std::future::Future;

use crate::error::AdsError;

/// Delivers the authorization code for one consent attempt.
pub trait CodeReceiver {
    /// Redirect URI registered in the consent request.
    fn redirect_uri(&self) -> String;

    /// Shows `consent_url` to the user and waits for the code. The returned
    /// code must belong to a redirect carrying `expected_state`.
    fn receive_code(
        &mut self,
        consent_url: &str,
        expected_state: &str,
    ) -> impl Future<Output = Result<String, AdsError>> + Send;
}

/// Reads the code (or the whole redirected URL) from standard input.
#[derive(Debug, Clone)]
pub struct ConsoleReceiver {
    redirect_uri: String,
}

impl ConsoleReceiver {
    /// Creates a receiver that asks the browser to redirect to
    /// `redirect_uri`. The page will not load; the user copies the URL from
    /// the address bar.
    #[must_use]
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
        }
    }
}

impl Default for ConsoleReceiver {
    fn default() -> Self {
        Self::new("http://127.0.0.1")
    }
}

impl CodeReceiver for ConsoleReceiver {
    fn redirect_uri(&self) -> String {
        self.redirect_uri.clone()
    }

    async fn receive_code(
        &mut self,
        consent_url: &str,
        expected_state: &str,
    ) -> Result<String, AdsError> {
        eprintln!("Open this URL in your browser and grant access:\n\n  {consent_url}\n");
        eprintln!(
            "After approving, the browser is redirected to {} (the page may fail to load).",
            self.redirect_uri
        );
        eprintln!("Paste the full address bar URL, or just the `code` value, then press Enter:");

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| AdsError::AuthSetup(format!("input task failed: {e}")))?
        .map_err(|e| AdsError::AuthSetup(format!("failed to read code: {e}")))?;

        extract_code(&line, expected_state)
    }
}

/// Extracts the authorization code from pasted input.
///
/// Accepts either a bare code or a redirect URL. A URL must carry the
/// expected `state`; an `error` parameter (e.g. `access_denied`) fails.
///
/// # Errors
///
/// Returns [`AdsError::AuthSetup`] on empty input, a consent error, a
/// missing code or a state mismatch.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String, AdsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AdsError::AuthSetup("no authorization code entered".to_string()));
    }
    if !input.contains("code=") && !input.contains("error=") {
        return Ok(input.to_string());
    }

    let url = if input.contains("://") {
        reqwest::Url::parse(input)
    } else {
        reqwest::Url::parse(&format!("http://localhost/?{}", input.trim_start_matches('?')))
    }
    .map_err(|e| AdsError::AuthSetup(format!("could not parse redirect URL: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AdsError::AuthSetup(format!("consent was not granted: {error}")));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AdsError::AuthSetup(
            "state parameter does not match this authorization attempt".to_string(),
        ));
    }
    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AdsError::AuthSetup("redirect URL has no code parameter".to_string()))
}
