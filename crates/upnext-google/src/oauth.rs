//! OAuth 2.0 consent and refresh exchanges.
//!
//! Implements the Authorization Code flow with PKCE (RFC 7636) over a
//! loopback redirect, as Google requires for desktop applications:
//!
//! 1. Generate a random code verifier and its SHA-256 challenge
//! 2. Bind a local HTTP listener on a configured port range
//! 3. Open the user's browser to the consent page, requesting offline
//!    access so a refresh token is issued
//! 4. Receive the authorization code on the loopback redirect, checking
//!    the `state` parameter against the one we sent
//! 5. Exchange the code (with the verifier) for access and refresh tokens
//!
//! Refreshing an expired access token is a single form POST to the token
//! endpoint. Both the callback wait and every HTTP exchange are bounded
//! by timeouts; there is no retry.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::config::OAuthCredentials;
use crate::error::{ProviderError, ProviderResult};
use crate::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Length of the PKCE code verifier in bytes, before base64url encoding.
const CODE_VERIFIER_BYTES: usize = 32;

/// How long to wait for the user to complete the consent page.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval of the nonblocking accept loop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Performs OAuth token exchanges against Google's endpoints.
#[derive(Debug)]
pub struct OAuthFlow {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthFlow {
    /// Creates a new flow with the given credentials and request timeout.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            http_client,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Runs the interactive consent flow and returns the obtained tokens.
    ///
    /// Opens the user's browser to the consent page (printing the URL as
    /// a fallback when the browser cannot be opened) and waits for the
    /// loopback redirect, for at most five minutes.
    ///
    /// # Errors
    ///
    /// Fails when no loopback port is available, the user denies
    /// authorization, the callback never arrives, or the code exchange
    /// is rejected.
    pub async fn consent(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceChallenge::generate();

        let (listener, port) = bind_loopback(port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url = pkce.authorization_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!("starting OAuth consent flow, opening browser");
        debug!("authorization URL: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let callback = wait_for_callback(listener, CONSENT_TIMEOUT)?;
        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(&callback.code, &pkce.verifier, &redirect_uri, scopes)
            .await
    }

    /// Refreshes an expired access token using the refresh token.
    ///
    /// Returns the new access token and its lifetime in seconds.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.token_request(&params, "token refresh").await?;

        info!("refreshed access token");
        Ok((response.access_token, response.expires_in))
    }

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ProviderResult<TokenInfo> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.token_request(&params, "token exchange").await?;

        info!("obtained tokens");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// POSTs a form to the token endpoint and parses the response.
    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))
    }
}

/// PKCE verifier/challenge pair plus the CSRF state parameter.
#[derive(Debug)]
pub struct PkceChallenge {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 of the verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceChallenge {
    /// Generates a new random verifier, challenge, and state.
    pub fn generate() -> Self {
        let verifier = random_urlsafe(CODE_VERIFIER_BYTES);
        let challenge = Self::challenge_for(&verifier);
        let state = random_urlsafe(16);

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the Google authorization URL for this challenge.
    ///
    /// `access_type=offline` and `prompt=consent` make Google issue a
    /// refresh token, so later sessions can run without the browser.
    pub fn authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

fn random_urlsafe(bytes: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// What the loopback redirect delivered.
#[derive(Debug)]
struct Callback {
    code: String,
    state: String,
}

/// Binds a TCP listener on the first available port in the given range.
fn bind_loopback(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
            debug!("bound loopback server on port {}", port);
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Waits for the OAuth redirect and extracts the authorization code.
///
/// The accept loop polls a nonblocking listener against a deadline, so
/// when the wait times out the thread exits and the listener port is
/// released instead of staying bound for the process lifetime.
fn wait_for_callback(listener: TcpListener, timeout: Duration) -> ProviderResult<Callback> {
    listener
        .set_nonblocking(true)
        .map_err(|e| ProviderError::internal(format!("failed to configure listener: {}", e)))?;

    let (tx, rx) = mpsc::channel();
    let deadline = Instant::now() + timeout;

    // Accept connections on a separate thread so the wait can time out.
    let _handle = thread::spawn(move || {
        while Instant::now() < deadline {
            match listener.accept() {
                Ok((stream, _)) => {
                    let _ = stream.set_nonblocking(false);
                    let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
                    if let Some(result) = handle_redirect(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ProviderError::authentication(
            "timed out waiting for OAuth consent",
        )),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::internal("callback channel disconnected"))
        }
    }
}

/// Handles one HTTP request on the loopback listener.
///
/// Returns `None` for requests that are not the redirect (favicon
/// fetches and the like), so the accept loop keeps waiting.
fn handle_redirect(mut stream: TcpStream) -> Option<ProviderResult<Callback>> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return None;
    }

    // Request line: GET /callback?code=...&state=... HTTP/1.1
    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let path = parts.next()?;
    if !path.starts_with("/callback") {
        return None;
    }

    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    let mut code = None;
    let mut state = None;
    let mut denial = None;

    for param in query.split('&') {
        if let Some((key, value)) = param.split_once('=') {
            let value = urlencoding::decode(value).unwrap_or_default().into_owned();
            match key {
                "code" => code = Some(value),
                "state" => state = Some(value),
                "error" => denial = Some(value),
                _ => {}
            }
        }
    }

    let response = if denial.is_some() || code.is_none() {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Authorization Failed</h1>\
        <p>You can close this window.</p></body></html>"
    } else {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Authorization Successful</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    if let Some(denial) = denial {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {}",
            denial
        ))));
    }

    match code {
        Some(code) => Some(Ok(Callback {
            code,
            state: state.unwrap_or_default(),
        })),
        None => Some(Err(ProviderError::authentication(
            "missing authorization code in callback",
        ))),
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
