// ABOUTME: OAuth credential store and authorization flow
// ABOUTME: Loads, refreshes, or interactively obtains the bearer credential

use crate::storage::{write_atomic, Paths};
use crate::{Error, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret as OauthClientSecret, CsrfToken,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};

/// Scopes required for Drive, Docs, Sheets, and Tasks operations.
pub const SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
    "https://www.googleapis.com/auth/tasks.readonly",
];

/// Refuse tokens that expire within this margin.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredCredentials {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() || !self.covers_scopes() {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry > now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS),
            // No recorded expiry: assume stale rather than guess.
            None => false,
        }
    }

    /// Older records may predate scope tracking; only a non-empty scope list
    /// that is missing a required scope forces re-authorization.
    fn covers_scopes(&self) -> bool {
        self.scopes.is_empty() || SCOPES.iter().all(|s| self.scopes.iter().any(|h| h == s))
    }
}

/// The single piece of durable local state, as an explicit store.
pub struct CredentialStore {
    token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(token_path: PathBuf) -> Self {
        CredentialStore { token_path }
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.token_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, creds: &StoredCredentials) -> Result<()> {
        let json = serde_json::to_string_pretty(creds)?;
        write_atomic(&self.token_path, json.as_bytes())
    }

    /// Delete the stored record. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

// --- client secret (Google "installed app" JSON) --------------------------

#[derive(Debug, Clone, Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    installed: Option<ClientSecretEntry>,
    #[serde(default)]
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretEntry {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

pub fn load_client_secret(path: &Path) -> Result<ClientSecretEntry> {
    if !path.exists() {
        return Err(Error::Setup(setup_instructions(path)));
    }
    let content = fs::read_to_string(path)?;
    let file: ClientSecretFile = serde_json::from_str(&content)?;
    file.installed.or(file.web).ok_or_else(|| {
        Error::Setup(format!(
            "Client secret file {} has neither an \"installed\" nor a \"web\" section",
            path.display()
        ))
    })
}

fn setup_instructions(path: &Path) -> String {
    let sep = "=".repeat(70);
    format!(
        "\n{sep}\n\
         FIRST-TIME SETUP REQUIRED\n\
         {sep}\n\n\
         OAuth client credentials file not found at:\n\
         \x20 {path}\n\n\
         To use drivectl, you need to create OAuth credentials:\n\n\
         1. Go to: https://console.cloud.google.com/apis/credentials\n\
         \x20  - Create a new project (or select existing)\n\
         \x20  - Click '+ CREATE CREDENTIALS' -> 'OAuth client ID'\n\
         \x20  - Application type: 'Desktop app'\n\n\
         2. Enable required APIs:\n\
         \x20  - Google Drive API: https://console.cloud.google.com/apis/library/drive.googleapis.com\n\
         \x20  - Google Docs API: https://console.cloud.google.com/apis/library/docs.googleapis.com\n\
         \x20  - Google Tasks API: https://console.cloud.google.com/apis/library/tasks.googleapis.com\n\n\
         3. Download the credentials:\n\
         \x20  - Click the download icon next to your OAuth client\n\
         \x20  - Save the JSON file as: {path}\n\n\
         4. Run the command again - your browser will open for authentication.\n\
         {sep}",
        sep = sep,
        path = path.display()
    )
}

// --- token acquisition -----------------------------------------------------

/// Load a valid credential, refreshing or running the interactive flow as
/// needed. This is the single entry point for authenticated commands.
pub fn obtain(paths: &Paths) -> Result<StoredCredentials> {
    let store = CredentialStore::new(paths.token_path.clone());
    let stored = store.load()?;

    if let Some(creds) = &stored {
        if creds.is_valid(Utc::now()) {
            return Ok(creds.clone());
        }
    }

    let refresh_token = stored.and_then(|c| c.refresh_token);
    if let Some(refresh_token) = refresh_token {
        if paths.client_secret_path.exists() {
            let secret = load_client_secret(&paths.client_secret_path)?;
            match refresh_access_token(&secret, &refresh_token) {
                Ok(creds) => {
                    store.save(&creds)?;
                    return Ok(creds);
                }
                Err(e) => {
                    eprintln!("Failed to refresh token: {e}");
                    eprintln!("Re-authenticating...");
                }
            }
        }
    }

    let secret = load_client_secret(&paths.client_secret_path)?;
    paths.ensure_dirs()?;
    let creds = authorize_interactive(&secret)?;
    store.save(&creds)?;
    Ok(creds)
}

fn oauth_http_client() -> Result<reqwest::blocking::Client> {
    // Redirects stay disabled so the token endpoint cannot bounce us around.
    Ok(reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

fn refresh_access_token(
    secret: &ClientSecretEntry,
    refresh_token: &str,
) -> Result<StoredCredentials> {
    let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
        .set_client_secret(OauthClientSecret::new(secret.client_secret.clone()))
        .set_token_uri(
            TokenUrl::new(secret.token_uri.clone())
                .map_err(|e| Error::Auth(format!("invalid token uri: {e}")))?,
        );

    let http = oauth_http_client()?;
    let token = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
        .request(&http)
        .map_err(|e| Error::Auth(format!("token refresh failed: {e}")))?;

    Ok(credentials_from_token(&token, Some(refresh_token.to_string())))
}

fn authorize_interactive(secret: &ClientSecretEntry) -> Result<StoredCredentials> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
        .set_client_secret(OauthClientSecret::new(secret.client_secret.clone()))
        .set_auth_uri(
            AuthUrl::new(secret.auth_uri.clone())
                .map_err(|e| Error::Auth(format!("invalid auth uri: {e}")))?,
        )
        .set_token_uri(
            TokenUrl::new(secret.token_uri.clone())
                .map_err(|e| Error::Auth(format!("invalid token uri: {e}")))?,
        )
        .set_redirect_uri(
            RedirectUrl::new(format!("http://127.0.0.1:{port}"))
                .map_err(|e| Error::Auth(format!("invalid redirect uri: {e}")))?,
        );

    let (auth_url, csrf_state) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(SCOPES.iter().map(|s| Scope::new((*s).to_string())))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .url();

    let sep = "=".repeat(70);
    eprintln!("\n{sep}");
    eprintln!("AUTHENTICATION REQUIRED");
    eprintln!("{sep}");
    eprintln!("\nAttempting to open your browser for Google authentication...");
    eprintln!("If the browser doesn't open, copy and paste this URL:\n");
    eprintln!("  {auth_url}\n");
    let _ = open::that(auth_url.as_str());

    let (code, state) = wait_for_redirect(&listener)?;
    if state != *csrf_state.secret() {
        return Err(Error::Auth(
            "authorization state mismatch; aborting".to_string(),
        ));
    }

    let http = oauth_http_client()?;
    let token = client
        .exchange_code(AuthorizationCode::new(code))
        .request(&http)
        .map_err(|e| Error::Auth(format!("code exchange failed: {e}")))?;

    eprintln!("\nAuthentication successful! Credentials saved.");
    eprintln!("{sep}\n");

    Ok(credentials_from_token(&token, None))
}

fn credentials_from_token(
    token: &BasicTokenResponse,
    fallback_refresh: Option<String>,
) -> StoredCredentials {
    StoredCredentials {
        access_token: token.access_token().secret().clone(),
        refresh_token: token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(fallback_refresh),
        expiry: token
            .expires_in()
            .map(|d| Utc::now() + ChronoDuration::seconds(d.as_secs() as i64)),
        scopes: token
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_else(|| SCOPES.iter().map(|s| (*s).to_string()).collect()),
    }
}

/// Block until the OAuth redirect arrives on the loopback listener and
/// return the `code` and `state` query parameters.
fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String)> {
    for stream in listener.incoming() {
        let stream = stream?;
        if let Some(result) = handle_redirect_request(&stream)? {
            return result;
        }
        // Not the redirect (e.g. a favicon probe); keep listening.
    }
    Err(Error::Auth("authorization listener closed".to_string()))
}

type RedirectResult = Option<Result<(String, String)>>;

fn handle_redirect_request(mut stream: &TcpStream) -> Result<RedirectResult> {
    let mut request_line = String::new();
    BufReader::new(stream).read_line(&mut request_line)?;

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let parsed = parse_redirect_query(path);

    let body = match &parsed {
        Some(Ok(_)) => "Authentication successful! You may close this window.",
        Some(Err(_)) => "Authorization was denied. You may close this window.",
        None => "Waiting for authorization...",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;

    match parsed {
        Some(Ok(pair)) => Ok(Some(Ok(pair))),
        Some(Err(e)) => Ok(Some(Err(e))),
        None => Ok(None),
    }
}

/// Pull `code` and `state` out of a redirect request path. Returns None if
/// the request carries neither a code nor an error.
fn parse_redirect_query(path: &str) -> RedirectResult {
    let url = url::Url::parse(&format!("http://127.0.0.1{path}")).ok()?;

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
        return Some(Err(Error::Auth(format!("authorization denied: {error}"))));
    }
    match (code, state) {
        (Some(code), Some(state)) => Some(Ok((code, state))),
        _ => None,
    }
}

/// Delete stored credentials. Returns whether a record existed.
pub fn revoke(paths: &Paths) -> Result<bool> {
    CredentialStore::new(paths.token_path.clone()).clear()
}
