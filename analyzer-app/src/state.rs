use analyzer_common::AnalyzerError;
use analyzer_config::AnalyzerConfig;
use analyzer_http::HttpClient;
use analyzer_store::Repository;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tracing::warn;

/// Context used to derive the cookie signing key from the configured secret.
const KEY_CONTEXT: &str = "page-analyzer 2024-06 flash cookie signing key";

/// Shared handler state. Cloned per request, so every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub http: HttpClient,
    key: Key,
}

impl AppState {
    pub fn new(repo: Repository, http: HttpClient, secret: Option<&str>) -> Self {
        Self {
            repo,
            http,
            key: signing_key(secret),
        }
    }

    /// Build the fetch client from `cfg.fetch` and take the secret from `cfg`.
    pub fn from_config(cfg: &AnalyzerConfig, repo: Repository) -> Result<Self, AnalyzerError> {
        let http = HttpClient::builder()
            .timeout(cfg.fetch.timeout())
            .connect_timeout(cfg.fetch.connect_timeout())
            .max_redirects(cfg.fetch.max_redirects)
            .user_agent(cfg.fetch.user_agent.clone())
            .build()
            .map_err(|e| AnalyzerError::Config(format!("http client: {e}")))?;
        Ok(Self::new(repo, http, cfg.secret_key.as_deref()))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

/// 64 bytes of key material stretched from `secret`, or a random key when
/// no secret is configured.
fn signing_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => {
            let mut material = [0u8; 64];
            let mut hasher = blake3::Hasher::new_derive_key(KEY_CONTEXT);
            hasher.update(secret.as_bytes());
            hasher.finalize_xof().fill(&mut material);
            Key::from(&material)
        }
        None => {
            warn!("app.secret_key.missing: flash cookies will not survive a restart");
            Key::generate()
        }
    }
}
