// # DigitalOcean Firewall Provider
//
// This crate provides the DigitalOcean cloud firewall provider for fwsync.
//
// ## Implementation Status
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation to the engine
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ✅ Paginated listing (`links.pages.next`)
// - ❌ NO retry logic (a failed run is retried by the next invocation)
// - ❌ NO caching (every run reads the live firewall)
// - ❌ NO background tasks
//
// ## Trust Level: Untrusted (Firewall Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTPS API calls to the DigitalOcean endpoint only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Access the state store
// - ❌ Decide which rules change (owned by fwsync-core)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List Firewalls: GET `/v2/firewalls?page=N&per_page=M`
// - Get Firewall: GET `/v2/firewalls/:id`
// - Update Firewall: PUT `/v2/firewalls/:id` (full replacement document)

use async_trait::async_trait;
use fwsync_core::config::ProviderConfig;
use fwsync_core::model::{Firewall, FirewallPage, FirewallRequest};
use fwsync_core::traits::FirewallProvider;
use fwsync_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "digitalocean";

/// `GET /v2/firewalls` response body
#[derive(Debug, Deserialize)]
struct FirewallList {
    #[serde(default)]
    firewalls: Vec<Firewall>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

/// `GET`/`PUT /v2/firewalls/:id` response body
#[derive(Debug, Deserialize)]
struct SingleFirewall {
    firewall: Firewall,
}

/// DigitalOcean cloud firewall provider
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Rule decisions are owned by fwsync-core.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the provider performs every read, logs the
/// replacement document it would have sent, and skips the `PUT`.
pub struct DigitalOceanProvider {
    /// Personal access token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform reads but skip updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider against the public API
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        Self::with_api_base(api_token, DIGITALOCEAN_API_BASE, dry_run)
    }

    /// Create a provider against a different API endpoint
    pub fn with_api_base(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Build a provider from validated configuration
    ///
    /// `FWSYNC_MODE=dry-run` in the environment forces dry-run mode.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::DigitalOcean {
                api_token,
                api_base,
                dry_run,
            } => {
                let dry_run = *dry_run
                    || std::env::var("FWSYNC_MODE")
                        .unwrap_or_default()
                        .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!(
                        "DigitalOcean provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Self::with_api_base(
                    api_token.clone(),
                    api_base.as_deref().unwrap_or(DIGITALOCEAN_API_BASE),
                    dry_run,
                )
            }
        }
    }

    fn firewall_url(&self, id: &str) -> String {
        format!("{}/v2/firewalls/{}", self.api_base, id)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))
    }
}

/// The firewall as described by an accepted replacement document
fn applied(id: &str, request: &FirewallRequest) -> Firewall {
    Firewall {
        id: id.to_string(),
        name: request.name.clone(),
        status: None,
        inbound_rules: request.inbound_rules.clone(),
        outbound_rules: request.outbound_rules.clone(),
        droplet_ids: request.droplet_ids.clone(),
        tags: request.tags.clone(),
        created_at: None,
    }
}

/// Map a non-success status to an error
///
/// `what` names the resource or action for the message.
async fn status_error(response: reqwest::Response, what: &str) -> Error {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        StatusCode::NOT_FOUND => Error::not_found(format!("{} not found", what)),
        StatusCode::CONFLICT => Error::provider(
            PROVIDER,
            format!("Conflict: {} is being changed by another process. Status: {}", what, status),
        ),
        StatusCode::TOO_MANY_REQUESTS => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        s if s.is_server_error() => Error::provider(
            PROVIDER,
            format!("DigitalOcean server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", what, status, error_text)),
    }
}

#[async_trait]
impl FirewallProvider for DigitalOceanProvider {
    /// ```http
    /// GET /v2/firewalls?page=1&per_page=200
    /// Authorization: Bearer <token>
    /// ```
    async fn list_firewalls(&self, page: u32, per_page: u32) -> Result<FirewallPage> {
        let url = format!("{}/v2/firewalls", self.api_base);
        tracing::debug!("Listing firewalls (page {}, per_page {})", page, per_page);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("per_page", per_page)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(response, "Firewall listing").await);
        }

        let list: FirewallList = Self::read_json(response).await?;
        let has_next = list.links.pages.and_then(|p| p.next).is_some();

        Ok(FirewallPage {
            firewalls: list.firewalls,
            has_next,
        })
    }

    /// ```http
    /// GET /v2/firewalls/:id
    /// Authorization: Bearer <token>
    /// ```
    async fn get_firewall(&self, id: &str) -> Result<Firewall> {
        tracing::debug!("Fetching firewall {}", id);

        let response = self
            .client
            .get(self.firewall_url(id))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(response, &format!("Firewall {}", id)).await);
        }

        let single: SingleFirewall = Self::read_json(response).await?;
        Ok(single.firewall)
    }

    /// ```http
    /// PUT /v2/firewalls/:id
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// { "name": ..., "inbound_rules": [...], "outbound_rules": [...], ... }
    /// ```
    ///
    /// Any non-success status is `UpdateRejected`.
    async fn update_firewall(&self, id: &str, request: &FirewallRequest) -> Result<Firewall> {
        let url = self.firewall_url(id);

        if self.dry_run {
            let payload = serde_json::to_string(request)?;
            tracing::info!("[DRY-RUN] Would send PUT request to {} with payload: {}", url, payload);
            return Ok(applied(id, request));
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::update_rejected(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let err = status_error(response, &format!("Update of firewall {}", id)).await;
            return Err(Error::update_rejected(err.to_string()));
        }

        // The update is applied once the status is 2xx, whatever the body says
        match Self::read_json::<SingleFirewall>(response).await {
            Ok(single) => Ok(single.firewall),
            Err(e) => {
                tracing::warn!(
                    "Firewall {} was updated but the response could not be read: {}",
                    id,
                    e
                );
                Ok(applied(id, request))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
