//! plex.tv account client.
//!
//! Authenticates an account token against plex.tv and discovers the
//! server resources the account can reach. A [`Resource`] is turned into a
//! [`PlexServer`] session by trying its advertised connections.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::{decode_json, PlexServer, TOKEN_HEADER};
use crate::error::{PlexportError, Result};

/// Public plex.tv endpoint.
pub const PLEX_TV_URL: &str = "https://plex.tv";

/// Account details returned by `/api/v2/user`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUser {
    #[serde(default)]
    pub username: String,
}

/// One way of reaching a resource.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Full URI, e.g. `https://10-0-0-2.abc.plex.direct:32400`.
    pub uri: String,

    /// Reachable on the local network.
    #[serde(default)]
    pub local: bool,

    /// Tunnelled through the Plex relay.
    #[serde(default)]
    pub relay: bool,
}

/// A device registered on the account.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,

    #[serde(default)]
    pub client_identifier: String,

    /// Comma separated capabilities, e.g. `server` or `client,player`.
    #[serde(default)]
    pub provides: String,

    /// Token scoped to this resource.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Resource {
    /// Whether this resource is a media server.
    pub fn is_server(&self) -> bool {
        self.provides.split(',').any(|p| p.trim() == "server")
    }

    /// Whether `ident` names this resource.
    ///
    /// Matches the name (case-insensitive), the client identifier, or any
    /// connection URI.
    pub fn matches(&self, ident: &str) -> bool {
        let ident_uri = normalize_uri(ident);
        self.name.eq_ignore_ascii_case(ident)
            || self.client_identifier == ident
            || self
                .connections
                .iter()
                .any(|c| ident_uri.is_some() && normalize_uri(&c.uri) == ident_uri)
    }

    /// Connections in the order they are tried: local, remote, relay.
    pub fn ordered_connections(&self) -> Vec<&Connection> {
        let mut ordered: Vec<&Connection> = self.connections.iter().collect();
        ordered.sort_by_key(|c| match (c.relay, c.local) {
            (false, true) => 0,
            (false, false) => 1,
            (true, _) => 2,
        });
        ordered
    }

    /// Connect to this resource, trying each connection once.
    ///
    /// Uses the resource's own access token when present, otherwise
    /// `account_token`.
    pub async fn connect(&self, client: &Client, account_token: &str) -> Result<PlexServer> {
        let token = self.access_token.as_deref().unwrap_or(account_token);
        let mut last_error = None;

        for connection in self.ordered_connections() {
            debug!("Trying {} via {}", self.name, connection.uri);
            match PlexServer::connect(client.clone(), &connection.uri, token).await {
                Ok(server) => return Ok(server),
                Err(e) => {
                    warn!("Connection {} failed: {}", connection.uri, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PlexportError::ApiError(format!("Resource {} has no connections", self.name))
        }))
    }
}

fn normalize_uri(uri: &str) -> Option<String> {
    Url::parse(uri)
        .ok()
        .map(|u| u.as_str().trim_end_matches('/').to_ascii_lowercase())
}

/// Authenticated plex.tv account.
#[derive(Debug, Clone)]
pub struct PlexAccount {
    client: Client,
    base_url: Url,
    token: String,
    user: AccountUser,
}

impl PlexAccount {
    /// Authenticate with an account token.
    ///
    /// # Errors
    ///
    /// Returns `BadCredentials` if plex.tv rejects the token.
    pub async fn new(client: Client, base_url: &str, token: &str) -> Result<Self> {
        let mut account = Self {
            client,
            base_url: Url::parse(base_url)?,
            token: token.to_string(),
            user: AccountUser::default(),
        };

        account.user = account.get("/api/v2/user", &[]).await?;
        info!("Authenticated plex.tv account {}", account.user.username);

        Ok(account)
    }

    /// Account details.
    pub fn user(&self) -> &AccountUser {
        &self.user
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!("GET {} with params: {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        decode_json(response).await
    }

    /// All resources registered on the account.
    pub async fn resources(&self) -> Result<Vec<Resource>> {
        self.get(
            "/api/v2/resources",
            &[("includeHttps", "1"), ("includeRelay", "1")],
        )
        .await
    }

    /// Find a server resource by name, client identifier, or address.
    pub async fn resource(&self, ident: &str) -> Result<Resource> {
        self.resources()
            .await?
            .into_iter()
            .filter(Resource::is_server)
            .find(|r| r.matches(ident))
            .ok_or_else(|| PlexportError::ResourceNotFound(ident.to_string()))
    }

    /// Discover the server named `ident` and connect to it.
    pub async fn connect(&self, ident: &str) -> Result<PlexServer> {
        let resource = self.resource(ident).await?;
        resource.connect(&self.client, &self.token).await
    }
}
