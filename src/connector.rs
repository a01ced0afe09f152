//! Server connection with account discovery and direct fallback.

use std::fmt;

use reqwest::Client;
use tracing::{info, warn};

use crate::api::account::{PlexAccount, PLEX_TV_URL};
use crate::api::{plex_client, server, PlexServer};
use crate::error::{PlexportError, Result};

/// Which strategy produced the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMethod {
    /// Discovered through the plex.tv account.
    Account,
    /// Direct address + token connection.
    Direct,
}

impl fmt::Display for ConnectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectMethod::Account => f.write_str("Plex account"),
            ConnectMethod::Direct => f.write_str("direct connection"),
        }
    }
}

/// An established session and how it was obtained.
#[derive(Debug)]
pub struct Session {
    pub server: PlexServer,
    pub method: ConnectMethod,
}

/// Establishes a [`Session`] with a Plex server.
///
/// The account path is tried first; on any failure the direct path is
/// tried. Each is attempted exactly once.
#[derive(Debug, Clone)]
pub struct Connector {
    client: Client,
    account_url: String,
}

impl Connector {
    /// Create a connector that discovers servers through plex.tv.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: plex_client()?,
            account_url: PLEX_TV_URL.to_string(),
        })
    }

    /// Use a different account endpoint.
    pub fn with_account_url<S: Into<String>>(mut self, url: S) -> Self {
        self.account_url = url.into();
        self
    }

    /// Fetch the raw root response of `address`.
    pub async fn probe(&self, address: &str, token: &str) -> Result<String> {
        server::probe(&self.client, address, token).await
    }

    /// Connect to the server at `address`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` only when both strategies fail.
    pub async fn connect(&self, address: &str, token: &str) -> Result<Session> {
        let account_error = match self.connect_via_account(address, token).await {
            Ok(server) => {
                let method = ConnectMethod::Account;
                log_connected(&server, method);
                return Ok(Session { server, method });
            }
            Err(e) => {
                warn!("Failed to connect using Plex account: {}", e);
                e
            }
        };

        match PlexServer::connect(self.client.clone(), address, token).await {
            Ok(server) => {
                let method = ConnectMethod::Direct;
                log_connected(&server, method);
                Ok(Session { server, method })
            }
            Err(direct_error) => Err(PlexportError::ConnectionFailed {
                account: account_error.to_string(),
                direct: direct_error.to_string(),
            }),
        }
    }

    async fn connect_via_account(&self, address: &str, token: &str) -> Result<PlexServer> {
        let account = PlexAccount::new(self.client.clone(), &self.account_url, token).await?;
        account.connect(address).await
    }
}

fn log_connected(server: &PlexServer, method: ConnectMethod) {
    info!(
        "Successfully connected to Plex server {} ({}) using {}",
        server.base_url(),
        server
            .identity()
            .machine_identifier
            .as_deref()
            .unwrap_or("unknown"),
        method
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TOKEN_HEADER;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn rejecting_plex_tv() -> MockServer {
        let plex_tv = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/user"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&plex_tv)
            .await;
        plex_tv
    }

    #[tokio::test]
    async fn test_falls_back_to_direct() {
        let plex_tv = rejecting_plex_tv().await;
        let media = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/identity"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"MediaContainer": {"machineIdentifier": "m"}})),
            )
            .expect(1)
            .mount(&media)
            .await;

        let connector = Connector::new().unwrap().with_account_url(plex_tv.uri());
        let session = connector.connect(&media.uri(), "tok").await.unwrap();

        assert_eq!(session.method, ConnectMethod::Direct);
        assert_eq!(session.server.token(), "tok");
    }

    #[tokio::test]
    async fn test_account_success_skips_direct() {
        let plex_tv = MockServer::start().await;
        let media = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "me"})))
            .expect(1)
            .mount(&plex_tv)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "Home",
                "provides": "server",
                "accessToken": "scoped",
                "connections": [{"uri": media.uri(), "local": true}]
            }])))
            .expect(1)
            .mount(&plex_tv)
            .await;
        Mock::given(method("GET"))
            .and(path("/identity"))
            .and(header(TOKEN_HEADER, "scoped"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"MediaContainer": {"machineIdentifier": "m"}})),
            )
            .expect(1)
            .mount(&media)
            .await;
        Mock::given(method("GET"))
            .and(path("/identity"))
            .and(header(TOKEN_HEADER, "tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&media)
            .await;

        let connector = Connector::new().unwrap().with_account_url(plex_tv.uri());
        let session = connector.connect(&media.uri(), "tok").await.unwrap();

        assert_eq!(session.method, ConnectMethod::Account);
        assert_eq!(session.server.token(), "scoped");
    }

    #[tokio::test]
    async fn test_both_strategies_fail() {
        let plex_tv = rejecting_plex_tv().await;
        let media = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/identity"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&media)
            .await;

        let connector = Connector::new().unwrap().with_account_url(plex_tv.uri());
        let err = connector.connect(&media.uri(), "tok").await.unwrap_err();

        match err {
            PlexportError::ConnectionFailed { account, direct } => {
                assert!(account.contains("Bad credentials"));
                assert!(direct.contains("500"));
            }
            other => panic!("expected ConnectionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ConnectMethod::Account.to_string(), "Plex account");
        assert_eq!(ConnectMethod::Direct.to_string(), "direct connection");
    }
}
