//! OAuth 2.0 management for YouTube API authentication.
//!
//! Implements the installed-application flow: the user's browser is sent to Google's
//! consent page and the authorization code comes back to a one-shot HTTP server on a
//! loopback port. Refreshing an existing token needs no user interaction.

use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RequestTokenError, RevocationUrl, Scope, TokenResponse,
    TokenUrl,
};
use std::future::Future;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Used for both the initial code exchange and token refresh.
const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";
const REVOCATION_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Scopes needed to upload videos, set thumbnails and manage playlists.
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.upload",
];

const DEFAULT_DONE_HTML: &str = "<html><body><p>YouTube access granted. \
    You can close this window.</p></body></html>";

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Handles the OAuth flows for one Google API client registration.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    client_id: String,
    client_secret: String,
    oauth_done_html: String,
}

impl OAuthManager {
    /// Creates a manager for the given OAuth client credentials.
    ///
    /// For installed applications the client secret is not actually secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            oauth_done_html: DEFAULT_DONE_HTML.to_string(),
        }
    }

    /// Replaces the page shown in the browser once authorization completes.
    pub fn with_done_html(mut self, html: impl Into<String>) -> Self {
        self.oauth_done_html = html.into();
        self
    }

    fn client(&self) -> eyre::Result<ConfiguredClient> {
        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_string()).context("parse auth url")?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string()).context("parse token url")?))
    }

    fn http_client() -> eyre::Result<oauth2::reqwest::Client> {
        oauth2::reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")
    }

    /// Runs the full authorization flow and returns a new token.
    ///
    /// Opens the user's browser on Google's consent page, waits for the redirect on a
    /// local port, and exchanges the authorization code (with PKCE) for a token.
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let client = self
            .client()?
            .set_redirect_uri(redirect_url)
            .set_revocation_url(
                RevocationUrl::new(REVOCATION_URL.to_string()).context("parse revocation url")?,
            );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // The flow runs exactly once, so the CSRF token is never re-used.
            .authorize_url(move || csrf.clone())
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        webbrowser::open(auth_url.as_ref()).context("open user's browser")?;
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&Self::http_client()?)
            .await
            .context("exchange authorization code with access token")
    }

    /// Exchanges the token's refresh token for a new access token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - Refresh succeeded
    /// * `Ok(None)` - No refresh token, or Google rejected it as an invalid grant;
    ///   the user has to go through [`Self::authenticate`] again
    /// * `Err(_)` - Network or other error occurred during the refresh attempt
    pub async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");
        let result = self
            .client()?
            .exchange_refresh_token(refresh_token)
            .request_async(&Self::http_client()?)
            .await;

        match result {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ RequestTokenError::ServerResponse(ref sr))
                if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Starts a one-shot HTTP server on a random loopback port for the OAuth redirect.
    ///
    /// Returns the redirect URL together with a future that resolves to the authorization
    /// code once the browser has been redirected with a matching `state`.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        let oauth_done = Bytes::from(self.oauth_done_html.clone());
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    let oauth_done = oauth_done.clone();
                    async move {
                        let code = authorization_code_from_query(
                            req.uri().query().unwrap_or(""),
                            &csrf,
                        )?;
                        if got.send(code).await.is_err() {
                            return Err("redirect listener went away");
                        }
                        Ok(Response::new(Full::new(oauth_done)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                let code = tokio::select! {
                    exit = &mut serve => match exit {
                        Err(e) => return Err(e).context("redirect server got bad request"),
                        Ok(()) => eyre::bail!("redirect server exit prematurely"),
                    },
                    code = gotten.recv() => code,
                };
                // Let the browser get its "done" page before the server goes away.
                serve.as_mut().graceful_shutdown();
                let _ = serve.await;
                code.ok_or_else(|| eyre::eyre!("redirect service dropped without a code"))
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// Pulls the authorization code out of the redirect's query string.
///
/// The `state` parameter must match the CSRF token the flow was started with.
fn authorization_code_from_query(
    query: &str,
    csrf: &CsrfToken,
) -> Result<AuthorizationCode, &'static str> {
    let mut presented_state = None;
    let mut presented_code = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token");
    }
    let Some(code) = presented_code else {
        return Err("no authorization code found");
    };
    Ok(AuthorizationCode::new(code.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_requires_matching_state() {
        let csrf = CsrfToken::new("expected".to_string());
        let code = authorization_code_from_query("state=expected&code=4%2Fabc&scope=x", &csrf)
            .unwrap();
        assert_eq!(code.secret(), "4/abc");

        assert_eq!(
            authorization_code_from_query("state=other&code=abc", &csrf).unwrap_err(),
            "invalid csrf token"
        );
        assert_eq!(
            authorization_code_from_query("state=expected", &csrf).unwrap_err(),
            "no authorization code found"
        );
    }
}
