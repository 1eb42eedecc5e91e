//! OAuth2 implicit grant against Google
//!
//! Only the two ends of the browser flow live here: building the
//! authorization URL and reading the token back out of the redirect URL
//! fragment. Refresh and revocation are not supported.

use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::OAuthConfig;
use crate::credentials::Credential;
use crate::types::error::StoreError;

/// Errors that can occur during OAuth operations
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("Redirect carries no access token")]
    MissingToken,

    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),
}

impl From<OAuthError> for StoreError {
    fn from(err: OAuthError) -> Self {
        StoreError::Auth(err.to_string())
    }
}

/// An authorization request ready to open in the browser
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    /// State to check against the redirect
    pub state: String,
}

/// Token handed back in the redirect fragment
#[derive(Debug, Clone)]
pub struct ImplicitGrant {
    pub credential: Credential,
    pub expires_in: Option<u64>,
    pub scopes: Vec<String>,
}

/// Build the implicit-grant (`response_type=token`) authorization URL
pub fn authorization_url(config: &OAuthConfig) -> Result<AuthorizationRequest, OAuthError> {
    let client_id = config
        .client_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| OAuthError::Configuration("oauth.client_id is not set".to_string()))?;

    let state = generate_state_token();

    let client = BasicClient::new(ClientId::new(client_id))
        .set_auth_uri(
            AuthUrl::new(config.auth_url.clone())
                .map_err(|e| OAuthError::Configuration(e.to_string()))?,
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri.clone())
                .map_err(|e| OAuthError::Configuration(e.to_string()))?,
        );

    let mut auth_request = client
        .authorize_url(|| CsrfToken::new(state.clone()))
        .use_implicit_flow();

    for scope in &config.scopes {
        auth_request = auth_request.add_scope(Scope::new(scope.clone()));
    }

    let (url, _) = auth_request.url();
    info!("Built authorization URL with {} scope(s)", config.scopes.len());

    Ok(AuthorizationRequest {
        url: url.to_string(),
        state,
    })
}

/// Read the access token (or the provider's error) from a redirect URL
pub fn parse_redirect_fragment(
    redirect: &str,
    expected_state: &str,
) -> Result<ImplicitGrant, OAuthError> {
    let url = Url::parse(redirect).map_err(|e| OAuthError::InvalidRedirect(e.to_string()))?;
    let fragment = url
        .fragment()
        .ok_or_else(|| OAuthError::InvalidRedirect("no fragment".to_string()))?;

    let mut access_token = None;
    let mut state = None;
    let mut error = None;
    let mut expires_in = None;
    let mut scopes = Vec::new();

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse().ok(),
            "scope" => scopes = value.split_whitespace().map(str::to_string).collect(),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(OAuthError::Denied(error));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(OAuthError::InvalidState);
    }

    let access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or(OAuthError::MissingToken)?;
    debug!("Access token received, expires in {:?}s", expires_in);

    Ok(ImplicitGrant {
        credential: Credential::new(access_token),
        expires_in,
        scopes,
    })
}

/// Generate a random state token
fn generate_state_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    mail_codec::encode_bytes(&bytes)
}
