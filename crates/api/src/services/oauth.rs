//! Federated login against Google and Facebook.
//!
//! Implements the server side of the authorization-code flow: build the
//! consent URL, then exchange the returned code for the provider's identity
//! assertion. Account lookup and linking happen in the auth service.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::{OAuthConfig, OAuthProviderConfig};
use crate::models::user::FederatedProvider;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const FACEBOOK_AUTH_URL: &str = "https://www.facebook.com/v18.0/dialog/oauth";
const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/v18.0/oauth/access_token";
const FACEBOOK_USERINFO_URL: &str = "https://graph.facebook.com/me";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the federated login flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The provider's credentials are not configured.
    #[error("{0} login is not configured")]
    NotConfigured(FederatedProvider),

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the code exchange.
    #[error("code exchange rejected (status {0})")]
    Exchange(u16),

    /// The provider's profile has no email address we can link on.
    #[error("provider returned no email address")]
    MissingEmail,
}

/// Identity assertion from a completed code exchange.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub provider: FederatedProvider,
    pub provider_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProviderProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

/// Client for federated identity providers.
#[derive(Clone)]
pub struct OAuthService {
    http: reqwest::Client,
    config: OAuthConfig,
    /// Public base URL of this API; callback URLs are built from it.
    base_url: String,
}

impl OAuthService {
    /// Build a client from the OAuth configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the HTTP client cannot be built;
    /// a client without the request timeout must not slip through.
    pub fn new(config: OAuthConfig, base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            config,
            base_url: base_url.into(),
        })
    }

    /// The consent URL to redirect the browser to.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::NotConfigured` when the provider has no
    /// credentials.
    pub fn authorize_url(&self, provider: FederatedProvider) -> Result<String, OAuthError> {
        let credentials = self
            .provider_config(provider)
            .ok_or(OAuthError::NotConfigured(provider))?;

        let (endpoint, scope) = match provider {
            FederatedProvider::Google => (GOOGLE_AUTH_URL, "openid email profile"),
            FederatedProvider::Facebook => (FACEBOOK_AUTH_URL, "email,public_profile"),
        };

        let mut url = Url::parse(endpoint).map_err(|_| OAuthError::NotConfigured(provider))?;
        url.query_pairs_mut()
            .append_pair("client_id", &credentials.client_id)
            .append_pair("redirect_uri", &self.redirect_uri(provider))
            .append_pair("response_type", "code")
            .append_pair("scope", scope);

        Ok(url.into())
    }

    /// Exchange an authorization code for the provider's identity assertion.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Exchange` when the provider rejects the code,
    /// `OAuthError::MissingEmail` when the profile carries no email.
    pub async fn exchange_code(
        &self,
        provider: FederatedProvider,
        code: &str,
    ) -> Result<FederatedIdentity, OAuthError> {
        let credentials = self
            .provider_config(provider)
            .ok_or(OAuthError::NotConfigured(provider))?;

        let access_token = self.fetch_token(provider, credentials, code).await?;
        let profile = self.fetch_profile(provider, &access_token).await?;

        let email = profile.email.ok_or(OAuthError::MissingEmail)?;
        let name = profile.name.unwrap_or_else(|| email.clone());

        Ok(FederatedIdentity {
            provider,
            provider_id: profile.id,
            email,
            name,
        })
    }

    async fn fetch_token(
        &self,
        provider: FederatedProvider,
        credentials: &OAuthProviderConfig,
        code: &str,
    ) -> Result<String, OAuthError> {
        let redirect_uri = self.redirect_uri(provider);
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        let endpoint = match provider {
            FederatedProvider::Google => GOOGLE_TOKEN_URL,
            FederatedProvider::Facebook => FACEBOOK_TOKEN_URL,
        };

        let response = self.http.post(endpoint).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(OAuthError::Exchange(response.status().as_u16()));
        }

        Ok(response.json::<TokenResponse>().await?.access_token)
    }

    async fn fetch_profile(
        &self,
        provider: FederatedProvider,
        access_token: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        let request = match provider {
            FederatedProvider::Google => self
                .http
                .get(GOOGLE_USERINFO_URL)
                .bearer_auth(access_token),
            FederatedProvider::Facebook => self
                .http
                .get(FACEBOOK_USERINFO_URL)
                .query(&[("fields", "id,name,email"), ("access_token", access_token)]),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(OAuthError::Exchange(response.status().as_u16()));
        }

        Ok(response.json::<ProviderProfile>().await?)
    }

    fn redirect_uri(&self, provider: FederatedProvider) -> String {
        format!("{}/auth/{provider}/callback", self.base_url)
    }

    const fn provider_config(&self, provider: FederatedProvider) -> Option<&OAuthProviderConfig> {
        match provider {
            FederatedProvider::Google => self.config.google.as_ref(),
            FederatedProvider::Facebook => self.config.facebook.as_ref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn service() -> OAuthService {
        OAuthService::new(
            OAuthConfig {
                google: Some(OAuthProviderConfig {
                    client_id: "google-client".to_owned(),
                    client_secret: SecretString::from("g-secret"),
                }),
                facebook: None,
            },
            "https://api.shop.example",
        )
        .unwrap()
    }

    #[test]
    fn test_authorize_url_includes_callback() {
        let url = service().authorize_url(FederatedProvider::Google).unwrap();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains("response_type=code"));
        assert!(
            url.contains("redirect_uri=https%3A%2F%2Fapi.shop.example%2Fauth%2Fgoogle%2Fcallback")
        );
    }

    #[test]
    fn test_unconfigured_provider_rejected() {
        let result = service().authorize_url(FederatedProvider::Facebook);
        assert!(matches!(result, Err(OAuthError::NotConfigured(_))));
    }
}
