//! REST client for the hosted auth service.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::IdentityError;
use super::types::{Identity, NewUser, UserRecord, UserUpdate};
use super::TokenVerifier;

/// Page size for the admin user listing.
pub const ADMIN_PAGE_SIZE: usize = 1000;

/// Admin listing responses wrap the accounts in a `users` field.
#[derive(Debug, Deserialize)]
struct UsersPage {
    users: Vec<UserRecord>,
}

/// Client for the hosted auth service.
///
/// Token verification uses the caller's bearer token; admin calls use the
/// configured service key.
pub struct IdentityService {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl IdentityService {
    /// Create a new client against the given auth service.
    #[must_use]
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    /// Base URL of the auth service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First characters of the service key plus its length, for the
    /// diagnostics endpoint. Never exposes the whole key.
    #[must_use]
    pub fn service_key_hint(&self) -> (String, usize) {
        (
            self.service_key.chars().take(20).collect(),
            self.service_key.chars().count(),
        )
    }

    /// Resolve a bearer token to the account it belongs to.
    ///
    /// # Errors
    ///
    /// Every failure mode collapses to [`IdentityError::Unauthenticated`]:
    /// an empty token, a network failure, an upstream rejection, or a
    /// malformed response all mean the caller is not authenticated.
    pub async fn verify_token(&self, raw: &str) -> Result<Identity, IdentityError> {
        let token = clean_token(raw);
        if token.is_empty() {
            return Err(IdentityError::Unauthenticated);
        }

        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(&token)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "auth service unreachable during token verification");
                IdentityError::Unauthenticated
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "token rejected by auth service");
            return Err(IdentityError::Unauthenticated);
        }

        response
            .json::<Identity>()
            .await
            .map_err(|_| IdentityError::Unauthenticated)
    }

    /// Fetch one page of accounts from the admin listing.
    ///
    /// # Errors
    ///
    /// Returns an error when the auth service call fails.
    pub async fn fetch_users_page(&self, page: usize) -> Result<Vec<UserRecord>, IdentityError> {
        let response = self
            .http
            .get(format!("{}/auth/v1/admin/users", self.base_url))
            .query(&[("page", page), ("per_page", ADMIN_PAGE_SIZE)])
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::service(format!(
                "list users failed with {status}: {body}"
            )));
        }

        Ok(response.json::<UsersPage>().await?.users)
    }

    /// List all accounts, paging until a short page.
    ///
    /// # Errors
    ///
    /// Returns an error when any page fetch fails.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError> {
        // Plain loop rather than collect_paged: the returned future must
        // stay Send for the handlers that call this.
        let mut users = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.fetch_users_page(page).await?;
            let batch_len = batch.len();
            users.extend(batch);
            if batch_len < ADMIN_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(users)
    }

    /// Create an account with the email pre-confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error when the auth service rejects the account.
    pub async fn create_user(&self, new_user: &NewUser) -> Result<UserRecord, IdentityError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/admin/users", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({
                "email": new_user.email,
                "password": new_user.password,
                "email_confirm": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::service(format!(
                "create user failed with {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Apply a partial update to an account.
    ///
    /// # Errors
    ///
    /// Returns an error when the auth service rejects the update.
    pub async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserUpdate,
    ) -> Result<UserRecord, IdentityError> {
        let response = self
            .http
            .put(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::service(format!(
                "update user failed with {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Remove an account, including its sign-in identity.
    ///
    /// # Errors
    ///
    /// Returns an error when the auth service rejects the removal.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .http
            .delete(format!("{}/auth/v1/admin/users/{user_id}", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::service(format!(
                "delete user failed with {status}: {body}"
            )));
        }

        Ok(())
    }

    /// Check outbound connectivity for the diagnostics endpoint.
    ///
    /// # Errors
    ///
    /// Returns the transport error message when the probe request fails.
    pub async fn connectivity_probe(&self) -> Result<u16, String> {
        self.http
            .get("https://www.google.com")
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().as_u16())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TokenVerifier for IdentityService {
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError> {
        IdentityService::verify_token(self, token).await
    }
}

/// Strip whitespace and quote characters out of a raw token.
///
/// Tokens arrive copy-pasted through headers and occasionally carry
/// stray quoting or embedded line breaks.
#[must_use]
pub fn clean_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
        .collect()
}

/// Collect every item from a paged listing.
///
/// Fetches pages starting at 1 and stops after the first page shorter
/// than `per_page`. A full final page costs one extra empty fetch.
///
/// # Errors
///
/// Propagates the first fetch error.
pub async fn collect_paged<T, F>(per_page: usize, mut fetch: F) -> Result<Vec<T>, IdentityError>
where
    F: AsyncFnMut(usize) -> Result<Vec<T>, IdentityError>,
{
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch(page).await?;
        let batch_len = batch.len();
        all.extend(batch);
        if batch_len < per_page {
            break;
        }
        page += 1;
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    #[case("abc.def.ghi", "abc.def.ghi")]
    #[case("  abc.def.ghi\n", "abc.def.ghi")]
    #[case("\"abc.def.ghi\"", "abc.def.ghi")]
    #[case("'abc'", "abc")]
    #[case("a b\tc", "abc")]
    #[case("", "")]
    fn clean_token_strips_noise(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_token(raw), expected);
    }

    #[tokio::test]
    async fn collect_paged_stops_on_short_page() {
        let pages = vec![vec![0u8; 3], vec![0u8; 3], vec![0u8; 1]];
        let calls = AtomicUsize::new(0);

        let all = collect_paged(3, async |page| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(pages[page - 1].clone())
        })
        .await
        .unwrap();

        assert_eq!(all.len(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn collect_paged_single_short_page() {
        let all = collect_paged(1000, async |_page| Ok(vec![0u8; 400]))
            .await
            .unwrap();
        assert_eq!(all.len(), 400);
    }

    #[tokio::test]
    async fn collect_paged_empty_first_page() {
        let all: Vec<u8> = collect_paged(1000, async |_page| Ok(Vec::new()))
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn collect_paged_propagates_errors() {
        let result: Result<Vec<u8>, _> = collect_paged(3, async |page| {
            if page == 2 {
                Err(IdentityError::service("boom"))
            } else {
                Ok(vec![0u8; 3])
            }
        })
        .await;
        assert!(matches!(result, Err(IdentityError::Service(_))));
    }

    #[tokio::test]
    async fn verify_token_rejects_empty_and_quoted_empty() {
        let service = IdentityService::new("http://127.0.0.1:1", "key");
        assert!(matches!(
            service.verify_token("").await,
            Err(IdentityError::Unauthenticated)
        ));
        assert!(matches!(
            service.verify_token("\"  \"").await,
            Err(IdentityError::Unauthenticated)
        ));
    }

    #[test]
    fn list_users_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let service = IdentityService::new("http://127.0.0.1:1", "key");
        assert_send(service.list_users());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let service = IdentityService::new("https://auth.example.com/", "key");
        assert_eq!(service.base_url(), "https://auth.example.com");
    }
}
