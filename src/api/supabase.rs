//! Supabase client (GoTrue auth + PostgREST rows over HTTPS)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Connection;
use crate::error::{BackendError, BackendResult};
use crate::models::{
    Book, BookStatus, BookUpdate, ExchangeRequest, ExchangeRequestDetails, ExchangeStatus,
    NewBook, NewExchangeRequest, NewProfile, Profile, ProfileUpdate,
};

use super::{AuthSession, AuthUser, Backend};

/// Embeds both books of an exchange request
const EXCHANGE_DETAILS_SELECT: &str =
    "*,requested_book:books!requested_book_id(*),offered_book:books!offered_book_id(*)";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Lifetime assumed when the token response carries no expiry
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Supabase API client
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    application_name: String,
}

impl SupabaseClient {
    /// Create a client for a resolved connection
    pub fn new(connection: &Connection) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(connection.timeout_secs))
            .user_agent(concat!("bookswap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: connection.url.trim_end_matches('/').to_string(),
            anon_key: connection.anon_key.clone(),
            application_name: connection.application_name.clone(),
        })
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, endpoint)
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, query)
        }
    }

    /// Request carrying the headers every call needs
    fn request(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
            .header("x-application-name", &self.application_name)
    }

    async fn token_request(&self, url: &str, body: serde_json::Value) -> BackendResult<AuthSession> {
        let response = self
            .request(Method::POST, url, &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let response = check_auth(response).await?;
        let token: TokenResponse = decode(response).await?;
        Ok(token.into_session(Utc::now()))
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        session: &AuthSession,
        table: &str,
        query: &str,
    ) -> BackendResult<Vec<T>> {
        let url = self.rest_url(table, query);
        let response = self
            .request(Method::GET, &url, &session.access_token)
            .send()
            .await?;
        decode(check_rest(response).await?).await
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        session: &AuthSession,
        table: &str,
        query: &str,
    ) -> BackendResult<T> {
        let url = self.rest_url(table, query);
        let response = self
            .request(Method::GET, &url, &session.access_token)
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await?;
        decode(check_rest(response).await?).await
    }

    /// Insert one row and return it
    async fn insert_row<B, T>(&self, session: &AuthSession, table: &str, row: &B) -> BackendResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.rest_url(table, "");
        let response = self
            .request(Method::POST, &url, &session.access_token)
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(row)
            .send()
            .await?;
        decode(check_rest(response).await?).await
    }

    /// Patch the row with this id and return it
    async fn update_row<B, T>(
        &self,
        session: &AuthSession,
        table: &str,
        id: Uuid,
        patch: &B,
    ) -> BackendResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.rest_url(table, &format!("id=eq.{id}"));
        let response = self
            .request(Method::PATCH, &url, &session.access_token)
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(patch)
            .send()
            .await?;
        decode(check_rest(response).await?).await
    }

    /// Exact row count for a filter, read from `Content-Range`
    async fn count(&self, session: &AuthSession, table: &str, query: &str) -> BackendResult<u64> {
        let url = self.rest_url(table, &format!("select=id&{query}"));
        let response = self
            .request(Method::HEAD, &url, &session.access_token)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check_rest(response).await?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BackendError::Decode("missing Content-Range header".to_string()))?;

        parse_content_range(range)
            .ok_or_else(|| BackendError::Decode(format!("bad Content-Range header {range:?}")))
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let url = self.auth_url("/token?grant_type=password");
        self.token_request(
            &url,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let url = self.auth_url("/signup");
        let response = self
            .request(Method::POST, &url, &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = check_auth(response).await?;

        // Without auto-confirm the service returns just the user, no tokens
        let body: serde_json::Value = decode(response).await?;
        if body.get("access_token").is_none() {
            return Err(BackendError::ConfirmationRequired);
        }
        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(token.into_session(Utc::now()))
    }

    async fn sign_out(&self, session: &AuthSession) -> BackendResult<()> {
        let url = self.auth_url("/logout");
        let response = self
            .request(Method::POST, &url, &session.access_token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(logout_error(status, &body))
    }

    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let url = self.auth_url("/token?grant_type=refresh_token");
        self.token_request(&url, serde_json::json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn current_user(&self, session: &AuthSession) -> BackendResult<AuthUser> {
        let url = self.auth_url("/user");
        let response = self
            .request(Method::GET, &url, &session.access_token)
            .send()
            .await?;
        let response = match check_auth(response).await {
            Err(BackendError::Auth { .. }) => return Err(BackendError::Unauthorized),
            other => other?,
        };
        decode(response).await
    }

    async fn get_profile(&self, session: &AuthSession, id: Uuid) -> BackendResult<Profile> {
        self.fetch_one(session, "profiles", &format!("select=*&id=eq.{id}"))
            .await
    }

    async fn insert_profile(
        &self,
        session: &AuthSession,
        profile: &NewProfile,
    ) -> BackendResult<Profile> {
        self.insert_row(session, "profiles", profile).await
    }

    async fn update_profile(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> BackendResult<Profile> {
        self.update_row(session, "profiles", id, update).await
    }

    async fn available_books(&self, session: &AuthSession) -> BackendResult<Vec<Book>> {
        let query = format!("select=*&status=eq.{}", BookStatus::Available.as_str());
        self.fetch_list(session, "books", &query).await
    }

    async fn books_by_owner(
        &self,
        session: &AuthSession,
        owner: Uuid,
        status: Option<BookStatus>,
    ) -> BackendResult<Vec<Book>> {
        let mut query = format!("select=*&owner_id=eq.{owner}");
        if let Some(status) = status {
            query.push_str(&format!("&status=eq.{}", status.as_str()));
        }
        self.fetch_list(session, "books", &query).await
    }

    async fn get_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<Book> {
        self.fetch_one(session, "books", &format!("select=*&id=eq.{id}"))
            .await
    }

    async fn insert_book(&self, session: &AuthSession, book: &NewBook) -> BackendResult<Book> {
        self.insert_row(session, "books", book).await
    }

    async fn update_book(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &BookUpdate,
    ) -> BackendResult<Book> {
        self.update_row(session, "books", id, update).await
    }

    async fn delete_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<()> {
        let url = self.rest_url("books", &format!("id=eq.{id}"));
        let response = self
            .request(Method::DELETE, &url, &session.access_token)
            .send()
            .await?;
        check_rest(response).await?;
        Ok(())
    }

    async fn insert_exchange_request(
        &self,
        session: &AuthSession,
        request: &NewExchangeRequest,
    ) -> BackendResult<ExchangeRequest> {
        self.insert_row(session, "exchange_requests", request).await
    }

    async fn exchange_requests_for(
        &self,
        session: &AuthSession,
        profile: Uuid,
    ) -> BackendResult<Vec<ExchangeRequestDetails>> {
        let query = format!(
            "select={}&{}&order=created_at.desc",
            urlencoding::encode(EXCHANGE_DETAILS_SELECT),
            involves_filter(profile)
        );
        self.fetch_list(session, "exchange_requests", &query).await
    }

    async fn update_exchange_status(
        &self,
        session: &AuthSession,
        id: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<ExchangeRequest> {
        self.update_row(
            session,
            "exchange_requests",
            id,
            &serde_json::json!({ "status": status }),
        )
        .await
    }

    async fn count_books(&self, session: &AuthSession, owner: Uuid) -> BackendResult<u64> {
        self.count(session, "books", &format!("owner_id=eq.{owner}"))
            .await
    }

    async fn count_exchange_requests(
        &self,
        session: &AuthSession,
        profile: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<u64> {
        let query = format!("status=eq.{}&{}", status.as_str(), involves_filter(profile));
        self.count(session, "exchange_requests", &query).await
    }
}

/// `or=(requester_id.eq.X,owner_id.eq.X)`, URL-encoded
fn involves_filter(profile: Uuid) -> String {
    let filter = format!("(requester_id.eq.{profile},owner_id.eq.{profile})");
    format!("or={}", urlencoding::encode(&filter))
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Map a non-success auth response to a typed error
async fn check_auth(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(auth_error(status, &body))
}

/// Map a non-success row response to a typed error
async fn check_rest(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(rest_error(status, &body))
}

fn auth_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| fallback_message(status, body));

    match status.as_u16() {
        400 | 401 | 403 | 422 | 429 => BackendError::Auth { message },
        code => BackendError::Request {
            status: code,
            message,
        },
    }
}

/// A token the service no longer knows means the session already ended
fn logout_error(status: StatusCode, body: &str) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            BackendError::Unauthorized
        }
        _ => auth_error(status, body),
    }
}

fn rest_error(status: StatusCode, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone()).unwrap_or_default();
    let message = parsed
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| fallback_message(status, body));

    // 23505 = unique_violation, PGRST116 = single-object request matched no row
    match (status.as_u16(), code.as_str()) {
        (_, "23505") | (409, _) => BackendError::Conflict { message },
        (_, "PGRST116") | (404, _) => BackendError::NotFound,
        (401 | 403, _) => BackendError::Unauthorized,
        (status, _) => BackendError::Request { status, message },
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                now + chrono::Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Union of the GoTrue and PostgREST error bodies
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&Connection {
            url: "https://abc.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
            application_name: "bookswap".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_logout_with_dead_token_is_session_invalid() {
        let body = r#"{"msg":"invalid JWT: token is expired"}"#;
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN, StatusCode::NOT_FOUND] {
            assert!(logout_error(status, body).is_session_invalid());
        }
        let err = logout_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, BackendError::Request { status: 502, .. }));
        assert!(!err.is_session_invalid());
    }

    #[test]
    fn test_urls() {
        let c = client();
        assert_eq!(
            c.auth_url("/token?grant_type=password"),
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            c.rest_url("books", "select=*&status=eq.available"),
            "https://abc.supabase.co/rest/v1/books?select=*&status=eq.available"
        );
        assert_eq!(c.rest_url("books", ""), "https://abc.supabase.co/rest/v1/books");
    }

    #[test]
    fn test_involves_filter_is_encoded() {
        let id = Uuid::nil();
        let filter = involves_filter(id);
        assert!(filter.starts_with("or=%28requester_id.eq."));
        assert!(filter.contains("%2Cowner_id.eq."));
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_auth_error_uses_description() {
        let err = auth_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(err, BackendError::Auth { message } if message == "Invalid login credentials"));

        let err = auth_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"msg":"User already registered"}"#);
        assert!(matches!(err, BackendError::Auth { message } if message == "User already registered"));
    }

    #[test]
    fn test_auth_error_server_failure() {
        let err = auth_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, BackendError::Request { status: 502, .. }));
    }

    #[test]
    fn test_rest_error_mapping() {
        let conflict = rest_error(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint \"profiles_username_key\""}"#,
        );
        assert!(matches!(conflict, BackendError::Conflict { .. }));

        let missing = rest_error(
            StatusCode::NOT_ACCEPTABLE,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        assert!(matches!(missing, BackendError::NotFound));

        let denied = rest_error(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#);
        assert!(matches!(denied, BackendError::Unauthorized));

        let other = rest_error(StatusCode::BAD_REQUEST, r#"{"code":"22P02","message":"bad uuid"}"#);
        assert!(matches!(other, BackendError::Request { status: 400, message } if message == "bad uuid"));
    }

    #[test]
    fn test_token_response_expiry() {
        let now = Utc::now();
        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "11111111-1111-1111-1111-111111111111", "email": "a@b.c" }
        });
        let token: TokenResponse = serde_json::from_value(json).unwrap();
        let session = token.into_session(now);
        assert_eq!(session.expires_at, now + chrono::Duration::seconds(3600));
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));

        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_at": 1_700_000_000,
            "user": { "id": "11111111-1111-1111-1111-111111111111" }
        });
        let token: TokenResponse = serde_json::from_value(json).unwrap();
        assert_eq!(token.into_session(now).expires_at.timestamp(), 1_700_000_000);
    }
}
