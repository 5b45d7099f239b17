//! Supabase-style REST collaborator: PostgREST for rows, GoTrue for sessions.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use crate::model::{VocabEntry, VocabRow};
use crate::store::{AuthProvider, Session, StoreError, VocabStore};

const TABLE: &str = "vocab_entry";

#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, anon_key)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            anon_key: anon_key.into(),
            client,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    fn user_filter(session: &Session) -> (&'static str, String) {
        ("user_id", format!("eq.{}", session.user_id))
    }
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Deserialize)]
struct SimplifiedRow {
    simplified: String,
}

#[derive(Deserialize)]
struct BackendMessage {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

/// Turns a non-2xx response into the backend's own message.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendMessage>(&body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error).or(parsed.msg))
        .unwrap_or_else(|| format!("backend responded with {status}"));
    Err(StoreError::Backend(message))
}

/// Builds a PostgREST `in.(...)` filter, quoting every value.
fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|value| format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn total_from_content_range(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit('/').next())
        .and_then(|total| total.trim().parse().ok())
}

#[async_trait]
impl VocabStore for RestStore {
    async fn find_id(
        &self,
        session: &Session,
        simplified: &str,
    ) -> Result<Option<String>, StoreError> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", "id".to_string()),
            Self::user_filter(session),
            ("simplified", format!("eq.{simplified}")),
            ("limit", "1".to_string()),
        ]);
        let response = check(self.authorized(request, session).send().await?).await?;
        let rows: Vec<IdRow> = response.json().await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn existing(
        &self,
        session: &Session,
        simplified: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if simplified.is_empty() {
            return Ok(HashSet::new());
        }
        let request = self.client.get(self.table_url()).query(&[
            ("select", "simplified".to_string()),
            Self::user_filter(session),
            ("simplified", in_filter(simplified)),
        ]);
        let response = check(self.authorized(request, session).send().await?).await?;
        let rows: Vec<SimplifiedRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.simplified).collect())
    }

    async fn list(&self, session: &Session) -> Result<Vec<VocabEntry>, StoreError> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            Self::user_filter(session),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = check(self.authorized(request, session).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn insert(
        &self,
        session: &Session,
        rows: Vec<VocabRow>,
    ) -> Result<Vec<String>, StoreError> {
        debug!(rows = rows.len(), user = %session.user_id, "Inserting vocab rows");
        let request = self
            .client
            .post(self.table_url())
            .query(&[("columns", VocabRow::COLUMNS), ("select", "id")])
            .header("Prefer", "return=representation")
            .json(&rows);
        let response = check(self.authorized(request, session).send().await?).await?;
        let inserted: Vec<IdRow> = response.json().await?;
        Ok(inserted.into_iter().map(|row| row.id).collect())
    }

    async fn delete(&self, session: &Session, simplified: &str) -> Result<u64, StoreError> {
        let request = self
            .client
            .delete(self.table_url())
            .query(&[
                ("select", "id".to_string()),
                Self::user_filter(session),
                ("simplified", format!("eq.{simplified}")),
            ])
            .header("Prefer", "return=representation");
        let response = check(self.authorized(request, session).send().await?).await?;
        let removed: Vec<IdRow> = response.json().await?;
        Ok(removed.len() as u64)
    }

    async fn count(&self, session: &Session) -> Result<u64, StoreError> {
        let request = self
            .client
            .head(self.table_url())
            .query(&[("select", "*".to_string()), Self::user_filter(session)])
            .header("Prefer", HeaderValue::from_static("count=exact"));
        let response = check(self.authorized(request, session).send().await?).await?;
        total_from_content_range(response.headers())
            .ok_or_else(|| StoreError::Backend("missing Content-Range count".to_string()))
    }
}

/// Resolves bearer tokens through the `/auth/v1/user` endpoint.
#[derive(Clone)]
pub struct RestAuth {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl RestAuth {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, anon_key)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            client,
        }
    }
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn session_for_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let user: AuthUser = check(response).await?.json().await?;
        Ok(Some(Session::new(user.id, token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_filter_quotes_values() {
        let values = vec!["你好".to_string(), "a\"b".to_string()];
        assert_eq!(in_filter(&values), r#"in.("你好","a\"b")"#);
    }

    #[test]
    fn content_range_total() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-24/3573"));
        assert_eq!(total_from_content_range(&headers), Some(3573));
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/0"));
        assert_eq!(total_from_content_range(&headers), Some(0));
        headers.remove(CONTENT_RANGE);
        assert_eq!(total_from_content_range(&headers), None);
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let store = RestStore::new("https://project.supabase.co/", "anon");
        assert_eq!(
            store.table_url(),
            "https://project.supabase.co/rest/v1/vocab_entry"
        );
    }

    #[cfg(feature = "web")]
    mod loopback {
        use super::*;
        use crate::lookup::tests::spawn_backend;
        use crate::model::EntryDraft;
        use axum::{
            Json, Router,
            extract::{Query, State},
            http::{HeaderMap as AxumHeaders, Method},
            response::{IntoResponse, Response},
            routing::{any, get},
        };
        use parking_lot::Mutex;
        use serde_json::{Value, json};
        use std::sync::Arc;

        #[derive(Debug, Clone)]
        struct Seen {
            method: Method,
            params: Vec<(String, String)>,
            headers: AxumHeaders,
            body: String,
        }

        impl Seen {
            fn param(&self, key: &str) -> Option<&str> {
                self.params
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| value.as_str())
            }

            fn header(&self, name: &str) -> Option<&str> {
                self.headers.get(name).and_then(|value| value.to_str().ok())
            }
        }

        /// PostgREST/GoTrue stand-in that records every table request.
        #[derive(Clone, Default)]
        struct Supabase {
            seen: Arc<Mutex<Vec<Seen>>>,
            content_range: Option<&'static str>,
            failure: Option<(u16, &'static str)>,
        }

        impl Supabase {
            fn last(&self) -> Seen {
                self.seen.lock().last().cloned().unwrap()
            }
        }

        async fn table(
            State(mock): State<Supabase>,
            method: Method,
            Query(params): Query<Vec<(String, String)>>,
            headers: AxumHeaders,
            body: String,
        ) -> Response {
            mock.seen.lock().push(Seen {
                method: method.clone(),
                params: params.clone(),
                headers,
                body: body.clone(),
            });
            if let Some((status, message)) = mock.failure {
                let status = axum::http::StatusCode::from_u16(status).unwrap();
                return (status, Json(json!({ "message": message }))).into_response();
            }
            let select = params
                .iter()
                .find(|(name, _)| name == "select")
                .map(|(_, value)| value.as_str());
            match method {
                Method::HEAD => match mock.content_range {
                    Some(range) => [(CONTENT_RANGE, range)].into_response(),
                    None => ().into_response(),
                },
                Method::POST => {
                    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
                    let ids: Vec<Value> = (1..=rows.len())
                        .map(|n| json!({ "id": format!("row-{n}") }))
                        .collect();
                    Json(ids).into_response()
                }
                Method::DELETE => Json(json!([{ "id": "row-1" }, { "id": "row-2" }])).into_response(),
                _ if select == Some("id") => Json(json!([{ "id": "row-1" }])).into_response(),
                _ if select == Some("simplified") => {
                    Json(json!([{ "simplified": "猫" }])).into_response()
                }
                _ => Json(json!([{
                    "id": "row-1",
                    "user_id": "user-1",
                    "simplified": "猫",
                    "pinyin": "māo",
                    "created_at": "2026-01-02T03:04:05Z"
                }]))
                .into_response(),
            }
        }

        async fn user(headers: AxumHeaders) -> Response {
            let bearer = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok());
            let apikey = headers.get("apikey").and_then(|value| value.to_str().ok());
            match (bearer, apikey) {
                (Some("Bearer good"), Some("anon")) => Json(json!({ "id": "user-1" })).into_response(),
                (Some("Bearer broken"), _) => (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "msg": "auth service down" })),
                )
                    .into_response(),
                _ => (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(json!({ "msg": "invalid JWT" })),
                )
                    .into_response(),
            }
        }

        async fn spawn(mock: Supabase) -> String {
            let router = Router::new()
                .route("/rest/v1/vocab_entry", any(table))
                .route("/auth/v1/user", get(user))
                .with_state(mock);
            format!("http://{}", spawn_backend(router).await)
        }

        fn session() -> Session {
            Session::new("user-1", "token-1")
        }

        #[tokio::test]
        async fn find_id_filters_by_user_and_word() {
            let mock = Supabase::default();
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            let id = store.find_id(&session(), "猫").await.unwrap();
            assert_eq!(id.as_deref(), Some("row-1"));

            let seen = mock.last();
            assert_eq!(seen.method, Method::GET);
            assert_eq!(seen.param("select"), Some("id"));
            assert_eq!(seen.param("user_id"), Some("eq.user-1"));
            assert_eq!(seen.param("simplified"), Some("eq.猫"));
            assert_eq!(seen.param("limit"), Some("1"));
            assert_eq!(seen.header("apikey"), Some("anon"));
            assert_eq!(seen.header("authorization"), Some("Bearer token-1"));
        }

        #[tokio::test]
        async fn existing_sends_one_in_filter() {
            let mock = Supabase::default();
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            let words = vec!["猫".to_string(), "狗".to_string()];
            let found = store.existing(&session(), &words).await.unwrap();
            assert!(found.contains("猫"));
            assert_eq!(found.len(), 1);
            assert_eq!(mock.last().param("simplified"), Some(r#"in.("猫","狗")"#));
        }

        #[tokio::test]
        async fn list_asks_for_newest_first() {
            let mock = Supabase::default();
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            let rows = store.list(&session()).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].pinyin.as_deref(), Some("māo"));
            let seen = mock.last();
            assert_eq!(seen.param("order"), Some("created_at.desc"));
            assert_eq!(seen.param("user_id"), Some("eq.user-1"));
        }

        #[tokio::test]
        async fn bulk_insert_rows_share_columns() {
            let mock = Supabase::default();
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            let cat = EntryDraft {
                pinyin: Some("māo".to_string()),
                ..EntryDraft::new("猫")
            };
            let rows = vec![
                VocabRow::from_draft("user-1", "猫", &cat),
                VocabRow::from_draft("user-1", "狗", &EntryDraft::new("狗")),
            ];
            let ids = store.insert(&session(), rows).await.unwrap();
            assert_eq!(ids, vec!["row-1".to_string(), "row-2".to_string()]);

            let seen = mock.last();
            assert_eq!(seen.method, Method::POST);
            assert_eq!(seen.param("columns"), Some(VocabRow::COLUMNS));
            assert_eq!(seen.header("prefer"), Some("return=representation"));
            let body: Vec<Value> = serde_json::from_str(&seen.body).unwrap();
            let key_sets: Vec<Vec<&String>> = body
                .iter()
                .map(|row| row.as_object().unwrap().keys().collect())
                .collect();
            assert_eq!(key_sets[0], key_sets[1]);
            assert!(body[1]["pinyin"].is_null());
        }

        #[tokio::test]
        async fn delete_counts_returned_rows() {
            let mock = Supabase::default();
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            assert_eq!(store.delete(&session(), "猫").await.unwrap(), 2);
            let seen = mock.last();
            assert_eq!(seen.method, Method::DELETE);
            assert_eq!(seen.param("simplified"), Some("eq.猫"));
            assert_eq!(seen.header("prefer"), Some("return=representation"));
        }

        #[tokio::test]
        async fn count_reads_exact_total() {
            let mock = Supabase {
                content_range: Some("0-0/7"),
                ..Supabase::default()
            };
            let store = RestStore::new(spawn(mock.clone()).await, "anon");
            assert_eq!(store.count(&session()).await.unwrap(), 7);
            let seen = mock.last();
            assert_eq!(seen.method, Method::HEAD);
            assert_eq!(seen.header("prefer"), Some("count=exact"));
        }

        #[tokio::test]
        async fn count_without_content_range_is_an_error() {
            let store = RestStore::new(spawn(Supabase::default()).await, "anon");
            let err = store.count(&session()).await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(message) if message.contains("Content-Range")));
        }

        #[tokio::test]
        async fn backend_message_is_passed_through() {
            let mock = Supabase {
                failure: Some((409, "duplicate key value violates unique constraint")),
                ..Supabase::default()
            };
            let store = RestStore::new(spawn(mock).await, "anon");
            let rows = vec![VocabRow::from_draft("user-1", "猫", &EntryDraft::new("猫"))];
            let err = store.insert(&session(), rows).await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(message) if message.starts_with("duplicate key")));
        }

        #[tokio::test]
        async fn auth_resolves_good_tokens_only() {
            let auth = RestAuth::new(spawn(Supabase::default()).await, "anon");
            let session = auth.session_for_token("good").await.unwrap().unwrap();
            assert_eq!(session.user_id, "user-1");
            assert_eq!(session.access_token, "good");

            assert!(auth.session_for_token("expired").await.unwrap().is_none());
            let err = auth.session_for_token("broken").await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(message) if message == "auth service down"));
        }
    }
}
