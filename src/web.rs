use crate::actions::{SaveButton, SaveState, save_selected};
use crate::config::{ServiceConfig, StoreConfig};
use crate::count::DictionaryCountStore;
use crate::error::DictionaryError;
use crate::gateway::VocabGateway;
use crate::lookup::{LookupClient, LookupQuery, LookupSource};
use crate::model::{EntryDraft, EntryId, LookupResponse, LookupResult};
use crate::rest::{RestAuth, RestStore};
use crate::search::SearchController;
use crate::selection::SelectionManager;
use crate::store::{AuthProvider, BearerSession, MemoryStore, StaticTokens, VocabStore};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use cookie::Cookie;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn};

type SharedState = Arc<AppState>;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
const LOOKUP_FAILED: &str = "Failed to fetch data from backend API";
const HTML_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<dyn LookupSource>,
    pub store: Arc<dyn VocabStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub base_url: String,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::new();
        let lookup = Arc::new(LookupClient::with_client(
            client.clone(),
            config.backend_url.clone(),
        ));
        let (store, auth): (Arc<dyn VocabStore>, Arc<dyn AuthProvider>) = match &config.store {
            StoreConfig::Rest { url, anon_key } => (
                Arc::new(RestStore::with_client(client.clone(), url, anon_key)),
                Arc::new(RestAuth::with_client(client, url, anon_key)),
            ),
            StoreConfig::Memory { tokens } => (
                Arc::new(MemoryStore::new()),
                Arc::new(StaticTokens::new(tokens.iter().cloned())),
            ),
        };
        Self {
            lookup,
            store,
            auth,
            base_url: config.base_url.clone(),
        }
    }

    /// Gateway acting for whoever sent `headers`.
    fn gateway(&self, headers: &HeaderMap) -> VocabGateway {
        let session = BearerSession::new(self.auth.clone(), access_token(headers));
        VocabGateway::new(self.store.clone(), Arc::new(session))
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: ServiceConfig) -> Result<(), WebError> {
    let state = Arc::new(AppState::from_config(&config));
    let router = build_router(state);
    let store_kind = match config.store {
        StoreConfig::Rest { .. } => "rest",
        StoreConfig::Memory { .. } => "memory",
    };
    info!(
        %config.addr,
        backend = %config.backend_url,
        store = store_kind,
        base = %config.base_url,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    saved_count: Option<usize>,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            saved_count: None,
        }
    }

    fn with_saved_count(mut self, saved_count: usize) -> Self {
        self.saved_count = Some(saved_count);
        self
    }
}

impl From<DictionaryError> for ApiError {
    fn from(err: DictionaryError) -> Self {
        let (status, message) = match err {
            DictionaryError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                DictionaryError::Unauthorized.to_string(),
            ),
            DictionaryError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            DictionaryError::Persistence(message) => {
                error!(%message, "Persistence request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            DictionaryError::Upstream(message) => {
                error!(%message, "Error in lookup API route");
                (StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED.to_string())
            }
        };
        Self {
            status,
            message,
            saved_count: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = match self.saved_count {
            Some(saved_count) => json!({ "error": self.message, "savedCount": saved_count }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(search_html))
        .route("/dictionary", get(dictionary_html))
        .route("/dictionary/toggle", post(toggle_form))
        .route("/dictionary/save-selected", post(save_selected_form))
        .route("/api/lookup", get(api_lookup))
        .route(
            "/api/user-dictionary",
            get(api_dictionary_get)
                .post(api_dictionary_post)
                .delete(api_dictionary_delete),
        )
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Bearer token from the `Authorization` header, else the session cookie.
fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "zidian-web", "base_url": state.base_url }))
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    text: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

async fn api_lookup(
    State(state): State<SharedState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, ApiError> {
    let text = params
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("Text parameter is required"))?;
    let query = LookupQuery {
        text: text.to_string(),
        page: params.page.map(|page| page.max(1)),
        page_size: params.page_size.map(|size| size.max(1)),
    };
    Ok(Json(state.lookup.lookup(&query).await?))
}

#[derive(Debug, Deserialize)]
struct DictionaryParams {
    simplified: Option<String>,
}

async fn api_dictionary_get(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<DictionaryParams>,
) -> Result<Response, ApiError> {
    let gateway = state.gateway(&headers);
    match params.simplified.filter(|value| !value.trim().is_empty()) {
        Some(simplified) => {
            let saved = gateway.check_saved(&simplified).await?;
            Ok(Json(json!({ "saved": saved })).into_response())
        }
        None => {
            let entries = gateway.list().await?;
            Ok(Json(json!({ "entries": entries })).into_response())
        }
    }
}

/// Either `{"entries": [...]}` for a batch or a single entry's fields.
#[derive(Debug, Deserialize)]
struct SaveRequest {
    #[serde(default)]
    entries: Vec<EntryDraft>,
    #[serde(flatten)]
    single: EntryDraft,
}

async fn api_dictionary_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<SaveRequest>,
) -> Result<Response, ApiError> {
    let gateway = state.gateway(&headers);
    if !body.entries.is_empty() {
        let saved_count = gateway
            .save_batch(&body.entries)
            .await
            .map_err(|err| ApiError::from(err).with_saved_count(0))?;
        return Ok(Json(json!({ "success": true, "savedCount": saved_count })).into_response());
    }
    let saved = gateway.save(&body.single).await?;
    Ok(Json(json!({ "success": true, "id": saved.id })).into_response())
}

async fn api_dictionary_delete(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<DictionaryParams>,
) -> Result<Response, ApiError> {
    let gateway = state.gateway(&headers);
    gateway
        .remove(params.simplified.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "success": true })).into_response())
}

const UPDATE_FAILED: &str = "Failed to update your dictionary. Please try again.";

#[derive(Debug, Deserialize)]
struct SearchPageParams {
    text: Option<String>,
    page: Option<u32>,
    saved: Option<usize>,
    failed: Option<bool>,
}

/// Count for one rendered page, read from the store.
async fn page_counts(gateway: &VocabGateway) -> DictionaryCountStore {
    let counts = DictionaryCountStore::new();
    counts.refresh(gateway).await;
    counts
}

async fn search_html(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchPageParams>,
) -> impl IntoResponse {
    let gateway = state.gateway(&headers);
    let counts = page_counts(&gateway).await;
    let signed_in = counts.count().is_some();
    let raw_text = params.text.unwrap_or_default();
    let text = raw_text.trim();
    let mut controller = SearchController::new(HTML_PAGE_SIZE);
    if !text.is_empty() {
        let page = params.page.unwrap_or(1).max(1);
        let _ = controller.search(state.lookup.as_ref(), text, page).await;
    }
    let response = controller.results();
    let mut cards = Vec::new();
    for result in response.map(|r| r.results.as_slice()).unwrap_or_default() {
        let card = CardView::from_result(result);
        if signed_in {
            let mut button = SaveButton::for_result(result);
            button.check(&gateway).await;
            cards.push(card.with_button(&button));
        } else {
            cards.push(card);
        }
    }
    let notice = match (params.failed, params.saved) {
        (Some(true), _) => Some(UPDATE_FAILED.to_string()),
        (_, Some(1)) => Some("Saved 1 new word to your dictionary.".to_string()),
        (_, Some(saved)) => Some(format!("Saved {saved} new words to your dictionary.")),
        _ => None,
    };
    let template = SearchTemplate {
        text,
        page: controller.page(),
        return_to: if text.is_empty() {
            "/".to_string()
        } else {
            search_path(text, controller.page())
        },
        count: counts.count(),
        signed_in,
        error: controller.error(),
        notice,
        searched: response.is_some(),
        input_type: response
            .map(|r| r.input_type.to_string())
            .unwrap_or_default(),
        cards,
        pager: response.and_then(|r| PagerView::new(text, r)),
    };
    Html(template.render().unwrap_or_else(render_failure))
}

#[derive(Debug, Deserialize)]
struct DictionaryPageParams {
    failed: Option<bool>,
}

async fn dictionary_html(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<DictionaryPageParams>,
) -> impl IntoResponse {
    let gateway = state.gateway(&headers);
    let counts = page_counts(&gateway).await;
    let (cards, error) = match gateway.list().await {
        Ok(entries) => (
            entries
                .iter()
                .map(|entry| {
                    let mut card = CardView::from_result(&entry.to_card());
                    card.save = Some(SaveView {
                        label: "Remove",
                        saved: true,
                    });
                    card
                })
                .collect(),
            None,
        ),
        Err(DictionaryError::Unauthorized) => (
            Vec::new(),
            Some("You must be logged in to view your dictionary."),
        ),
        Err(err) => {
            error!(error = %err, "Failed to load dictionary page");
            (
                Vec::new(),
                Some("Failed to load your dictionary. Please try again."),
            )
        }
    };
    let template = DictionaryTemplate {
        count: counts.count(),
        notice: params.failed.unwrap_or(false).then_some(UPDATE_FAILED),
        cards,
        error,
    };
    Html(template.render().unwrap_or_else(render_failure))
}

/// One card's save/remove form.
#[derive(Debug, Deserialize)]
struct ToggleForm {
    simplified: String,
    #[serde(default)]
    traditional: String,
    #[serde(default)]
    pinyin: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    entry_id: String,
    #[serde(default)]
    return_to: String,
}

impl ToggleForm {
    fn draft(&self) -> EntryDraft {
        EntryDraft {
            simplified: self.simplified.clone(),
            traditional: non_empty(&self.traditional),
            pinyin: non_empty(&self.pinyin),
            definition: non_empty(&self.definition),
            notes: None,
            entry_id: parse_form_id(&self.entry_id),
        }
    }
}

/// Flips the saved state of one word, starting from what the store says now.
async fn toggle_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Redirect {
    let gateway = state.gateway(&headers);
    let counts = page_counts(&gateway).await;
    let target = safe_return(&form.return_to);
    let mut button = SaveButton::new(form.draft());
    button.check(&gateway).await;
    match button.toggle(&gateway, &counts).await {
        Ok(outcome) => {
            info!(simplified = %form.simplified, ?outcome, count = ?counts.count(), "Toggled word from page");
            Redirect::to(&target)
        }
        Err(err) => {
            warn!(simplified = %form.simplified, error = %err, "Toggle from page failed");
            Redirect::to(&with_flag(&target, "failed=true"))
        }
    }
}

/// Saves the checked results of a search page. The results are looked up
/// again so only ids the backend still returns for that page are saved.
async fn save_selected_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
    };
    let text = field("text").unwrap_or_default().to_string();
    if text.is_empty() {
        return Redirect::to("/");
    }
    let page = field("page")
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let back = search_path(&text, page);

    let mut selection = SelectionManager::new();
    for id in fields
        .iter()
        .filter(|(key, _)| key == "selected")
        .filter_map(|(_, value)| parse_form_id(value))
    {
        if !selection.contains(&id) {
            selection.toggle(&id);
        }
    }

    let gateway = state.gateway(&headers);
    let counts = DictionaryCountStore::new();
    let mut controller = SearchController::new(HTML_PAGE_SIZE);
    let response = match controller.search(state.lookup.as_ref(), &text, page).await {
        Ok(response) => response,
        Err(err) => {
            warn!(%text, error = %err, "Lookup for batch save failed");
            return Redirect::to(&with_flag(&back, "failed=true"));
        }
    };
    let outcome = save_selected(&gateway, &counts, &response.results, &selection).await;
    selection.clear_all();
    match outcome {
        Ok(saved) => {
            info!(%text, selected = response.results.len(), saved, count = ?counts.count(), "Saved selection from page");
            Redirect::to(&with_flag(&back, &format!("saved={saved}")))
        }
        Err(err) => {
            warn!(%text, error = %err, "Batch save from page failed");
            Redirect::to(&with_flag(&back, "failed=true"))
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Form value for an id; the prefix keeps `42` and `"42"` apart.
fn form_id(id: &EntryId) -> String {
    match id {
        EntryId::Number(value) => format!("n:{value}"),
        EntryId::Text(value) => format!("t:{value}"),
    }
}

fn parse_form_id(value: &str) -> Option<EntryId> {
    match value.split_once(':')? {
        ("n", number) => number.parse().ok().map(EntryId::Number),
        ("t", text) if !text.is_empty() => Some(EntryId::Text(text.to_string())),
        _ => None,
    }
}

/// Same-site path to go back to after a form post.
fn safe_return(path: &str) -> String {
    if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") {
        path.to_string()
    } else {
        "/".to_string()
    }
}

fn with_flag(path: &str, flag: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{flag}")
}

fn render_failure(err: askama::Error) -> String {
    error!(error = %err, "Template rendering failed");
    "<!DOCTYPE html><html lang=\"en\"><body><h1>Something went wrong</h1></body></html>"
        .to_string()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn search_path(text: &str, page: u32) -> String {
    format!("/?text={}&page={page}", encode_component(text))
}

struct Detail {
    label: &'static str,
    value: String,
}

struct SaveView {
    label: &'static str,
    saved: bool,
}

struct CardView {
    form_id: String,
    simplified: String,
    traditional: Option<String>,
    traditional_value: String,
    pinyin: String,
    definition: String,
    badge: Option<String>,
    meanings: Vec<String>,
    details: Vec<Detail>,
    save: Option<SaveView>,
}

impl CardView {
    fn from_result(result: &LookupResult) -> Self {
        let badge = result.match_type.as_ref().map(|kind| match result.relevance_score {
            Some(score) => format!("{kind} - {:.0}%", score * 100.0),
            None => kind.clone(),
        });
        let mut details = Vec::new();
        if let Some(level) = result.hsk_level.filter(|level| level.combined > 0) {
            details.push(Detail {
                label: "HSK Level",
                value: level.combined.to_string(),
            });
        }
        if let Some(rank) = result.frequency_rank.filter(|rank| *rank > 0) {
            details.push(Detail {
                label: "Frequency Rank",
                value: rank.to_string(),
            });
        }
        if !result.parts_of_speech.is_empty() {
            details.push(Detail {
                label: "Parts of Speech",
                value: result.parts_of_speech.join(", "),
            });
        }
        if let Some(radical) = result.radical.as_ref().filter(|r| !r.is_empty()) {
            details.push(Detail {
                label: "Radical",
                value: radical.clone(),
            });
        }
        Self {
            form_id: form_id(&result.id),
            simplified: result.simplified.clone(),
            traditional: result.distinct_traditional().map(str::to_string),
            traditional_value: result.traditional.clone(),
            pinyin: result.pinyin.clone(),
            definition: result.definition.clone(),
            badge,
            meanings: result.meanings.clone(),
            details,
            save: None,
        }
    }

    fn with_button(mut self, button: &SaveButton) -> Self {
        self.save = Some(SaveView {
            label: button.label(),
            saved: button.state() == SaveState::Saved,
        });
        self
    }
}

struct PagerView {
    page: u32,
    total_pages: u32,
    total_count: u64,
    previous_href: Option<String>,
    next_href: Option<String>,
}

impl PagerView {
    fn new(text: &str, response: &LookupResponse) -> Option<Self> {
        let pagination = response.pagination;
        if pagination.total_pages <= 1 {
            return None;
        }
        Some(Self {
            page: pagination.page,
            total_pages: pagination.total_pages,
            total_count: pagination.total_count,
            previous_href: pagination
                .has_previous()
                .then(|| search_path(text, pagination.page - 1)),
            next_href: pagination
                .has_next()
                .then(|| search_path(text, pagination.page + 1)),
        })
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{% if text.is_empty() %}Zidian{% else %}{{ text }} • Zidian{% endif %}</title>
  </head>
  <body>
    <main>
      <nav>
        <a href="/">Search</a> ·
        <a href="/dictionary">My Dictionary{% if let Some(count) = count %} <span class="count" id="dictionary-count">{{ count }}</span>{% endif %}</a>
      </nav>
      <form method="get" action="/">
        <label for="search-input">Search</label>
        <input id="search-input" name="text" value="{{ text }}" placeholder="Enter text to search..." />
        <button type="submit">Search</button>
      </form>
      {% if let Some(message) = error %}
      <div class="error" role="alert">{{ message }}</div>
      {% endif %}
      {% if let Some(message) = notice %}
      <div class="notice" role="status">{{ message }}</div>
      {% endif %}
      {% if searched %}
      <section id="results">
        <h2>Results</h2>
        <p>Input type: <span>{{ input_type }}</span></p>
        {% if cards.is_empty() %}
        <p>No results found</p>
        {% else %}
        {% if signed_in %}
        <form id="save-selected" method="post" action="/dictionary/save-selected">
          <input type="hidden" name="text" value="{{ text }}" />
          <input type="hidden" name="page" value="{{ page }}" />
          <button type="submit">Save All Selected</button>
        </form>
        {% endif %}
        {% for card in cards %}
        <article class="card">
          <div>
            {% if signed_in %}<input type="checkbox" form="save-selected" name="selected" value="{{ card.form_id }}" aria-label="Select {{ card.simplified }}" />{% endif %}
            <span class="simplified">{{ card.simplified }}</span>
            {% if let Some(traditional) = card.traditional %}<span class="traditional">({{ traditional }})</span>{% endif %}
            {% if let Some(badge) = card.badge %}<span class="badge">{{ badge }}</span>{% endif %}
          </div>
          <div class="pinyin">{{ card.pinyin }}</div>
          <div><strong>Definition:</strong> {{ card.definition }}</div>
          {% if !card.meanings.is_empty() %}
          <ul>
            {% for meaning in card.meanings %}<li>{{ meaning }}</li>{% endfor %}
          </ul>
          {% endif %}
          {% for detail in card.details %}
          <div><strong>{{ detail.label }}:</strong> {{ detail.value }}</div>
          {% endfor %}
          {% if let Some(save) = card.save %}
          <form method="post" action="/dictionary/toggle">
            <input type="hidden" name="simplified" value="{{ card.simplified }}" />
            <input type="hidden" name="traditional" value="{{ card.traditional_value }}" />
            <input type="hidden" name="pinyin" value="{{ card.pinyin }}" />
            <input type="hidden" name="definition" value="{{ card.definition }}" />
            <input type="hidden" name="entry_id" value="{{ card.form_id }}" />
            <input type="hidden" name="return_to" value="{{ return_to }}" />
            <button type="submit" class="{% if save.saved %}saved{% else %}unsaved{% endif %}">{{ save.label }}</button>
          </form>
          {% endif %}
        </article>
        {% endfor %}
        {% endif %}
        {% if let Some(pager) = pager %}
        <nav class="pagination">
          {% if let Some(href) = pager.previous_href %}<a href="{{ href }}">Previous</a>{% endif %}
          <span>Page {{ pager.page }} of {{ pager.total_pages }} ({{ pager.total_count }} results)</span>
          {% if let Some(href) = pager.next_href %}<a href="{{ href }}">Next</a>{% endif %}
        </nav>
        {% endif %}
      </section>
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct SearchTemplate<'a> {
    text: &'a str,
    page: u32,
    return_to: String,
    count: Option<u64>,
    signed_in: bool,
    error: Option<&'a str>,
    notice: Option<String>,
    searched: bool,
    input_type: String,
    cards: Vec<CardView>,
    pager: Option<PagerView>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>My Dictionary • Zidian</title>
  </head>
  <body>
    <main>
      <nav>
        <a href="/">Search</a> ·
        <a href="/dictionary">My Dictionary{% if let Some(count) = count %} <span class="count" id="dictionary-count">{{ count }}</span>{% endif %}</a>
      </nav>
      <h1>My Dictionary</h1>
      {% if let Some(message) = notice %}
      <div class="notice" role="status">{{ message }}</div>
      {% endif %}
      {% if let Some(message) = error %}
      <div class="error" role="alert">{{ message }}</div>
      {% else %}
      {% if cards.is_empty() %}
      <div class="empty">
        <p>Your dictionary is empty.</p>
        <p>Search for words and save them to see them here.</p>
      </div>
      {% else %}
      <p>{{ cards.len() }} saved words</p>
      {% for card in cards %}
      <article class="card">
        <div>
          <span class="simplified">{{ card.simplified }}</span>
          {% if let Some(traditional) = card.traditional %}<span class="traditional">({{ traditional }})</span>{% endif %}
        </div>
        <div class="pinyin">{{ card.pinyin }}</div>
        <div><strong>Definition:</strong> {{ card.definition }}</div>
        {% if let Some(save) = card.save %}
        <form method="post" action="/dictionary/toggle">
          <input type="hidden" name="simplified" value="{{ card.simplified }}" />
          <input type="hidden" name="return_to" value="/dictionary" />
          <button type="submit" class="{% if save.saved %}saved{% else %}unsaved{% endif %}">{{ save.label }}</button>
        </form>
        {% endif %}
      </article>
      {% endfor %}
      {% endif %}
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DictionaryTemplate {
    count: Option<u64>,
    notice: Option<&'static str>,
    cards: Vec<CardView>,
    error: Option<&'static str>,
}
