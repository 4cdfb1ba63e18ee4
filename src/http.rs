//! HTTP API for the lost-and-found board
//!
//! ## Public
//! - `GET /health` - Liveness plus row counts
//! - `GET /api/items` - Active board (`?q=&status=&category=&limit=&offset=`)
//! - `GET /api/items/search` - Same as `/api/items`
//! - `GET /api/items/{itemId}` - Item detail with images and claims
//!
//! ## Signed-in users
//! - `POST /api/items` - Report a lost or found item
//! - `POST /api/claims/{foundId}` - Claim a found item
//!
//! ## Admins
//! - `POST /api/claims/{claimId}/action` - `{"decision": "approve" | "reject"}`
//! - `PUT /api/admin/claims/{claimId}/status` - `{"status": "Approved" | "Rejected"}`
//! - `GET /api/admin/claims/pending`, `GET /api/admin/claims`
//! - `GET /api/admin/analytics`, `/api/admin/users`, `/api/admin/items`, `/api/admin/history`
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST -H "Content-Type: application/json" -H "x-user-id: 7" \
//!      -d '{"status":"found","name":"Blue Bottle","location":"Turing"}' \
//!      http://localhost:4000/api/items
//!
//! curl -X POST -H "x-user-id: 1" -H "x-user-role: admin" \
//!      -d '{"decision":"approve"}' http://localhost:4000/api/claims/3/action
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::ReportItemInput;
use crate::error::LostFoundError;
use crate::identity::{CallerIdentity, IdentityProvider};
use crate::services::response::{self, HandlerResult};
use crate::services::{Decision, Services};
use crate::views::{
    AdminItemView, AnalyticsView, ClaimView, DecideClaimInputView, DecisionView, HistoryRecordView,
    ItemDetailView, ItemQueryParams, ItemSummaryView, ReportItemInputView, ReportedItemView,
    StatusUpdateInputView, SubmitClaimInputView, SubmittedClaimView, UserView,
};

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A resolved API route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    ListItems,
    ItemDetail(i64),
    ReportItem,
    SubmitClaim(i64),
    DecideClaim(i64),
    UpdateClaimStatus(i64),
    PendingClaims,
    AllClaims,
    Analytics,
    Users,
    AdminItems,
    History,
}

impl Route {
    /// Resolve method and path; `Ok(None)` for unknown routes.
    ///
    /// A non-integer id segment is `InvalidInput`.
    pub fn parse(method: &Method, path: &str) -> Result<Option<Route>, LostFoundError> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let route = match (method, segments.as_slice()) {
            (&Method::GET, ["health"]) => Route::Health,

            (&Method::GET, ["api", "items"]) | (&Method::GET, ["api", "items", "search"]) => {
                Route::ListItems
            }
            (&Method::POST, ["api", "items"]) => Route::ReportItem,
            (&Method::GET, ["api", "items", id]) => Route::ItemDetail(parse_id(id)?),

            (&Method::POST, ["api", "claims", id]) => Route::SubmitClaim(parse_id(id)?),
            (&Method::POST, ["api", "claims", id, "action"]) => Route::DecideClaim(parse_id(id)?),

            (&Method::PUT, ["api", "admin", "claims", id, "status"]) => {
                Route::UpdateClaimStatus(parse_id(id)?)
            }
            (&Method::GET, ["api", "admin", "claims", "pending"]) => Route::PendingClaims,
            (&Method::GET, ["api", "admin", "claims"]) => Route::AllClaims,
            (&Method::GET, ["api", "admin", "analytics"]) => Route::Analytics,
            (&Method::GET, ["api", "admin", "users"]) => Route::Users,
            (&Method::GET, ["api", "admin", "items"]) => Route::AdminItems,
            (&Method::GET, ["api", "admin", "history"]) => Route::History,

            _ => return Ok(None),
        };

        Ok(Some(route))
    }

    /// Routes open to anonymous callers
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Health | Route::ListItems | Route::ItemDetail(_))
    }
}

fn parse_id(raw: &str) -> Result<i64, LostFoundError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| LostFoundError::InvalidInput(format!("'{}' is not a valid id", raw)))
}

/// Run a blocking storage call off the async workers
async fn blocking<F, T>(f: F) -> Result<T, LostFoundError>
where
    F: FnOnce() -> Result<T, LostFoundError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LostFoundError::Internal(format!("Blocking task failed: {}", e)))?
}

fn require_caller(caller: Option<CallerIdentity>) -> Result<CallerIdentity, LostFoundError> {
    caller.ok_or_else(|| LostFoundError::Unauthorized("Sign in required".into()))
}

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    identity: Arc<dyn IdentityProvider>,
    bind_addr: SocketAddr,
    cors_origin: HeaderValue,
    cors_headers: HeaderValue,
}

impl HttpServer {
    pub fn new(
        services: Arc<Services>,
        identity: Arc<dyn IdentityProvider>,
        config: &Config,
    ) -> Result<Self, LostFoundError> {
        let cors_origin = HeaderValue::from_str(&config.cors_origin).map_err(|_| {
            LostFoundError::Config(format!("invalid cors_origin '{}'", config.cors_origin))
        })?;
        let allowed = format!(
            "content-type, authorization, {}, {}, {}, {}",
            config.identity.user_id_header,
            config.identity.role_header,
            config.identity.name_header,
            config.identity.email_header,
        );
        let cors_headers = HeaderValue::from_str(&allowed)
            .map_err(|_| LostFoundError::Config("invalid identity header names".into()))?;

        Ok(Self {
            services,
            identity,
            bind_addr: config.bind_addr()?,
            cors_origin,
            cors_headers,
        })
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), LostFoundError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Answer one request; never fails, errors become JSON bodies
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = Uuid::new_v4();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        debug!(%request_id, method = %method, path = %path, "Incoming request");

        let response = if method == Method::OPTIONS {
            response::no_content()
        } else {
            match self.dispatch(req).await {
                Ok(response) => response,
                Err(e) => {
                    if e.is_client_error() {
                        warn!(%request_id, method = %method, path = %path, error = %e, "Request rejected");
                    }
                    response::error_response(e)
                }
            }
        };

        self.with_cors(response, request_id)
    }

    fn with_cors(&self, mut response: Response<Full<Bytes>>, request_id: Uuid) -> Response<Full<Bytes>> {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.cors_origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.cors_headers.clone());
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert("x-request-id", value);
        }
        response
    }

    async fn identify(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>, LostFoundError> {
        let caller = self.identity.identify(headers).await?;

        if let Some(caller) = &caller {
            let services = self.services.clone();
            let record = caller.clone();
            blocking(move || services.record_caller(&record)).await?;
        }

        Ok(caller)
    }

    /// Route requests to handlers
    async fn dispatch<B>(&self, req: Request<B>) -> HandlerResult
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let route = match Route::parse(&parts.method, parts.uri.path())? {
            Some(route) => route,
            None => return Ok(response::not_found("Not Found")),
        };

        let caller = self.identify(&parts.headers).await?;
        if !route.is_public() && caller.is_none() {
            return Err(LostFoundError::Unauthorized("Sign in required".into()));
        }

        match route {
            Route::Health => self.handle_health().await,

            Route::ListItems => {
                let params = ItemQueryParams::parse(parts.uri.query())?;
                self.handle_list_items(params).await
            }
            Route::ItemDetail(item_id) => self.handle_item_detail(item_id).await,
            Route::ReportItem => {
                let input: ReportItemInputView = read_json(body).await?;
                self.handle_report_item(require_caller(caller)?, input).await
            }

            Route::SubmitClaim(found_id) => {
                let input: SubmitClaimInputView = read_json_or_default(body).await?;
                self.handle_submit_claim(require_caller(caller)?, found_id, input).await
            }
            Route::DecideClaim(claim_id) => {
                let caller = require_caller(caller)?;
                caller.require_admin()?;
                let input: DecideClaimInputView = read_json(body).await?;
                let decision = Decision::try_from(input)?;
                self.handle_decide_claim(caller, claim_id, decision).await
            }
            Route::UpdateClaimStatus(claim_id) => {
                let caller = require_caller(caller)?;
                caller.require_admin()?;
                let input: StatusUpdateInputView = read_json(body).await?;
                let decision = Decision::try_from(input)?;
                self.handle_decide_claim(caller, claim_id, decision).await
            }

            Route::PendingClaims => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let rows = blocking(move || reporting.pending_claims(&caller)).await?;
                Ok(response::ok(&rows.into_iter().map(ClaimView::from).collect::<Vec<_>>()))
            }
            Route::AllClaims => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let rows = blocking(move || reporting.all_claims(&caller)).await?;
                Ok(response::ok(&rows.into_iter().map(ClaimView::from).collect::<Vec<_>>()))
            }
            Route::Analytics => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let analytics = blocking(move || reporting.analytics(&caller)).await?;
                Ok(response::ok(&AnalyticsView::from(analytics)))
            }
            Route::Users => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let rows = blocking(move || reporting.list_users(&caller)).await?;
                Ok(response::ok(&rows.into_iter().map(UserView::from).collect::<Vec<_>>()))
            }
            Route::AdminItems => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let rows = blocking(move || reporting.list_all_items(&caller)).await?;
                Ok(response::ok(&rows.into_iter().map(AdminItemView::from).collect::<Vec<_>>()))
            }
            Route::History => {
                let caller = require_caller(caller)?;
                let reporting = self.services.reporting.clone();
                let rows = blocking(move || reporting.list_history(&caller)).await?;
                Ok(response::ok(&rows.into_iter().map(HistoryRecordView::from).collect::<Vec<_>>()))
            }
        }
    }

    /// GET /health
    async fn handle_health(&self) -> HandlerResult {
        let db = self.services.db().clone();
        let stats = blocking(move || db.stats()).await?;

        Ok(response::ok(&serde_json::json!({
            "status": "ok",
            "items": stats.item_count,
            "claims": stats.claim_count,
            "returns": stats.return_count,
        })))
    }

    /// GET /api/items
    async fn handle_list_items(&self, params: ItemQueryParams) -> HandlerResult {
        let catalog = self.services.catalog.clone();
        let limit = catalog.page_limit(params.limit);
        let query = params.into_query(limit)?;

        let rows = blocking(move || catalog.list_items(query)).await?;
        Ok(response::ok(&rows.into_iter().map(ItemSummaryView::from).collect::<Vec<_>>()))
    }

    /// GET /api/items/{itemId}
    async fn handle_item_detail(&self, item_id: i64) -> HandlerResult {
        let catalog = self.services.catalog.clone();
        let detail = blocking(move || catalog.get_item_detail(item_id)).await?;
        Ok(response::ok(&ItemDetailView::from(detail)))
    }

    /// POST /api/items
    async fn handle_report_item(&self, caller: CallerIdentity, input: ReportItemInputView) -> HandlerResult {
        let input = ReportItemInput::try_from(input)?;
        let catalog = self.services.catalog.clone();
        let reported = blocking(move || catalog.report_item(&caller, input)).await?;
        Ok(response::created(&ReportedItemView::from(reported)))
    }

    /// POST /api/claims/{foundId}
    async fn handle_submit_claim(
        &self,
        caller: CallerIdentity,
        found_id: i64,
        input: SubmitClaimInputView,
    ) -> HandlerResult {
        let claims = self.services.claims.clone();
        let claim = blocking(move || claims.submit_claim(&caller, found_id, input.message)).await?;
        Ok(response::created(&SubmittedClaimView::from(claim)))
    }

    /// POST /api/claims/{claimId}/action and PUT /api/admin/claims/{claimId}/status
    async fn handle_decide_claim(
        &self,
        caller: CallerIdentity,
        claim_id: i64,
        decision: Decision,
    ) -> HandlerResult {
        let claims = self.services.claims.clone();
        let outcome = blocking(move || claims.decide_claim(&caller, claim_id, decision)).await?;
        Ok(response::ok(&DecisionView::from(outcome)))
    }
}

async fn read_body<B>(body: B) -> Result<Bytes, LostFoundError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| LostFoundError::InvalidInput(format!("Failed to read body: {}", e)))
}

async fn read_json<T, B>(body: B) -> Result<T, LostFoundError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = read_body(body).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Like `read_json`, but an empty body yields `T::default()`
async fn read_json_or_default<T, B>(body: B) -> Result<T, LostFoundError>
where
    T: DeserializeOwned + Default,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = read_body(body).await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(&body)?)
}
