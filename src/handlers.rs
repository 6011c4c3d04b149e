use crate::cache::is_known_tag;
use crate::fetcher::LoadError;
use crate::i18n::{lookup, translate, ApiMessages};
use crate::loader::MessageLoader;
use crate::locale::{negotiate_locale, Locale, Tier};
use crate::metrics::MetricsSnapshot;
use crate::models::{
    ApiError, ApiResponse, EmptyApiResponse, HealthCheckResponse, MessagesApiResponse,
    MessagesPayload, RevalidateRequest, RevalidateResult, TranslateQuery, TranslateResult,
};
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct AppState {
    pub loader: MessageLoader,
    pub api_messages: ApiMessages,
}

impl AppState {
    pub fn new(loader: MessageLoader) -> Self {
        Self {
            loader,
            api_messages: ApiMessages::new(),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health_check)
            .route("/translate", web::get().to(translate_key))
            .service(
                web::scope("/messages")
                    .route("/metrics", web::get().to(get_metrics))
                    .route("/metrics/reset", web::post().to(reset_metrics))
                    .route("/revalidate", web::post().to(revalidate))
                    .route("/{locale}", web::get().to(get_complete_messages))
                    .route("/{locale}/{tier}", web::get().to(get_tier_messages)),
            ),
    )
    .route("/messages/{locale}/{file}", web::get().to(serve_message_file));
}

/**
 * get_request_locale
 * 从 Accept-Language 协商响应语言，默认 en。
 */
fn get_request_locale(req: &HttpRequest) -> Locale {
    negotiate_locale(
        req.headers()
            .get("Accept-Language")
            .and_then(|h| h.to_str().ok()),
    )
}

/**
 * messages_unavailable
 * 所有来源均加载失败时返回 503，携带本地化提示与失败详情。
 */
fn messages_unavailable(req: &HttpRequest, state: &AppState, err: &LoadError) -> HttpResponse {
    log::error!("{} (attempts: {:?})", err, err.attempts);
    let message = state
        .api_messages
        .get(get_request_locale(req), "messages_unavailable");

    HttpResponse::ServiceUnavailable().json(ApiResponse::<()>::error(message).with_error(ApiError {
        code: "MESSAGES_UNAVAILABLE".to_string(),
        detail: Some(err.to_string()),
    }))
}

fn bad_request(req: &HttpRequest, state: &AppState, key: &str, code: &str, detail: String) -> HttpResponse {
    let message = state.api_messages.get(get_request_locale(req), key);
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(message).with_error(ApiError {
        code: code.to_string(),
        detail: Some(detail),
    }))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, body = HealthCheckResponse))
)]
#[get("/health")]
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(HealthCheckResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        mode: state.loader.mode(),
    })
}

#[utoipa::path(
    get,
    path = "/api/messages/{locale}",
    params(("locale" = String, Path, description = "Locale code; unsupported values resolve to the default locale")),
    responses(
        (status = 200, body = MessagesApiResponse),
        (status = 503, body = EmptyApiResponse)
    )
)]
pub async fn get_complete_messages(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> impl Responder {
    let locale = Locale::sanitize(&path.into_inner());

    match state.loader.load_complete(locale.as_str()).await {
        Ok(doc) => HttpResponse::Ok().json(ApiResponse::success(MessagesPayload {
            locale,
            messages: Value::Object(doc),
        })),
        Err(e) => messages_unavailable(&req, &state, &e),
    }
}

#[utoipa::path(
    get,
    path = "/api/messages/{locale}/{tier}",
    params(
        ("locale" = String, Path, description = "Locale code"),
        ("tier" = String, Path, description = "critical | deferred")
    ),
    responses(
        (status = 200, body = MessagesApiResponse),
        (status = 400, body = EmptyApiResponse),
        (status = 503, body = EmptyApiResponse)
    )
)]
pub async fn get_tier_messages(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<Arc<AppState>>,
) -> impl Responder {
    let (raw_locale, raw_tier) = path.into_inner();
    let tier = match raw_tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(detail) => return bad_request(&req, &state, "unknown_tier", "UNKNOWN_TIER", detail),
    };
    let locale = Locale::sanitize(&raw_locale);

    match state.loader.load_tier(locale.as_str(), tier).await {
        Ok(doc) => HttpResponse::Ok().json(ApiResponse::success(MessagesPayload {
            locale,
            messages: Value::Object(doc),
        })),
        Err(e) => messages_unavailable(&req, &state, &e),
    }
}

#[utoipa::path(
    get,
    path = "/api/translate",
    params(TranslateQuery),
    responses(
        (status = 200, body = TranslateResult),
        (status = 503, body = EmptyApiResponse)
    )
)]
pub async fn translate_key(
    req: HttpRequest,
    query: web::Query<TranslateQuery>,
    state: web::Data<Arc<AppState>>,
) -> impl Responder {
    let TranslateQuery { locale, key } = query.into_inner();
    let locale = locale
        .map(|l| Locale::sanitize(&l))
        .unwrap_or_else(|| get_request_locale(&req));

    let mut docs = HashMap::new();
    match state.loader.load_complete(locale.as_str()).await {
        Ok(doc) => {
            docs.insert(locale, doc);
        }
        Err(e) => return messages_unavailable(&req, &state, &e),
    }

    let missing = docs
        .get(&locale)
        .map(|doc| lookup(doc, &key).is_none())
        .unwrap_or(true);
    if missing && locale != Locale::DEFAULT {
        match state.loader.load_complete(Locale::DEFAULT.as_str()).await {
            Ok(doc) => {
                docs.insert(Locale::DEFAULT, doc);
            }
            Err(e) => log::warn!("Default locale fallback unavailable for key {}: {}", key, e),
        }
    }

    let found = docs.values().any(|doc| lookup(doc, &key).is_some());
    let value = translate(&docs, locale, &key);
    HttpResponse::Ok().json(ApiResponse::success(TranslateResult {
        locale,
        key,
        value,
        found,
    }))
}

#[utoipa::path(
    post,
    path = "/api/messages/revalidate",
    request_body = RevalidateRequest,
    responses(
        (status = 200, body = RevalidateResult),
        (status = 400, body = EmptyApiResponse)
    )
)]
pub async fn revalidate(
    req: HttpRequest,
    body: web::Json<RevalidateRequest>,
    state: web::Data<Arc<AppState>>,
) -> impl Responder {
    let tag = body.into_inner().tag.trim().to_string();
    if !is_known_tag(&tag) {
        let detail = format!("unknown cache tag: {}", tag);
        return bad_request(&req, &state, "unknown_tag", "UNKNOWN_TAG", detail);
    }

    let invalidated = state.loader.invalidate_tag(&tag).await;
    let mut response = ApiResponse::success(RevalidateResult { tag, invalidated });
    response.message = Some(
        state
            .api_messages
            .get(get_request_locale(&req), "cache_invalidated"),
    );
    HttpResponse::Ok().json(response)
}

#[utoipa::path(
    get,
    path = "/api/messages/metrics",
    responses((status = 200, body = MetricsSnapshot))
)]
pub async fn get_metrics(state: web::Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(state.loader.metrics().snapshot()))
}

#[utoipa::path(
    post,
    path = "/api/messages/metrics/reset",
    responses((status = 200, body = MetricsSnapshot))
)]
pub async fn reset_metrics(state: web::Data<Arc<AppState>>) -> impl Responder {
    let metrics = state.loader.metrics();
    let before = metrics.snapshot();
    metrics.reset();
    log::info!(
        "Load metrics reset ({} loads, {} errors discarded)",
        before.loads,
        before.total_errors
    );
    HttpResponse::Ok().json(ApiResponse::success(metrics.snapshot()))
}

/**
 * serve_message_file
 * 对外提供 public 目录下的 tier 文件（即网络加载路径 /messages/{locale}/{tier}.json 的目标）。
 * locale 必须精确匹配，文件名只接受 critical.json / deferred.json。
 */
pub async fn serve_message_file(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<Arc<AppState>>,
) -> impl Responder {
    let (raw_locale, file) = path.into_inner();
    let target = Locale::parse_supported(&raw_locale).zip(
        file.strip_suffix(".json")
            .and_then(|name| name.parse::<Tier>().ok()),
    );

    let Some((locale, tier)) = target else {
        let message = state.api_messages.get(get_request_locale(&req), "not_found");
        return HttpResponse::NotFound().json(ApiResponse::<()>::error(message));
    };

    match state.loader.fetcher().read_public(locale, tier).await {
        Ok(doc) => HttpResponse::Ok().json(doc),
        Err(e) => {
            log::warn!("Public {} messages for {} unavailable: {}", tier, locale, e);
            let message = state.api_messages.get(get_request_locale(&req), "not_found");
            HttpResponse::NotFound().json(ApiResponse::<()>::error(message))
        }
    }
}
