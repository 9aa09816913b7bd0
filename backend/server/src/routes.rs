use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        Path, Query, Request, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    filters::ListQuery,
    models::{InfluencerPayload, QUICK_FIND_LIMIT},
    response::GlobalResponse,
    state::AppState,
    utils::{QueryPairs, first_value, get_payload, now_millis, parse_object_id, parse_object_ids},
};

// Extractor rejections are taken as `Result` so they render through `AppError`.
type QueryResult = Result<Query<QueryPairs>, QueryRejection>;
type PathResult = Result<Path<String>, PathRejection>;
type BodyResult = Result<Bytes, BytesRejection>;

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    query: QueryResult,
) -> Result<GlobalResponse, AppError> {
    let Query(pairs) = query?;
    let (filter, pagination) = ListQuery::from_pairs(&pairs).parse()?;

    let (influencers, total) = state.store.list(&filter, pagination).await?;
    debug!(returned = influencers.len(), total, "Listed influencers");

    Ok(GlobalResponse::ok(
        "success",
        json!({ "influencers": influencers, "total": total }),
    ))
}

pub async fn detail_handler(
    State(state): State<Arc<AppState>>,
    path: PathResult,
) -> Result<GlobalResponse, AppError> {
    let Path(influencer_id) = path?;
    let id = parse_object_id(&influencer_id);

    let influencer = state
        .store
        .find_and_record_visit(id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(GlobalResponse::ok("OK", json!({ "influencer": influencer })))
}

pub async fn quick_find_handler(
    State(state): State<Arc<AppState>>,
    query: QueryResult,
) -> Result<GlobalResponse, AppError> {
    let Query(pairs) = query?;

    // No ids means the first page of everything, not an empty result.
    let ids = first_value(&pairs, "ids")
        .filter(|raw| !raw.is_empty())
        .map(parse_object_ids);

    let influencers = state
        .store
        .quick_find(ids.as_deref(), QUICK_FIND_LIMIT)
        .await?;

    Ok(GlobalResponse::ok("success", json!({ "influencers": influencers })))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    body: BodyResult,
) -> Result<GlobalResponse, AppError> {
    let payload: InfluencerPayload = get_payload(&body?)?;

    let influencer = state.store.insert(payload, now_millis()).await?;
    info!(id = %influencer.id, "Added influencer");

    Ok(GlobalResponse::new(
        StatusCode::CREATED,
        "Success add influencer",
        Some(json!({ "influencer": influencer })),
    ))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    path: PathResult,
    body: BodyResult,
) -> Result<GlobalResponse, AppError> {
    let Path(influencer_id) = path?;
    let id = parse_object_id(&influencer_id);

    if !state.store.exists(id).await? {
        return Err(AppError::NotFound);
    }

    let payload: InfluencerPayload = get_payload(&body?)?;

    if !state.store.replace_fields(id, payload, now_millis()).await? {
        return Err(AppError::NotFound);
    }
    info!(%id, "Updated influencer");

    Ok(GlobalResponse::new(
        StatusCode::OK,
        "Success update influencer",
        None,
    ))
}

pub async fn enforce_deadline(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let deadline = state.config.request_timeout;
    let uri = request.uri().clone();

    match timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%uri, ?deadline, "Request exceeded deadline");
            AppError::Timeout.into_response()
        }
    }
}
