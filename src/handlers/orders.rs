//! Order route handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use super::response::{ApiError, Envelope};
use super::AppState;
use crate::model::{NewOrder, Order};

type ApiResult<T> = Result<T, ApiError>;

/// Body of `PATCH /orders/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

fn path_id(id: Result<Path<i64>, PathRejection>, param: &str) -> ApiResult<i64> {
    id.map(|Path(id)| id).map_err(|e| {
        debug!(error = %e, param, "rejected path parameter");
        ApiError::bad_request(format!("invalid {} parameter", param))
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

pub(super) async fn list(State(repo): State<AppState>) -> ApiResult<Json<Envelope<Vec<Order>>>> {
    let orders = repo.get_all().await?;
    Ok(Json(Envelope::ok("Orders retrieved", orders)))
}

pub(super) async fn get(
    State(repo): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Envelope<Order>>> {
    let id = path_id(id, "id")?;
    let order = repo.get_by_id(id).await?;
    Ok(Json(Envelope::ok("Order retrieved", order)))
}

pub(super) async fn list_by_customer(
    State(repo): State<AppState>,
    customer_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Envelope<Vec<Order>>>> {
    let customer_id = path_id(customer_id, "customer_id")?;
    let orders = repo.get_by_customer(customer_id).await?;
    Ok(Json(Envelope::ok("Customer orders retrieved", orders)))
}

pub(super) async fn create(
    State(repo): State<AppState>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Order>>)> {
    let order = json_body(body)?;
    order.validate().map_err(ApiError::bad_request)?;

    let id = repo.create(order).await?;
    // Answer with what was committed, not with the request body.
    let created = repo.get_by_id(id).await?;
    info!(order_id = id, "order created via API");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Order created", created)),
    ))
}

pub(super) async fn update_status(
    State(repo): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Envelope<Order>>> {
    let id = path_id(id, "id")?;
    let update = json_body(body)?;

    repo.update_status(id, &update.status).await?;
    let updated = repo.get_by_id(id).await?;

    Ok(Json(Envelope::ok("Order status updated", updated)))
}
