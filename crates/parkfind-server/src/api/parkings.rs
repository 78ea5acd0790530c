use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use parkfind_aggregator::AggregateError;
use parkfind_core::ParkingItem;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ParkingsQuery {
    pub lat: f64,
    pub lng: f64,
}

pub(super) async fn list_nearby_parkings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ParkingsQuery>, QueryRejection>,
) -> Result<Json<Vec<ParkingItem>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "bad_request", rejection.body_text())
    })?;

    let parkings = state
        .aggregator
        .find_nearby_parkings(query.lat, query.lng)
        .await
        .map_err(|e| map_aggregate_error(req_id.0.clone(), &e))?;

    Ok(Json(parkings.into_iter().map(ParkingItem::from).collect()))
}

pub(super) fn map_aggregate_error(request_id: String, error: &AggregateError) -> ApiError {
    match error {
        AggregateError::InvalidCoordinates { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        AggregateError::NoProvider { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        AggregateError::Locator(_)
        | AggregateError::NoClient { .. }
        | AggregateError::Fetch { .. } => {
            tracing::error!(error = %error, "parking aggregation failed");
            ApiError::new(request_id, "internal_error", "internal server error")
        }
    }
}
