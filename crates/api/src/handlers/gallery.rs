use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::GalleryItem;

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub items: Vec<GalleryItem>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

/// GET /api/v1/gallery?limit=&skip=
///
/// Completed characters, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<GalleryResponse>>> {
    let (limit, skip) = (params.limit(), params.skip());
    let page = state.service.gallery(limit, skip).await?;
    Ok(Json(DataResponse {
        data: GalleryResponse {
            items: page
                .characters
                .iter()
                .map(|c| GalleryItem::new(c, &state.storage))
                .collect(),
            total: page.total,
            limit,
            skip,
        },
    }))
}
