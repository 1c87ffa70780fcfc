//! Category page
//!
//! - GET /category/{category_slug}/ - published posts of a published category

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::PageQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::CategoryContext;

/// Build the category router
pub fn router() -> Router<AppState> {
    Router::new().route("/category/{category_slug}/", get(category_posts))
}

/// GET /category/{category_slug}/ - Unpublished categories are 404
async fn category_posts(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryContext>, ApiError> {
    let selector = query.selector()?;
    let category = state
        .category_service
        .get_published_by_slug(&category_slug)
        .await?;
    let page_obj = state
        .post_service
        .list_by_category(category.id, selector)
        .await?;

    Ok(Json(CategoryContext { category, page_obj }))
}
