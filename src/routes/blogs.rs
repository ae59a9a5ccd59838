use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::blogs::BlogList,
    error::AppResult,
    models::Blog,
    response::ApiResponse,
    routes::params::Pagination,
    services::blog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs))
        .route("/{id}", get(get_blog))
}

#[utoipa::path(
    get,
    path = "/api/blogs",
    params(Pagination),
    responses(
        (status = 200, description = "Published posts, newest first", body = ApiResponse<BlogList>)
    ),
    tag = "Blogs"
)]
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BlogList>>> {
    Ok(Json(blog_service::list_blogs(&state, pagination).await?))
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(
        ("id" = String, Path, description = "Blog ID or slug")
    ),
    responses(
        (status = 200, description = "Blog post", body = ApiResponse<Blog>),
        (status = 404, description = "Blog not found"),
    ),
    tag = "Blogs"
)]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Blog>>> {
    Ok(Json(blog_service::get_blog(&state, &id).await?))
}
