use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    dto::blogs::BlogList,
    entity::blogs::{Column, Entity as Blogs, Model as BlogModel},
    error::{AppError, AppResult},
    models::Blog,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_blogs(state: &AppState, pagination: Pagination) -> AppResult<ApiResponse<BlogList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Blogs::find().order_by_desc(Column::PublishedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(blog_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Blogs",
        BlogList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_blog(state: &AppState, id_or_slug: &str) -> AppResult<ApiResponse<Blog>> {
    let finder = match Uuid::parse_str(id_or_slug) {
        Ok(id) => Blogs::find_by_id(id),
        Err(_) => Blogs::find().filter(Column::Slug.eq(id_or_slug)),
    };
    match finder.one(&state.orm).await? {
        Some(blog) => Ok(ApiResponse::success("Blog", blog_from_entity(blog), None)),
        None => Err(AppError::NotFound),
    }
}

fn blog_from_entity(model: BlogModel) -> Blog {
    Blog {
        id: model.id,
        title: model.title,
        slug: model.slug,
        excerpt: model.excerpt,
        content: model.content,
        cover_image: model.cover_image,
        published_at: model.published_at.with_timezone(&Utc),
    }
}
