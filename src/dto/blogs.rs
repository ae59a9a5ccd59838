use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Blog;

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogList {
    pub items: Vec<Blog>,
}
