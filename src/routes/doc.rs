use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartLine,
    dto::{blogs::BlogList, orders::{OrderRequest, ShippingAddress}, products::ProductList},
    models::{Blog, Order, OrderStatus, PaymentMethod, PaymentStatus, Product},
    response::{ApiResponse, Meta},
    routes::{blogs, health, orders, params, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        blogs::list_blogs,
        blogs::get_blog,
        orders::create_order,
        orders::get_order,
    ),
    components(
        schemas(
            Product,
            Blog,
            Order,
            CartLine,
            ShippingAddress,
            OrderRequest,
            PaymentMethod,
            OrderStatus,
            PaymentStatus,
            ProductList,
            BlogList,
            params::ProductSortBy,
            params::SortOrder,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Blog>,
            ApiResponse<BlogList>,
            ApiResponse<Order>,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog reads"),
        (name = "Blogs", description = "Blog reads"),
        (name = "Orders", description = "Order placement and lookup"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<utoipa::openapi::OpenApi> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
