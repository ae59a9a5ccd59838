pub mod blogs;
pub mod orders;
pub mod products;
