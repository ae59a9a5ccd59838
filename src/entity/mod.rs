pub mod audit_logs;
pub mod blogs;
pub mod order_items;
pub mod orders;
pub mod products;

pub use audit_logs::Entity as AuditLogs;
pub use blogs::Entity as Blogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
