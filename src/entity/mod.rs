pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod favorites;
pub mod messages;
pub mod orders;
pub mod products;
pub mod subcategories;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use messages::Entity as Messages;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use subcategories::Entity as Subcategories;
pub use users::Entity as Users;
