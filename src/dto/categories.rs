use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, Subcategory};

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryWithSubcategories {
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<CategoryWithSubcategories>,
}
