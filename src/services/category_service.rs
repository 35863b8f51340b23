use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::categories::{CategoryList, CategoryWithSubcategories},
    dto::products::ProductList,
    entity::{
        categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        products::{Column as ProductCol, Entity as Products},
        subcategories::{Column as SubcategoryCol, Entity as Subcategories, Model as SubcategoryModel},
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    routes::params::CategoryProductsQuery,
    services::product_service::product_from_entity,
    state::AppState,
};

use crate::models::{Category, Subcategory};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?;

    let subcategories = Subcategories::find()
        .order_by_asc(SubcategoryCol::Name)
        .all(&state.orm)
        .await?;

    let items = categories
        .into_iter()
        .map(|category| {
            let subs = subcategories
                .iter()
                .filter(|sub| sub.category_id == category.id)
                .cloned()
                .map(subcategory_from_entity)
                .collect();
            CategoryWithSubcategories {
                category: category_from_entity(category),
                subcategories: subs,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_category(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<CategoryWithSubcategories>> {
    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let subcategories = Subcategories::find()
        .filter(SubcategoryCol::CategoryId.eq(category.id))
        .order_by_asc(SubcategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(subcategory_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Category",
        CategoryWithSubcategories {
            category: category_from_entity(category),
            subcategories,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_category_products(
    state: &AppState,
    slug: &str,
    query: CategoryProductsQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let mut finder = Products::find().filter(ProductCol::CategoryId.eq(category.id));

    if let Some(sub_slug) = query.subcategory.as_ref().filter(|s| !s.is_empty()) {
        let subcategory = Subcategories::find()
            .filter(SubcategoryCol::Slug.eq(sub_slug.clone()))
            .filter(SubcategoryCol::CategoryId.eq(category.id))
            .one(&state.orm)
            .await?;
        let subcategory = match subcategory {
            Some(s) => s,
            None => return Err(AppError::NotFound),
        };
        finder = finder.filter(ProductCol::SubcategoryId.eq(subcategory.id));
    }

    finder = finder.order_by_desc(ProductCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn subcategory_from_entity(model: SubcategoryModel) -> Subcategory {
    Subcategory {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
