use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartItemDto, CartList},
        categories::{CategoryList, CategoryWithSubcategories},
        favorites::FavoriteProductList,
        messages::{ContactRequest, MessageList, ReplyMessageRequest, UpdateMessageStatusRequest},
        orders::{CheckoutItemRequest, CheckoutRequest, OrderList, PlacedOrder},
        products,
    },
    models::{
        CartItem, Category, Favorite, Message, Order, OrderLine, Product, Subcategory, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, categories, favorites, health, messages, orders, params,
        products as product_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::list_category_products,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        messages::submit_message,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::delete_order,
        admin::list_messages,
        admin::update_message_status,
        admin::reply_message
    ),
    components(
        schemas(
            User,
            Product,
            Category,
            Subcategory,
            Favorite,
            CartItem,
            Order,
            OrderLine,
            Message,
            CartItemDto,
            CartList,
            CategoryList,
            CategoryWithSubcategories,
            FavoriteProductList,
            ContactRequest,
            MessageList,
            ReplyMessageRequest,
            UpdateMessageStatusRequest,
            CheckoutItemRequest,
            CheckoutRequest,
            OrderList,
            PlacedOrder,
            products::ProductList,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            admin::UpdateOrderStatusRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::MessageListQuery,
            params::CategoryProductsQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<PlacedOrder>,
            ApiResponse<MessageList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category browsing endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Orders", description = "Checkout and order history endpoints"),
        (name = "Messages", description = "Contact message endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
