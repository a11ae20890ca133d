//! Admin API routing configuration

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{MethodRouter, delete, get, post},
};

use super::{
    handlers::{
        create_store_credit, delete_store_credit, get_customer, get_store_credit,
        list_customer_store_credits, list_customers, list_store_credits, update_store_credit,
    },
    middleware::{AdminState, admin_auth_middleware, admin_cors_layer},
    types::AdminErrorResponse,
};

/// Mount point of the store credit admin API
pub const ADMIN_BASE_PATH: &str = "/admin/store-credits";

/// One entry of the admin route table
pub struct AdminRoute {
    pub method: &'static str,
    /// Path relative to `ADMIN_BASE_PATH`
    pub path: &'static str,
    pub summary: &'static str,
    pub handler: MethodRouter<AdminState>,
}

/// Admin route table
///
/// Every entry requires the admin principal.
pub fn admin_routes() -> Vec<AdminRoute> {
    vec![
        AdminRoute {
            method: "GET",
            path: "/",
            summary: "List store credits",
            handler: get(list_store_credits),
        },
        AdminRoute {
            method: "POST",
            path: "/",
            summary: "Create a store credit",
            handler: post(create_store_credit),
        },
        AdminRoute {
            method: "GET",
            path: "/customers",
            summary: "List customers with store credit totals",
            handler: get(list_customers),
        },
        AdminRoute {
            method: "GET",
            path: "/customers/{id}",
            summary: "Get a customer's store credit totals",
            handler: get(get_customer),
        },
        AdminRoute {
            method: "GET",
            path: "/customers/{id}/store-credits",
            summary: "List a customer's store credits",
            handler: get(list_customer_store_credits),
        },
        AdminRoute {
            method: "GET",
            path: "/{id}",
            summary: "Get a store credit",
            handler: get(get_store_credit),
        },
        AdminRoute {
            method: "POST",
            path: "/{id}",
            summary: "Update a store credit",
            handler: post(update_store_credit),
        },
        AdminRoute {
            method: "DELETE",
            path: "/{id}",
            summary: "Delete a store credit",
            handler: delete(delete_store_credit),
        },
    ]
}

/// Create the store credit admin router, mounted at `ADMIN_BASE_PATH`
///
/// # Authentication
/// Requires Admin API Key authentication, supports:
/// - `x-api-key` header
/// - `Authorization: Bearer <token>` header
///
/// # CORS
/// Only origins from `admin_cors` (comma-separated) are allowed, with credentials.
pub fn create_admin_router(state: AdminState, admin_cors: &str) -> Router {
    let routes = admin_routes()
        .into_iter()
        .fold(Router::new(), |router, route| {
            router.route(route.path, route.handler)
        })
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(admin_cors_layer(admin_cors))
        .with_state(state);

    Router::new().nest(ADMIN_BASE_PATH, routes)
}

/// Known path, unsupported method
async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(AdminErrorResponse::method_not_allowed()),
    )
}
