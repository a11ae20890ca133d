//! Store credit admin API
//!
//! HTTP API for issuing, adjusting and revoking customer store credits,
//! plus per-customer totals.
//!
//! # Usage
//! ```ignore
//! let service = StoreCreditService::new(Arc::new(store), limits);
//! let admin_state = AdminState::new(admin_api_key, service);
//! let admin_router = create_admin_router(admin_state, &config.admin_cors);
//! ```

mod aggregation;
mod error;
mod handlers;
mod middleware;
mod router;
mod service;
pub mod types;
pub mod validation;

pub use middleware::AdminState;
pub use router::{ADMIN_BASE_PATH, admin_routes, create_admin_router};
pub use service::StoreCreditService;
