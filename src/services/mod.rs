pub mod user_service;
pub use user_service::{User, UserError, UserService, normalize_scopes};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
