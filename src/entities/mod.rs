pub mod prelude;

pub mod auth_users;
