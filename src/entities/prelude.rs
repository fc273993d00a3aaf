pub use super::auth_users::Entity as AuthUsers;
