use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique, indexed)]
    pub username: String,

    /// Argon2id password hash (PHC string, embeds params and salt)
    pub password_hash: String,

    /// Semicolon-separated, sorted, deduplicated scope set.
    ///
    /// The "admin" scope grants all permissions. To grant admin rights for a
    /// specific service, use "<service>:admin".
    pub scopes: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
