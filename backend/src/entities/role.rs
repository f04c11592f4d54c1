use serde::Serialize;

use crate::orm::{Entity, HasMany, RecordState};

use super::User;

#[derive(Entity, Debug, Clone, Default, Serialize)]
pub struct Role {
    pub id: Option<i64>,
    pub name: String,

    #[relation(
        cardinality = "has_many",
        target = User,
        join_table = "users_roles",
        order = "name asc"
    )]
    #[serde(skip_serializing_if = "HasMany::is_unloaded")]
    users: HasMany<User>,

    #[state]
    #[serde(skip)]
    _state: RecordState,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
