use serde::Serialize;

use crate::orm::{Entity, HasMany, HasOne, RecordState};

use super::{City, Role};

#[derive(Entity, Debug, Clone, Default, Serialize)]
pub struct User {
    #[primary_key]
    pub id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub id_city: Option<i64>,

    #[relation(cardinality = "has_one", target = City)]
    #[serde(skip_serializing_if = "HasOne::is_unloaded")]
    city: HasOne<City>,

    #[relation(
        cardinality = "has_many",
        target = Role,
        join_table = "users_roles",
        order = "name asc"
    )]
    #[serde(skip_serializing_if = "HasMany::is_unloaded")]
    roles: HasMany<Role>,

    #[state]
    #[serde(skip)]
    _state: RecordState,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
