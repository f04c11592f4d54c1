use serde::Serialize;

use crate::orm::{Entity, HasMany, RecordState};

use super::User;

#[derive(Entity, Debug, Clone, Default, Serialize)]
pub struct City {
    pub id: Option<i64>,
    pub name: String,

    /// Residents, through `users.id_city`
    #[relation(cardinality = "has_many", target = User)]
    #[serde(skip_serializing_if = "HasMany::is_unloaded")]
    users: HasMany<User>,

    #[state]
    #[serde(skip)]
    _state: RecordState,
}

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
