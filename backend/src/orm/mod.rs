//! Active-record persistence layer
//!
//! Entities are plain structs deriving [`Entity`]. The derive produces a
//! static declaration (table, keys, relationships) from which metadata is
//! extracted once per type, plus a lazy accessor for each relationship
//! field. Every entity then gets [`ActiveRecord`] for free.
//!
//! # Example
//!
//! ```rust,ignore
//! use recordkit::orm::{ActiveRecord, Entity, Filters, HasMany, HasOne, RecordState};
//!
//! #[derive(Entity, Debug, Clone, Default)]
//! pub struct User {
//!     pub id: Option<i64>,
//!     pub name: String,
//!     pub id_city: Option<i64>,
//!     #[relation(cardinality = "has_one", target = City)]
//!     city: HasOne<City>,
//!     #[state]
//!     _state: RecordState,
//! }
//!
//! let mut user = User::get(&db, 1).await?;
//! let city = user.city(&db).await?;
//! user.name = "Raphael".into();
//! user.save(&db).await?;
//! ```
//!
//! Nothing here talks to a driver: all I/O goes through the [`Storage`]
//! handle passed to each operation.

mod active_record;
pub mod builder;
mod error;
mod filters;
pub mod inflector;
mod mapper;
mod metadata;
mod pagination;
mod persistence;
mod relations;
mod repository;
mod storage;
mod traits;
mod value;

pub use recordkit_macros::Entity;

pub use active_record::ActiveRecord;
pub use error::{OrmError, Result, StorageError};
pub use filters::{Filters, OrderBy, SortDirection, is_identifier};
pub use mapper::{from_partial, from_row, from_rows, to_row};
pub use metadata::{
    Cardinality, EntityMetadata, RelationMetadata, foreign_key_for, metadata_for,
    metadata_for_ref, table_name_for,
};
pub use pagination::{Link, PageEnvelope, PageLinks, RequestContext, build_page};
pub use relations::{HasMany, HasOne};
pub use repository::{CountQuery, FindQuery};
pub use storage::{Join, Select, Storage};
pub use traits::{Entity, EntityDeclaration, EntityRef, RecordState, RelationDeclaration, SaveHooks};
pub use value::{ColumnValue, Row, SqlValue, row_from_json};
