//! Sample entities backed by the seed schema in [`crate::db::seed`]

mod city;
mod role;
mod user;

pub use city::City;
pub use role::Role;
pub use user::User;
