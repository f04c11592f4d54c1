//! recordkit - active-record persistence with declarative relationship loading
//!
//! The library lives in [`orm`]; [`db`] provides the SQLite storage engine
//! and [`api`] a small HTTP front end over the sample [`entities`].

// Lets the derive's `::recordkit::...` paths resolve inside this crate
extern crate self as recordkit;

pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod orm;
