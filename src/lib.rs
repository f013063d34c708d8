//! Account registration, login and profile management backed by a remote
//! document store and blob store.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod forms;
pub mod navigation;
pub mod routes;
pub mod session;
pub mod state;
pub mod user;
