pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod recorder;
pub mod routes;
pub mod state;
pub mod tracking;
