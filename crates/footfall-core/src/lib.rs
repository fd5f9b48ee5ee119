pub mod config;
pub mod error;
pub mod identity;
pub mod track;
pub mod visits;
