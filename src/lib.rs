//! Astronomy calculations for photography planning

pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod repo;
pub mod routes;
pub mod services;
pub mod utils;
