//! Blog - staff-written posts, lowercase tags and comments
//!
//! This library provides the core of the blog service: configuration,
//! persistence, caching, business rules and the HTTP API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
