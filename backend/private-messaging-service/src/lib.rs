//! Private one-to-one messaging for the blog platform: threads between two
//! users, per-side soft delete, read tracking, sender recall within a short
//! window and admin moderation.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
