pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod kv;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod state;
pub mod storage;
