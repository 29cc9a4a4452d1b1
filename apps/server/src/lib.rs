//! Fileshare Server Library
//!
//! This module exposes the server components for testing purposes.

pub mod client_ip;
pub mod config;
pub mod db;
pub mod error;
pub mod locale;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod share;
pub mod storage;
pub mod store;
