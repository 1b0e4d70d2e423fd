//! # TaskFlow API Server Library
//!
//! The HTTP request layer for TaskFlow, built on axum.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment configuration
//! - `error`: `ApiError` and its HTTP mapping
//! - `middleware`: session guard and security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
