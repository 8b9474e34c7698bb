//! # Knowledge Hub API Server Library
//!
//! HTTP surface of the multi-tenant knowledge hub. Handlers are thin: they
//! decode and validate requests, take the tenant from the caller's token,
//! and delegate to [`kbhub_shared::usecase::UseCases`].
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with JSON error bodies
//! - `middleware`: JWT authentication and role gates
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
