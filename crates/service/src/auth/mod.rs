//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Sign-in, password hashing and token issuing/verification live here so
//! the HTTP layer only deals with headers and cookies.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
