//! Service layer providing the feedback platform's business operations on
//! top of the `models` entities.
//! - Reads go through `Db::reader`, writes and transactions through `Db::writer`.
//! - Every fallible operation returns `ServiceError`.

pub mod errors;
pub mod pagination;
pub mod query;
pub mod auth;
pub mod permission;
pub mod tenant_service;
pub mod project_service;
pub mod channel_service;
pub mod api_key_service;
pub mod issue_service;
pub mod feedback;
pub mod export;
pub mod history_service;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use models::db::Db;
