//! Small types and wire names shared between the server and its tests.

use serde::Serialize;

/// Cookie carrying the signed-in user's JWT.
pub const AUTH_COOKIE: &str = "auth_token";
/// Cookie remembering the locale the visitor picked.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";
/// Header the feedback intake endpoint reads the project API key from.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Self { status: "ok", version: env!("CARGO_PKG_VERSION") }
    }
}
