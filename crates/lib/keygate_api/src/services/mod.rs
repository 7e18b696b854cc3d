//! Application services: orchestration between codecs and the store.

pub mod api_keys;
pub mod auth;
