//! Base types and error handling.
//!
//! - [`CookieError`](error::CookieError): every failure the store can observe
//! - [`IoResultExt`](context::IoResultExt): IO error context helpers

pub mod context;
pub mod error;
