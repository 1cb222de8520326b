//! Ergonomic error context helpers.
//!
//! Provides an extension trait for adding context to `Result` types,
//! converting IO errors into path-annotated `CookieError` variants.

use crate::base::error::CookieError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Attach the backing store path to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use cookiejar::base::context::IoResultExt;
    ///
    /// let raw = std::fs::read(&path).storage_context(&path)?;
    /// // Error: "Backing store I/O failed for /tmp/cookies.json: permission denied"
    /// ```
    fn storage_context(self, path: &Path) -> Result<T, CookieError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn storage_context(self, path: &Path) -> Result<T, CookieError> {
        self.map_err(|e| CookieError::storage(path, e))
    }
}
