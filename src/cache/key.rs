//! Cache key validation
//!
//! Keys are used verbatim as file names directly inside the cache
//! directory, so anything that could escape it or collide with an
//! in-flight temp file is refused.

use crate::error::{WebSessionError, WebSessionResult};
use uuid::Uuid;

/// Prefix of temp files written by `put` before the atomic rename
pub const TEMP_PREFIX: &str = ".tmp-";

/// Check that `key` is safe to use as a file name in the cache directory
pub fn validate(key: &str) -> WebSessionResult<()> {
    let reason = if key.is_empty() {
        "is empty"
    } else if key == "." || key == ".." {
        "is a relative directory reference"
    } else if key.contains(['/', '\\']) {
        "contains a path separator"
    } else if key.contains('\0') {
        "contains a NUL byte"
    } else if is_temp_name(key) {
        "uses the reserved temp-file prefix"
    } else {
        return Ok(());
    };

    Err(WebSessionError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// Whether a directory entry name belongs to an in-flight or abandoned write
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}

/// Fresh temp file name, unique across processes sharing the directory
pub fn temp_name() -> String {
    format!("{}{}", TEMP_PREFIX, Uuid::new_v4().simple())
}
