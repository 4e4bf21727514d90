//! Session records stored in the cache

pub mod val;

pub use val::{AccountId, SessionVal};
