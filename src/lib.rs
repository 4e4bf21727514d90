//! websessions - Flat-file web session cache
//!
//! Stores web sessions as individual files in a directory shared by any
//! number of server processes, and sweeps expired ones on a schedule.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod reaper;
pub mod session;

pub use cache::{ExpiryPolicy, FlatFileCache, SessionCache, SweepReport};
pub use clock::{Clock, SystemClock};
pub use error::{WebSessionError, WebSessionResult};
pub use reaper::{Reaper, ReaperState};
pub use session::{AccountId, SessionVal};
