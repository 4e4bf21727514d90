//! CLI command implementations

pub mod config;
pub mod list;
pub mod log_out;
pub mod serve;
pub mod status;
pub mod sweep;

pub use config::execute as config;
pub use list::execute as list;
pub use log_out::execute as log_out;
pub use serve::execute as serve;
pub use status::execute as status;
pub use sweep::execute as sweep;
