//! Data models for the application
//!
//! Tickets authorize an upload, file records describe what was durably stored,
//! and the redemption receipt is what a successful upload returns.

mod file_record;
mod redemption;
mod ticket;

pub use file_record::*;
pub use redemption::*;
pub use ticket::*;
