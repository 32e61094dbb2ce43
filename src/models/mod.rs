//! Data models

pub mod transaction;
pub mod otp;

pub use transaction::*;
pub use otp::*;
