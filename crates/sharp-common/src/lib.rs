//! Common types and utilities shared across all sharp-movie crates.

pub mod error;
pub mod frame;
pub mod region;
pub mod time;

pub use error::{SharpError, SharpResult};
pub use frame::{Frame, FrameStack};
pub use region::HarpId;
pub use time::{TaiTimestamp, TimeRange};
