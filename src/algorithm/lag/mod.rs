//! Lag-correlation scanning between an exposure and an outcome series

pub mod detail;
pub mod input;
pub mod scanner;
pub mod shift;
pub mod yearly;

pub use detail::inspect_top;
pub use input::ScanInput;
pub use scanner::{DiscardedShift, LagScanner, ScanReport, sort_candidates};
pub use shift::{OutcomeIndex, shift_key};
pub use yearly::correlate_by_year;
