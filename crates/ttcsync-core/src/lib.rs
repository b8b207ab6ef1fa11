//! Core types: advisory events, closure classification, date ranges, retry, tracing

pub mod closure;
pub mod dates;
pub mod event;
pub mod retry;
pub mod tracing;

pub use closure::{ClosureType, classify};
pub use dates::{DateRangeError, parse_date_range};
pub use event::Event;
pub use retry::RetryPolicy;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
