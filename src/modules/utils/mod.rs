pub mod logging;
pub mod time;

pub use logging::{format_sensitive, initialize_logging, log_auth_event, log_store_operation};
pub use time::{format_duration, format_timestamp};
