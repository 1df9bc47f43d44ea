pub mod api;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod persist;

pub use crate::api::RestApiClient;
pub use crate::config::{ClientSettings, load_configuration};
pub use crate::http::{RequestCoordinator, RequestError, RestApiSecret};
pub use crate::persist::{FileClockDeltaSink, load_time_delta};
