//! Endpoint accessors layered over [`RequestCoordinator`](crate::http::RequestCoordinator).
//!
//! Each accessor is a thin mapping: build the request object, post it to its
//! route, check `status == "OK"` and pull out the interesting field. The
//! shared call-and-unwrap logic lives in one generic helper on
//! [`RestApiClient`].

mod client;
pub mod routes;
mod types;

pub use client::RestApiClient;
pub use types::{
    Capabilities, ContentCheckMode, LatencyListing, LatencyPlotSettings, MonitorMethod, MonitorOrder, MonitorSettings,
    MultipleListing, PlotFormat, PlotType, PostContentType,
};
