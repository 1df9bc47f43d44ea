//! Route paths of the v1 REST API.

pub const CAPABILITIES_GET: &str = "/v1/capabilities/get";
pub const HOSTS_GET: &str = "/v1/hosts/get";
pub const HOSTS_LIST: &str = "/v1/hosts/list";
pub const MONITORS_GET: &str = "/v1/monitors/get";
pub const MONITORS_LIST: &str = "/v1/monitors/list";
pub const MONITORS_UPDATE: &str = "/v1/monitors/update";
pub const REGIONS_GET: &str = "/v1/regions/get";
pub const REGIONS_LIST: &str = "/v1/regions/list";
pub const EVENTS_GET: &str = "/v1/events/get";
pub const EVENTS_LIST: &str = "/v1/events/list";
pub const EVENTS_CREATE: &str = "/v1/events/create";
pub const STATUS_GET: &str = "/v1/status/get";
pub const STATUS_LIST: &str = "/v1/status/list";
pub const MULTIPLE_LIST: &str = "/v1/multiple/list";
pub const LATENCY_LIST: &str = "/v1/latency/list";
pub const LATENCY_PLOT: &str = "/v1/latency/plot";
pub const CUSTOMER_PAUSE: &str = "/v1/customer/pause";
