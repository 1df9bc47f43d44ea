use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Features available under the customer's subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub customer_active: bool,
    pub maximum_number_monitors: i64,
    pub multi_region_checking: bool,
    pub paused: bool,
    pub polling_interval: i64,
    pub supports_content_checking: bool,
    pub supports_keyword_checking: bool,
    pub supports_latency_tracking: bool,
    pub supports_maintenance_mode: bool,
    pub supports_ping_based_polling: bool,
    pub supports_post_method: bool,
    pub supports_rest_api: bool,
    pub supports_ssl_expiration_checking: bool,
    pub supports_wordpress: bool,
}

/// Key used to index the map returned by `monitors_list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorOrder {
    #[default]
    MonitorId,
    UserOrdering,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCheckMode {
    NoCheck,
    ContentMatch,
    AllKeywords,
    AnyKeywords,
}

/// Content type a monitor reports when it sends a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostContentType {
    Text,
    Json,
    Xml,
}

/// One monitor entry for `monitors_update`.
///
/// Entries are sent as a JSON array; an entry's position is its user
/// ordering. Unset fields take the server defaults. `keywords` and
/// `post_content` must already be base-64 encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MonitorMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_check_mode: Option<ContentCheckMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_content_type: Option<PostContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_content: Option<String>,
}

impl MonitorSettings {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

/// Result of `multiple_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleListing {
    pub monitors: Value,
    /// The `host_schemes` field of the response.
    pub authorities: Value,
    pub events: Value,
    /// The `monitor_status` field of the response.
    pub status: Value,
}

/// Result of `latency_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyListing {
    pub recent: Value,
    pub aggregated: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    History,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotFormat {
    #[serde(rename = "PNG")]
    Png,
    #[serde(rename = "JPG")]
    Jpg,
}

/// Settings for `latency_plot`. Omitted fields use the server defaults.
///
/// `host_scheme_id` and `monitor_id` are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyPlotSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<PlotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_scheme_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_title_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_label_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<PlotFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monitor_settings_omit_unset_fields() {
        let mut entry = MonitorSettings::new("https://example.com/health");
        entry.method = Some(MonitorMethod::Post);
        entry.post_content_type = Some(PostContentType::Json);
        entry.content_check_mode = Some(ContentCheckMode::AnyKeywords);

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "uri": "https://example.com/health",
                "method": "post",
                "content_check_mode": "any_keywords",
                "post_content_type": "json",
            })
        );
    }

    #[test]
    fn test_plot_settings_wire_names() {
        let settings = LatencyPlotSettings {
            plot_type: Some(PlotType::Histogram),
            monitor_id: Some(4),
            log_scale: Some(true),
            format: Some(PlotFormat::Jpg),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_string(&settings).unwrap(),
            r#"{"plot_type":"histogram","monitor_id":4,"log_scale":true,"format":"JPG"}"#
        );
    }

    #[test]
    fn test_capabilities_tolerate_missing_fields() {
        let caps: Capabilities = serde_json::from_value(json!({
            "customer_active": true,
            "maximum_number_monitors": 20,
            "supports_rest_api": true,
            "unknown_flag": 1,
        }))
        .unwrap();

        assert!(caps.customer_active);
        assert_eq!(caps.maximum_number_monitors, 20);
        assert!(caps.supports_rest_api);
        assert!(!caps.paused);
    }

    #[test]
    fn test_monitor_order_wire_names() {
        assert_eq!(serde_json::to_value(MonitorOrder::default()).unwrap(), json!("monitor_id"));
        assert_eq!(serde_json::to_value(MonitorOrder::UserOrdering).unwrap(), json!("user_ordering"));
        assert_eq!(serde_json::to_value(MonitorOrder::Url).unwrap(), json!("url"));
    }
}
