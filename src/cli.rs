use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::{LatencyPlotSettings, MonitorOrder, PlotFormat, PlotType};

#[derive(Parser)]
#[command(name = "speed-sentry")]
#[command(about = "Speed Sentry REST API client", long_about = None)]
pub struct Cli {
    #[arg(short, long, help = "Path to the configuration file", default_value = "config/config.toml")]
    pub config: PathBuf,
    #[arg(long, help = "Path to a log4rs configuration file")]
    pub log_config: Option<PathBuf>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for values normally taken from the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    #[arg(short = 'u', long, global = true, help = "Base URL of the REST API")]
    pub base_url: Option<String>,
    #[arg(long, global = true, help = "Customer identifier")]
    pub customer_identifier: Option<String>,
    #[arg(long = "secret", global = true, help = "Base-64 encoded REST API secret")]
    pub rest_api_secret: Option<String>,
    #[arg(long = "timeout", global = true, help = "Per-request timeout in seconds")]
    pub timeout_secs: Option<u64>,
    #[arg(long, global = true, help = "File used to persist the clock delta")]
    pub time_delta_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Neither read nor write the clock delta file")]
    pub no_persist_time_delta: bool,
}

pub trait ApplyArgs {
    fn apply_connection(&mut self, args: &ConnectionArgs);
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the features available under the subscription
    Capabilities,
    /// Show one host/scheme
    HostsGet {
        #[arg(help = "Host/scheme ID")]
        host_scheme_id: i64,
    },
    /// List all hosts/schemes
    HostsList,
    /// Show one monitor
    MonitorsGet {
        #[arg(help = "Monitor ID")]
        monitor_id: i64,
    },
    /// List all monitors
    MonitorsList {
        #[arg(short, long, value_enum, help = "Key used to index the result", default_value_t = OrderArg::MonitorId)]
        order_by: OrderArg,
    },
    /// Replace all monitors with the entries of a JSON file
    MonitorsUpdate {
        #[arg(short, long, help = "JSON file holding an array of monitor entries")]
        file: PathBuf,
    },
    /// Show the description of a region
    RegionsGet {
        #[arg(help = "Region ID")]
        region_id: i64,
    },
    /// List all regions
    RegionsList,
    /// Show one event
    EventsGet {
        #[arg(help = "Event ID")]
        event_id: i64,
    },
    /// List events in a time range
    EventsList {
        #[arg(short, long, help = "Start of the range (Unix timestamp)", default_value_t = 0)]
        start: i64,
        #[arg(short, long, help = "End of the range (Unix timestamp), 0 for now", default_value_t = 0)]
        end: i64,
    },
    /// Create a custom event
    EventsCreate {
        #[arg(short = 't', long = "type", help = "Event type, 1 through 10")]
        event_type: i64,
        #[arg(short, long, help = "Event message")]
        message: String,
        #[arg(long, help = "Monitor the event is tied to, 0 for the first monitor", default_value_t = 0)]
        monitor_id: i64,
    },
    /// Show the status of one monitor
    StatusGet {
        #[arg(help = "Monitor ID")]
        monitor_id: i64,
    },
    /// Show the status of every monitor
    StatusList,
    /// Fetch monitors, hosts, events and status at once
    MultipleList,
    /// List latency samples
    LatencyList {
        #[arg(long, help = "Limit to one monitor", default_value_t = 0)]
        monitor_id: i64,
        #[arg(long, help = "Limit to one region", default_value_t = 0)]
        region_id: i64,
        #[arg(short, long, help = "Start of the range (Unix timestamp)", default_value_t = 0)]
        start: i64,
        #[arg(short, long, help = "End of the range (Unix timestamp), 0 for now", default_value_t = 0)]
        end: i64,
    },
    /// Render a latency plot to a file
    LatencyPlot {
        #[arg(short, long, help = "Path to the output image")]
        output: PathBuf,
        #[command(flatten)]
        plot: PlotArgs,
    },
    /// Enable or disable maintenance mode
    CustomerPause {
        #[arg(long, help = "Resume monitoring instead of pausing it")]
        resume: bool,
    },
    /// Fetch and store the clock delta reported by the server
    TimeDelta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    MonitorId,
    UserOrdering,
    Url,
}

impl From<OrderArg> for MonitorOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::MonitorId => MonitorOrder::MonitorId,
            OrderArg::UserOrdering => MonitorOrder::UserOrdering,
            OrderArg::Url => MonitorOrder::Url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlotTypeArg {
    History,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlotFormatArg {
    Png,
    Jpg,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlotArgs {
    #[arg(long, value_enum, help = "Plot type")]
    pub plot_type: Option<PlotTypeArg>,
    #[arg(long, conflicts_with = "monitor_id", help = "Limit to one host/scheme")]
    pub host_scheme_id: Option<i64>,
    #[arg(long, help = "Limit to one monitor")]
    pub monitor_id: Option<i64>,
    #[arg(long, help = "Limit to one region")]
    pub region_id: Option<i64>,
    #[arg(long, help = "Start of the range (Unix timestamp)")]
    pub start: Option<i64>,
    #[arg(long, help = "End of the range (Unix timestamp)")]
    pub end: Option<i64>,
    #[arg(long, help = "Plot title")]
    pub title: Option<String>,
    #[arg(long, help = "X axis label")]
    pub x_axis_label: Option<String>,
    #[arg(long, help = "Y axis label")]
    pub y_axis_label: Option<String>,
    #[arg(long, help = "Date format for the X axis")]
    pub date_format: Option<String>,
    #[arg(long, help = "Title font")]
    pub title_font: Option<String>,
    #[arg(long, help = "Axis title font")]
    pub axis_title_font: Option<String>,
    #[arg(long, help = "Axis label font")]
    pub axis_label_font: Option<String>,
    #[arg(long, help = "Lower bound of the latency axis, in seconds")]
    pub minimum_latency: Option<f64>,
    #[arg(long, help = "Upper bound of the latency axis, in seconds")]
    pub maximum_latency: Option<f64>,
    #[arg(long, help = "Use a logarithmic latency axis")]
    pub log_scale: bool,
    #[arg(long, help = "Image width in pixels")]
    pub width: Option<u32>,
    #[arg(long, help = "Image height in pixels")]
    pub height: Option<u32>,
    #[arg(long, value_enum, help = "Image format")]
    pub format: Option<PlotFormatArg>,
}

impl From<PlotArgs> for LatencyPlotSettings {
    fn from(args: PlotArgs) -> Self {
        Self {
            plot_type: args.plot_type.map(|t| match t {
                PlotTypeArg::History => PlotType::History,
                PlotTypeArg::Histogram => PlotType::Histogram,
            }),
            host_scheme_id: args.host_scheme_id,
            monitor_id: args.monitor_id,
            region_id: args.region_id,
            start_timestamp: args.start,
            end_timestamp: args.end,
            title: args.title,
            x_axis_label: args.x_axis_label,
            y_axis_label: args.y_axis_label,
            date_format: args.date_format,
            title_font: args.title_font,
            axis_title_font: args.axis_title_font,
            axis_label_font: args.axis_label_font,
            minimum_latency: args.minimum_latency,
            maximum_latency: args.maximum_latency,
            log_scale: args.log_scale.then_some(true),
            width: args.width,
            height: args.height,
            format: args.format.map(|f| match f {
                PlotFormatArg::Png => PlotFormat::Png,
                PlotFormatArg::Jpg => PlotFormat::Jpg,
            }),
        }
    }
}
