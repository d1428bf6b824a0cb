pub mod courier_insights;
pub mod station_queue;

pub use courier_insights::{courier_performance_window, CourierWindowSummary};
pub use station_queue::{
    orders_by_station, sla_remaining_minutes, station_summary, StationQueueEntry, StationSummary,
};
