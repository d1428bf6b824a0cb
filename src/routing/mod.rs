pub mod station_router;

pub use station_router::{RouteOutcome, StationRouter};
