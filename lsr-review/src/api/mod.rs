//! HTTP API handlers for lsr-review

pub mod assist;
pub mod dataset;
pub mod health;
pub mod items;

pub use assist::{backup, refine};
pub use dataset::{download, get_config, get_session, get_status, load_dataset, navigate};
pub use health::{health_routes, BuildInfo};
pub use items::{add_missing_points, open_item, update_point, update_scenario, update_situation};
