//! CDS Monitoring Terminal UI Library
//!
//! Live, read-only view of a CDS platform: the job queue, worker counts per
//! hatchery and the global status lines, refreshed in the background and
//! redrawn every second.
//!
//! The crate splits into:
//! - [`model`]: API payloads
//! - [`status`] and [`format`]: status icons, wait urgency, text helpers
//! - [`aggregate`]: queue rows and hatchery buckets built from snapshots
//! - [`data`]: the [`data::MonitoringApi`] seam, its HTTP client and the poller
//! - [`app`], [`events`], [`ui`], [`widgets`]: dashboard state, input and drawing

pub mod aggregate;
pub mod app;
pub mod browser;
pub mod config;
pub mod data;
pub mod demo;
pub mod error;
pub mod events;
pub mod format;
pub mod model;
pub mod status;
pub mod ui;
pub mod widgets;

pub use app::DashboardState;
pub use config::MonitorConfig;
pub use data::{HttpApi, MonitoringApi, Poller};
pub use error::{MonitorError, MonitorResult};
