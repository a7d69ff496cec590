//! Project performance dashboard: load a project sheet, filter it by
//! category and summarise it into KPIs and chart series.
//!
//! The [`pipeline::Pipeline`] answers one [`pipeline::DashboardRequest`] at a
//! time; the desktop window and the HTTP server are thin layers over it.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod server;
