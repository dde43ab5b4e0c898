//! HTTP control surface.
//!
//! A thin JSON API over [`crate::manager::ProcessManager`]. Unknown process
//! names map to `404`; every lifecycle result, successful or not, is a
//! `200` envelope describing the outcome.

pub mod server;
