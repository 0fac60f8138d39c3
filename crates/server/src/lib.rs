//! HTTP hosting layer for the cost optimization dashboard

pub mod api;
pub mod config;
