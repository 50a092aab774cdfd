pub mod chart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod database;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod utils;
