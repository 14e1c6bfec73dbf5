pub mod cli;
pub mod config;
pub mod data;
pub mod plot;
pub mod report;
pub mod sample;
pub mod sim;
