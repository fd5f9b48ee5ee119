pub mod stats;
pub mod timeseries;
