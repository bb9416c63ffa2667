pub mod adapters;
pub mod telemetry;
