pub mod alerts;
pub mod analytics;
pub mod meter_readings;
pub mod quality_readings;
pub mod users;
