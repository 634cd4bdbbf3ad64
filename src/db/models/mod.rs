pub mod alert;
pub mod meter_reading;
pub mod quality_reading;
pub mod stats;
pub mod user;

pub use alert::{Alert, AlertType, Severity};
pub use meter_reading::MeterReading;
pub use quality_reading::QualityReading;
pub use stats::{
    DailyQualityPoint, DailyUsagePoint, MeterStats, QualityStats, SafetySlice, UserStatistics,
};
pub use user::{NewUser, UserAccount, UserSettings};
