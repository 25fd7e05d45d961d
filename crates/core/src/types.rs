/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monotonic trigger generation of an entity. Starts at 0, bumped on every retrigger.
pub type Generation = u64;
