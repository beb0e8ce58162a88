/// Database primary keys for rules and recipients are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Hosts are keyed by the stable `server_id` they report with.
pub type HostId = String;
