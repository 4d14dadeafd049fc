use chrono::{DateTime, Utc};

pub const FIXED_TIME_ENV: &str = "PRINTSCOPE_FIXED_TIME";

/// Current time, or the RFC 3339 instant in `PRINTSCOPE_FIXED_TIME` when set.
pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var(FIXED_TIME_ENV) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

/// Date stamp used for default export file names.
pub fn date_stamp(at: DateTime<Utc>) -> String {
    at.date_naive().to_string()
}
