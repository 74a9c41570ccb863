use chrono::{DateTime, Utc};

/// A value that knows when it stops being valid.
pub trait Expirable {
    fn is_expired(&self, now: DateTime<Utc>) -> bool;
}
