//! Factories for generated entity fields.

use time::OffsetDateTime;
use uuid::Uuid;

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
