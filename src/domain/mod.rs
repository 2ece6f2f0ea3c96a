//! Domain records shared by the store, the pipeline and the API.

pub mod adr;
pub mod assessment;
pub mod categories;
pub mod institution;
pub mod user;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the millisecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
