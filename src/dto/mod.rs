//! Request, response, and SSE payload definitions for the HTTP surface.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod progress;
pub mod scoreboard;
pub mod sse;
pub mod validation;

fn format_offset_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
