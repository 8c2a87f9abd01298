use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    ClockIn,
    ClockOut,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ClockIn => "entrada",
            EventKind::ClockOut => "salida",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One clock event pair: opened by a clock-in, optionally closed by a
/// later clock-out. Field names are the on-disk JSON keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub name: String,
    /// Calendar date of the clock-in, `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS`, set at creation.
    pub clock_in_time: String,
    /// `HH:MM:SS`; `None` until a matching clock-out is recorded.
    pub clock_out_time: Option<String>,
    /// Reserved, always null today.
    pub location: Option<serde_json::Value>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }
}
