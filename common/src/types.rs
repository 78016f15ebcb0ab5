use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    config::{MAX_LOG_INTERVAL_S, MIN_LOG_INTERVAL_S},
    scheduler::{EventId, Scheduler},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThermostatMode {
    Off,
    Heat,
    Cool,
}

impl ThermostatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Off => 'X',
            Self::Heat => 'H',
            Self::Cool => 'C',
        }
    }

    pub fn from_letter(value: &str) -> Option<Self> {
        match value.trim() {
            "X" | "x" => Some(Self::Off),
            "H" | "h" => Some(Self::Heat),
            "C" | "c" => Some(Self::Cool),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Heat,
            Self::Heat => Self::Cool,
            Self::Cool => Self::Off,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Off => Self::Cool,
            Self::Heat => Self::Off,
            Self::Cool => Self::Heat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: NaiveDateTime,
    pub air_temp_c: f32,
    pub liquid_temp_c: f32,
    pub relay_on: bool,
}

impl TelemetrySample {
    pub fn empty(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            air_temp_c: 0.0,
            liquid_temp_c: 0.0,
            relay_on: false,
        }
    }

    pub fn log_line(&self) -> String {
        format!(
            "{};{:.2};{:.2};{}",
            self.timestamp.and_utc().timestamp(),
            self.air_temp_c,
            self.liquid_temp_c,
            u8::from(self.relay_on)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerState {
    pub live_write: bool,
    pub interval_s: u16,
}

impl LoggerState {
    pub fn cycle_interval_ms(&self) -> u64 {
        u64::from(self.interval_s) * 1_000
    }

    pub fn set_interval(&mut self, seconds: u16, scheduler: &mut Scheduler) {
        self.interval_s = seconds.clamp(MIN_LOG_INTERVAL_S, MAX_LOG_INTERVAL_S);
        scheduler.set_interval(EventId::Cycle, Some(self.cycle_interval_ms()));
    }
}
