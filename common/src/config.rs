use serde::{Deserialize, Serialize};

use crate::types::ThermostatMode;

pub const MIN_LOG_INTERVAL_S: u16 = 5;
pub const MAX_LOG_INTERVAL_S: u16 = 1_000;

pub const MIN_SETTING_TEMP_C: f32 = -50.0;
pub const MAX_SETTING_TEMP_C: f32 = 150.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub loop_period_ms: u64,
    pub redraw_interval_ms: u64,
    pub debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loop_period_ms: 40,
            redraw_interval_ms: 2_000,
            debounce_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub log_file: String,
    pub settings_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_file: "log.txt".to_string(),
            settings_file: "settings.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThermostatConfig {
    pub target_temp_c: f32,
    pub half_window_c: f32,
    pub undershoot_c: f32,
    pub overshoot_c: f32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            target_temp_c: 18.0,
            half_window_c: 0.5,
            undershoot_c: 0.2,
            overshoot_c: 0.2,
        }
    }
}

impl ThermostatConfig {
    pub const FIELD_COUNT: usize = 4;

    pub fn to_fields(self) -> [f32; Self::FIELD_COUNT] {
        [
            self.target_temp_c,
            self.half_window_c,
            self.undershoot_c,
            self.overshoot_c,
        ]
    }

    pub fn from_fields(fields: [f32; Self::FIELD_COUNT]) -> Self {
        Self {
            target_temp_c: fields[0],
            half_window_c: fields[1],
            undershoot_c: fields[2],
            overshoot_c: fields[3],
        }
    }

    pub fn sanitize(&mut self) {
        self.target_temp_c = clamp_setting_temp(self.target_temp_c, 18.0);
        self.half_window_c = clamp_setting_temp(self.half_window_c, 0.5);
        self.undershoot_c = clamp_setting_temp(self.undershoot_c, 0.2);
        self.overshoot_c = clamp_setting_temp(self.overshoot_c, 0.2);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistedSettings {
    pub log_interval_s: u16,
    pub thermostat: ThermostatConfig,
    pub mode: ThermostatMode,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            log_interval_s: 10,
            thermostat: ThermostatConfig::default(),
            mode: ThermostatMode::Off,
        }
    }
}

impl PersistedSettings {
    pub fn sanitize(&mut self) {
        self.log_interval_s = self
            .log_interval_s
            .clamp(MIN_LOG_INTERVAL_S, MAX_LOG_INTERVAL_S);
        self.thermostat.sanitize();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub air_temp_c: f32,
    pub liquid_temp_c: f32,
    pub actuator_heats: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            air_temp_c: 21.0,
            liquid_temp_c: 17.0,
            actuator_heats: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub timing: TimingConfig,
    pub storage: StorageConfig,
    pub settings: PersistedSettings,
    pub simulation: SimulationConfig,
}

pub fn clamp_setting_temp(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_SETTING_TEMP_C, MAX_SETTING_TEMP_C)
    } else {
        fallback
    }
}
