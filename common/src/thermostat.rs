use tracing::{info, warn};

use crate::{config::ThermostatConfig, types::ThermostatMode};

// Lets decimal settings such as 12.9 trip exactly at the configured value.
const THRESHOLD_EPSILON_C: f32 = 1e-4;

pub fn next_relay_state(
    mode: ThermostatMode,
    config: &ThermostatConfig,
    relay_on: bool,
    control_temp_c: f32,
) -> bool {
    let lower_bound = config.target_temp_c - config.half_window_c;
    let upper_bound = config.target_temp_c + config.half_window_c;

    let below_band = control_temp_c - config.undershoot_c <= lower_bound + THRESHOLD_EPSILON_C;
    let above_band = control_temp_c + config.overshoot_c >= upper_bound - THRESHOLD_EPSILON_C;

    match mode {
        ThermostatMode::Off => relay_on,
        ThermostatMode::Heat if relay_on => !above_band,
        ThermostatMode::Heat => below_band,
        ThermostatMode::Cool if relay_on => !below_band,
        ThermostatMode::Cool => above_band,
    }
}

pub fn relay_pin_level(relay_on: bool) -> bool {
    !relay_on
}

#[derive(Debug, Clone)]
pub struct Thermostat {
    config: ThermostatConfig,
    mode: ThermostatMode,
    relay_on: bool,
}

impl Thermostat {
    pub fn new(mut config: ThermostatConfig, mode: ThermostatMode) -> Self {
        config.sanitize();
        Self {
            config,
            mode,
            relay_on: false,
        }
    }

    pub fn config(&self) -> &ThermostatConfig {
        &self.config
    }

    pub fn mode(&self) -> ThermostatMode {
        self.mode
    }

    pub fn is_relay_on(&self) -> bool {
        self.relay_on
    }

    pub fn set_config(&mut self, mut config: ThermostatConfig) {
        config.sanitize();
        self.config = config;
    }

    pub fn set_mode(&mut self, mode: ThermostatMode) {
        if self.mode != mode {
            info!("thermostat mode {} -> {}", self.mode.as_str(), mode.as_str());
            self.mode = mode;
        }
    }

    pub fn evaluate(&mut self, control_temp_c: f32) -> Option<bool> {
        if self.mode == ThermostatMode::Off {
            if self.relay_on {
                info!("thermostat off, releasing relay");
                self.relay_on = false;
                return Some(relay_pin_level(false));
            }
            return None;
        }

        if !control_temp_c.is_finite() {
            warn!("ignoring invalid control temperature {control_temp_c}");
            return Some(relay_pin_level(self.relay_on));
        }

        let next = next_relay_state(self.mode, &self.config, self.relay_on, control_temp_c);
        if next != self.relay_on {
            info!(
                "relay {} at {control_temp_c:.2}C ({} mode, target {:.1}C)",
                if next { "on" } else { "off" },
                self.mode.as_str(),
                self.config.target_temp_c
            );
            self.relay_on = next;
        }

        Some(relay_pin_level(self.relay_on))
    }
}
