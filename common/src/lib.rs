pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod settings;
pub mod telemetry;
pub mod thermostat;
pub mod types;
pub mod ui;

#[cfg(test)]
mod testing;

pub use board::Board;
pub use config::{PersistedSettings, RuntimeConfig, ThermostatConfig};
pub use controller::{Controller, InputEvent};
pub use error::{SettingError, StorageError};
pub use scheduler::{EventId, Scheduler};
pub use telemetry::TelemetryBuffer;
pub use thermostat::Thermostat;
pub use types::{LoggerState, TelemetrySample, ThermostatMode};
pub use ui::Screen;
