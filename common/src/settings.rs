use core::fmt::Write as _;

use heapless::String as BoundedString;
use tracing::debug;

use crate::{
    config::{clamp_setting_temp, PersistedSettings, MAX_LOG_INTERVAL_S, MIN_LOG_INTERVAL_S},
    error::SettingError,
    types::ThermostatMode,
};

pub const LOG_INTERVAL: &str = "logInterval";
pub const TEMP_TARGET: &str = "tempTarget";
pub const TEMP_RANGE: &str = "tempRange";
pub const TEMP_UNDERSHOOT: &str = "tempUndershoot";
pub const TEMP_OVERSHOOT: &str = "tempOvershoot";
pub const THERMOSTAT_MODE: &str = "thermostatMode";

pub const MAX_TOKEN_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setting {
    LogInterval(u16),
    TempTarget(f32),
    TempRange(f32),
    TempUndershoot(f32),
    TempOvershoot(f32),
    Mode(ThermostatMode),
}

impl Setting {
    pub fn parse(name: &str, value: &str) -> Result<Self, SettingError> {
        let value = value.trim();
        let invalid = || SettingError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let temperature = || -> Result<f32, SettingError> {
            match value.parse::<f32>() {
                Ok(parsed) if parsed.is_finite() => Ok(clamp_setting_temp(parsed, parsed)),
                _ => Err(invalid()),
            }
        };

        match name.trim() {
            LOG_INTERVAL => {
                let parsed = value.parse::<i64>().map_err(|_| invalid())?;
                let clamped =
                    parsed.clamp(i64::from(MIN_LOG_INTERVAL_S), i64::from(MAX_LOG_INTERVAL_S));
                Ok(Self::LogInterval(clamped as u16))
            }
            TEMP_TARGET => temperature().map(Self::TempTarget),
            TEMP_RANGE => temperature().map(Self::TempRange),
            TEMP_UNDERSHOOT => temperature().map(Self::TempUndershoot),
            TEMP_OVERSHOOT => temperature().map(Self::TempOvershoot),
            THERMOSTAT_MODE => ThermostatMode::from_letter(value)
                .map(Self::Mode)
                .ok_or_else(invalid),
            other => Err(SettingError::UnknownName(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LogInterval(_) => LOG_INTERVAL,
            Self::TempTarget(_) => TEMP_TARGET,
            Self::TempRange(_) => TEMP_RANGE,
            Self::TempUndershoot(_) => TEMP_UNDERSHOOT,
            Self::TempOvershoot(_) => TEMP_OVERSHOOT,
            Self::Mode(_) => THERMOSTAT_MODE,
        }
    }

    pub fn apply_to(self, settings: &mut PersistedSettings) {
        match self {
            Self::LogInterval(seconds) => settings.log_interval_s = seconds,
            Self::TempTarget(value) => settings.thermostat.target_temp_c = value,
            Self::TempRange(value) => settings.thermostat.half_window_c = value,
            Self::TempUndershoot(value) => settings.thermostat.undershoot_c = value,
            Self::TempOvershoot(value) => settings.thermostat.overshoot_c = value,
            Self::Mode(mode) => settings.mode = mode,
        }
    }

    fn write_value(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match self {
            Self::LogInterval(seconds) => write!(out, "{seconds}"),
            Self::TempTarget(value)
            | Self::TempRange(value)
            | Self::TempUndershoot(value)
            | Self::TempOvershoot(value) => write!(out, "{value}"),
            Self::Mode(mode) => write!(out, "{}", mode.letter()),
        };
    }
}

pub fn settings_of(settings: &PersistedSettings) -> [Setting; 6] {
    [
        Setting::LogInterval(settings.log_interval_s),
        Setting::TempTarget(settings.thermostat.target_temp_c),
        Setting::TempRange(settings.thermostat.half_window_c),
        Setting::TempUndershoot(settings.thermostat.undershoot_c),
        Setting::TempOvershoot(settings.thermostat.overshoot_c),
        Setting::Mode(settings.mode),
    ]
}

pub fn store(settings: &PersistedSettings) -> String {
    let mut out = String::new();
    for setting in settings_of(settings) {
        out.push('[');
        out.push_str(setting.name());
        out.push('=');
        setting.write_value(&mut out);
        out.push_str("]\n");
    }
    out
}

pub fn load(bytes: &[u8], mut apply: impl FnMut(Setting)) -> usize {
    let mut applied = 0;
    let mut scanner = TokenScanner::default();
    for &byte in bytes {
        let Some((name, value)) = scanner.push(byte) else {
            continue;
        };
        match Setting::parse(&name, &value) {
            Ok(setting) => {
                apply(setting);
                applied += 1;
            }
            Err(err) => debug!("skipping setting token: {err}"),
        }
    }
    if scanner.in_token() {
        debug!("dropping unterminated trailing setting token");
    }
    applied
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Outside,
    Name,
    Value,
}

type Token = BoundedString<MAX_TOKEN_LEN>;

#[derive(Debug, Default)]
struct TokenScanner {
    state: ScanState,
    name: Token,
    value: Token,
    malformed: bool,
}

impl TokenScanner {
    fn in_token(&self) -> bool {
        self.state != ScanState::Outside
    }

    fn start(&mut self) {
        self.state = ScanState::Name;
        self.name.clear();
        self.value.clear();
        self.malformed = false;
    }

    fn push(&mut self, byte: u8) -> Option<(Token, Token)> {
        match (self.state, byte) {
            // A stray `[` restarts the token rather than nesting.
            (_, b'[') => self.start(),
            (ScanState::Outside, _) => {}
            (ScanState::Name, b'=') => self.state = ScanState::Value,
            (ScanState::Name, b']') => {
                debug!("dropping setting token without `=`");
                self.state = ScanState::Outside;
            }
            (ScanState::Value, b']') => {
                self.state = ScanState::Outside;
                if !self.malformed {
                    return Some((self.name.clone(), self.value.clone()));
                }
                debug!("dropping oversized or non-ascii setting token");
            }
            (ScanState::Name, byte) => self.accumulate(byte, false),
            (ScanState::Value, byte) => self.accumulate(byte, true),
        }
        None
    }

    fn accumulate(&mut self, byte: u8, into_value: bool) {
        if byte.is_ascii_whitespace() {
            return;
        }
        if !byte.is_ascii() {
            self.malformed = true;
            return;
        }
        let target = if into_value {
            &mut self.value
        } else {
            &mut self.name
        };
        if target.push(char::from(byte)).is_err() {
            self.malformed = true;
        }
    }
}
