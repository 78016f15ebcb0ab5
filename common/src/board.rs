use chrono::NaiveDateTime;

use crate::error::StorageError;

pub const DISPLAY_COLS: u8 = 16;
pub const DISPLAY_ROWS: u8 = 2;

pub trait Sensors {
    fn read_air_temp_c(&mut self) -> f32;
    fn read_liquid_temp_c(&mut self) -> f32;
}

pub trait Rtc {
    fn now(&self) -> NaiveDateTime;
}

pub trait MonotonicClock {
    fn elapsed_ms(&self) -> u64;
}

pub trait TextDisplay {
    fn clear(&mut self);
    fn write_at(&mut self, row: u8, col: u8, text: &str);
    fn set_cursor(&mut self, cursor: Option<(u8, u8)>);
}

pub trait RelayPin {
    fn set_level(&mut self, high: bool);
}

pub trait Storage {
    fn open_log(&mut self) -> Result<(), StorageError>;
    fn close_log(&mut self);
    fn append_log_line(&mut self, line: &str) -> Result<(), StorageError>;
    fn flush_log(&mut self) -> Result<(), StorageError>;
    fn read_settings(&mut self) -> Result<Vec<u8>, StorageError>;
    fn write_settings(&mut self, contents: &str) -> Result<(), StorageError>;
}

pub trait Board: Sensors + Rtc + MonotonicClock + TextDisplay + RelayPin + Storage {}

impl<T> Board for T where T: Sensors + Rtc + MonotonicClock + TextDisplay + RelayPin + Storage {}
