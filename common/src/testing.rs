use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{
    board::{
        MonotonicClock, RelayPin, Rtc, Sensors, Storage, TextDisplay, DISPLAY_COLS, DISPLAY_ROWS,
    },
    error::StorageError,
    scheduler::{EventHandler, EventId, Scheduler},
};

pub fn boot_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

pub struct FixedClock(pub u64);

impl MonotonicClock for FixedClock {
    fn elapsed_ms(&self) -> u64 {
        self.0
    }
}

impl EventHandler for FixedClock {
    fn handle(&mut self, _event: EventId, _scheduler: &mut Scheduler) {}
}

#[derive(Debug, Clone)]
pub struct FakeDisplay {
    grid: [[char; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
    pub cursor: Option<(u8, u8)>,
}

impl Default for FakeDisplay {
    fn default() -> Self {
        Self {
            grid: [[' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
            cursor: None,
        }
    }
}

impl FakeDisplay {
    pub fn row(&self, row: usize) -> String {
        self.grid[row].iter().collect()
    }
}

impl TextDisplay for FakeDisplay {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) {
        let Some(line) = self.grid.get_mut(usize::from(row)) else {
            return;
        };
        for (cell, ch) in line.iter_mut().skip(usize::from(col)).zip(text.chars()) {
            *cell = ch;
        }
    }

    fn set_cursor(&mut self, cursor: Option<(u8, u8)>) {
        self.cursor = cursor;
    }
}

#[derive(Debug, Clone)]
pub struct FakeBoard {
    pub now_ms: u64,
    pub air_temp_c: f32,
    pub liquid_temp_c: f32,
    pub relay_writes: Vec<bool>,
    pub display: FakeDisplay,
    pub medium_present: bool,
    pub fail_log_writes: bool,
    pub log_open: bool,
    pub log: Vec<String>,
    pub settings: Option<Vec<u8>>,
    pub settings_writable: bool,
}

impl Default for FakeBoard {
    fn default() -> Self {
        Self {
            now_ms: 0,
            air_temp_c: 20.0,
            liquid_temp_c: 18.0,
            relay_writes: Vec::new(),
            display: FakeDisplay::default(),
            medium_present: true,
            fail_log_writes: false,
            log_open: false,
            log: Vec::new(),
            settings: None,
            settings_writable: true,
        }
    }
}

impl FakeBoard {
    pub fn with_settings(contents: &str) -> Self {
        Self {
            settings: Some(contents.as_bytes().to_vec()),
            ..Self::default()
        }
    }
}

impl Sensors for FakeBoard {
    fn read_air_temp_c(&mut self) -> f32 {
        self.air_temp_c
    }

    fn read_liquid_temp_c(&mut self) -> f32 {
        self.liquid_temp_c
    }
}

impl Rtc for FakeBoard {
    fn now(&self) -> NaiveDateTime {
        boot_time() + Duration::milliseconds(self.now_ms as i64)
    }
}

impl MonotonicClock for FakeBoard {
    fn elapsed_ms(&self) -> u64 {
        self.now_ms
    }
}

impl TextDisplay for FakeBoard {
    fn clear(&mut self) {
        self.display.clear();
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) {
        self.display.write_at(row, col, text);
    }

    fn set_cursor(&mut self, cursor: Option<(u8, u8)>) {
        self.display.set_cursor(cursor);
    }
}

impl RelayPin for FakeBoard {
    fn set_level(&mut self, high: bool) {
        self.relay_writes.push(high);
    }
}

impl Storage for FakeBoard {
    fn open_log(&mut self) -> Result<(), StorageError> {
        if !self.medium_present {
            return Err(StorageError::Unavailable);
        }
        self.log_open = true;
        Ok(())
    }

    fn close_log(&mut self) {
        self.log_open = false;
    }

    fn append_log_line(&mut self, line: &str) -> Result<(), StorageError> {
        if !self.log_open {
            return Err(StorageError::LogClosed);
        }
        if self.fail_log_writes {
            return Err(StorageError::Unavailable);
        }
        self.log.push(line.to_string());
        Ok(())
    }

    fn flush_log(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn read_settings(&mut self) -> Result<Vec<u8>, StorageError> {
        self.settings.clone().ok_or(StorageError::SettingsMissing)
    }

    fn write_settings(&mut self, contents: &str) -> Result<(), StorageError> {
        if !self.settings_writable {
            return Err(StorageError::Unavailable);
        }
        self.settings = Some(contents.as_bytes().to_vec());
        Ok(())
    }
}
