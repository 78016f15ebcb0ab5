use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::Instant,
};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use fermenter_common::{
    board::{MonotonicClock, RelayPin, Rtc, Sensors, Storage, TextDisplay, DISPLAY_COLS, DISPLAY_ROWS},
    config::{SimulationConfig, StorageConfig},
    StorageError,
};

const ACTUATOR_RATE_C_PER_S: f32 = 0.05;
const AMBIENT_COUPLING_PER_S: f32 = 0.0005;

pub fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[derive(Debug, Clone)]
pub struct Plant {
    air_temp_c: f32,
    liquid_temp_c: f32,
    actuator_heats: bool,
    updated_ms: u64,
}

impl Plant {
    pub fn new(config: &SimulationConfig, now_ms: u64) -> Self {
        Self {
            air_temp_c: config.air_temp_c,
            liquid_temp_c: config.liquid_temp_c,
            actuator_heats: config.actuator_heats,
            updated_ms: now_ms,
        }
    }

    pub fn advance(&mut self, now_ms: u64, energized: bool) {
        let dt_s = now_ms.saturating_sub(self.updated_ms) as f32 / 1_000.0;
        self.updated_ms = self.updated_ms.max(now_ms);

        let coupling = (AMBIENT_COUPLING_PER_S * dt_s).min(1.0);
        self.liquid_temp_c += (self.air_temp_c - self.liquid_temp_c) * coupling;
        if energized {
            let direction = if self.actuator_heats { 1.0 } else { -1.0 };
            self.liquid_temp_c += direction * ACTUATOR_RATE_C_PER_S * dt_s;
        }
    }

    pub fn air_temp_c(&self) -> f32 {
        self.air_temp_c
    }

    pub fn liquid_temp_c(&self) -> f32 {
        self.liquid_temp_c
    }
}

#[derive(Debug, Clone)]
pub struct TerminalDisplay {
    grid: [[char; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
    cursor: Option<(u8, u8)>,
    shown: Option<[[char; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize]>,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self {
            grid: [[' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize],
            cursor: None,
            shown: None,
        }
    }
}

impl TerminalDisplay {
    pub fn row(&self, row: usize) -> String {
        self.grid[row].iter().collect()
    }

    pub fn present(&mut self) -> bool {
        if self.shown == Some(self.grid) {
            return false;
        }
        self.shown = Some(self.grid);
        for row in 0..self.grid.len() {
            info!(target: "lcd", "|{}|", self.row(row));
        }
        if let Some((row, col)) = self.cursor {
            debug!(target: "lcd", "cursor at {row},{col}");
        }
        true
    }
}

impl TextDisplay for TerminalDisplay {
    fn clear(&mut self) {
        self.grid = [[' '; DISPLAY_COLS as usize]; DISPLAY_ROWS as usize];
        self.cursor = None;
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

#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    log_path: PathBuf,
    settings_path: PathBuf,
    log: Option<BufWriter<File>>,
}

impl FileStorage {
    pub fn new(dir: &Path, config: &StorageConfig) -> Self {
        Self {
            dir: dir.to_path_buf(),
            log_path: dir.join(&config.log_file),
            settings_path: dir.join(&config.settings_file),
            log: None,
        }
    }
}

impl Storage for FileStorage {
    fn open_log(&mut self) -> Result<(), StorageError> {
        if self.log.is_some() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        info!("appending to {}", self.log_path.display());
        self.log = Some(BufWriter::new(file));
        Ok(())
    }

    fn close_log(&mut self) {
        if let Some(mut log) = self.log.take() {
            if let Err(err) = log.flush() {
                debug!("flush on close failed: {err}");
            }
        }
    }

    fn append_log_line(&mut self, line: &str) -> Result<(), StorageError> {
        let log = self.log.as_mut().ok_or(StorageError::LogClosed)?;
        writeln!(log, "{line}")?;
        Ok(())
    }

    fn flush_log(&mut self) -> Result<(), StorageError> {
        let log = self.log.as_mut().ok_or(StorageError::LogClosed)?;
        log.flush()?;
        Ok(())
    }

    fn read_settings(&mut self) -> Result<Vec<u8>, StorageError> {
        match fs::read(&self.settings_path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::SettingsMissing),
            Err(err) => Err(err.into()),
        }
    }

    fn write_settings(&mut self, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(&self.settings_path, contents)?;
        Ok(())
    }
}

pub struct HostBoard {
    plant: Plant,
    display: TerminalDisplay,
    storage: FileStorage,
    relay_line_high: bool,
}

impl HostBoard {
    pub fn new(simulation: &SimulationConfig, storage: FileStorage) -> Self {
        Self {
            plant: Plant::new(simulation, monotonic_ms()),
            display: TerminalDisplay::default(),
            storage,
            // Released; the module is active-low.
            relay_line_high: true,
        }
    }

    pub fn relay_energized(&self) -> bool {
        !self.relay_line_high
    }

    pub fn present(&mut self) -> bool {
        self.display.present()
    }

    fn advance_plant(&mut self) {
        let energized = self.relay_energized();
        self.plant.advance(monotonic_ms(), energized);
    }
}

impl Sensors for HostBoard {
    fn read_air_temp_c(&mut self) -> f32 {
        self.advance_plant();
        self.plant.air_temp_c()
    }

    fn read_liquid_temp_c(&mut self) -> f32 {
        self.advance_plant();
        self.plant.liquid_temp_c()
    }
}

impl Rtc for HostBoard {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl MonotonicClock for HostBoard {
    fn elapsed_ms(&self) -> u64 {
        monotonic_ms()
    }
}

impl TextDisplay for HostBoard {
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

impl RelayPin for HostBoard {
    fn set_level(&mut self, high: bool) {
        if self.relay_line_high != high {
            info!("relay line {}", if high { "high (released)" } else { "low (energized)" });
        }
        self.relay_line_high = high;
    }
}

impl Storage for HostBoard {
    fn open_log(&mut self) -> Result<(), StorageError> {
        self.storage.open_log()
    }

    fn close_log(&mut self) {
        self.storage.close_log();
    }

    fn append_log_line(&mut self, line: &str) -> Result<(), StorageError> {
        self.storage.append_log_line(line)
    }

    fn flush_log(&mut self) -> Result<(), StorageError> {
        self.storage.flush_log()
    }

    fn read_settings(&mut self) -> Result<Vec<u8>, StorageError> {
        self.storage.read_settings()
    }

    fn write_settings(&mut self, contents: &str) -> Result<(), StorageError> {
        self.storage.write_settings(contents)
    }
}
