use tracing::{debug, info, trace, warn};

use crate::{
    board::{Board, MonotonicClock},
    config::{PersistedSettings, RuntimeConfig, TimingConfig},
    scheduler::{EventHandler, EventId, Scheduler},
    settings::{self, Setting},
    telemetry::TelemetryBuffer,
    thermostat::Thermostat,
    types::{LoggerState, TelemetrySample},
    ui::{Screen, UiContext, UiEngine, UiEvent},
};

pub const STORAGE_INIT_FAILED: &str = "SD init failed";
pub const LOG_WRITE_FAILED: &str = "Log write failed";
pub const SETTINGS_MISSING: &str = "No settings file";
pub const SETTINGS_STORE_FAILED: &str = "Store failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    EncoderStep(i8),
    ConfirmPressed,
    ClearPressed,
}

pub struct Controller<B: Board> {
    scheduler: Scheduler,
    app: App<B>,
}

struct App<B: Board> {
    board: B,
    ui: UiEngine,
    thermostat: Thermostat,
    telemetry: TelemetryBuffer,
    logger: LoggerState,
    timing: TimingConfig,
    debouncing: bool,
    log_open: bool,
}

impl<B: Board> Controller<B> {
    pub fn new(board: B, config: &RuntimeConfig) -> Self {
        let mut settings = config.settings.clone();
        settings.sanitize();

        let mut scheduler = Scheduler::new();
        let mut logger = LoggerState {
            live_write: true,
            interval_s: settings.log_interval_s,
        };
        logger.set_interval(settings.log_interval_s, &mut scheduler);
        scheduler.set_interval(EventId::Redraw, Some(config.timing.redraw_interval_ms));

        let telemetry = TelemetryBuffer::new(board.now());
        let mut app = App {
            board,
            ui: UiEngine::new(),
            thermostat: Thermostat::new(settings.thermostat, settings.mode),
            telemetry,
            logger,
            timing: config.timing.clone(),
            debouncing: false,
            log_open: false,
        };

        for event in [
            EventId::ManageStorage,
            EventId::SettingsLoad,
            EventId::Cycle,
            EventId::Redraw,
        ] {
            scheduler.request(event, 0);
        }
        // Nothing is active yet, so this only applies the requests above.
        scheduler.tick(&mut app);

        Self { scheduler, app }
    }

    pub fn poll(&mut self) {
        self.scheduler.tick(&mut self.app);
    }

    pub fn handle_input(&mut self, input: InputEvent) {
        let event = match input {
            InputEvent::EncoderStep(step) if step > 0 => UiEvent::EncoderUp,
            InputEvent::EncoderStep(step) if step < 0 => UiEvent::EncoderDown,
            InputEvent::EncoderStep(_) => return,
            InputEvent::ConfirmPressed | InputEvent::ClearPressed => {
                if self.app.debouncing {
                    trace!("dropping {input:?} inside debounce window");
                    return;
                }
                self.app.debouncing = true;
                self.scheduler
                    .request(EventId::ClearDebounce, self.app.timing.debounce_ms);
                if input == InputEvent::ConfirmPressed {
                    UiEvent::Confirm
                } else {
                    UiEvent::Clear
                }
            }
        };
        self.app
            .with_ui(&mut self.scheduler, |ui, ctx| ui.dispatch(event, ctx));
    }

    pub fn encoder_step(&mut self, step: i8) {
        self.handle_input(InputEvent::EncoderStep(step));
    }

    pub fn confirm_pressed(&mut self) {
        self.handle_input(InputEvent::ConfirmPressed);
    }

    pub fn clear_pressed(&mut self) {
        self.handle_input(InputEvent::ClearPressed);
    }

    pub fn screen(&self) -> Screen {
        self.app.ui.active()
    }

    pub fn ui(&self) -> &UiEngine {
        &self.app.ui
    }

    pub fn thermostat(&self) -> &Thermostat {
        &self.app.thermostat
    }

    pub fn telemetry(&self) -> &TelemetryBuffer {
        &self.app.telemetry
    }

    pub fn logger(&self) -> &LoggerState {
        &self.app.logger
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> PersistedSettings {
        self.app.current_settings()
    }

    pub fn board(&self) -> &B {
        &self.app.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.app.board
    }
}

impl<B: Board> MonotonicClock for App<B> {
    fn elapsed_ms(&self) -> u64 {
        self.board.elapsed_ms()
    }
}

impl<B: Board> EventHandler for App<B> {
    fn handle(&mut self, event: EventId, scheduler: &mut Scheduler) {
        match event {
            EventId::ManageStorage => self.manage_storage(scheduler),
            EventId::SettingsLoad => self.load_settings(scheduler),
            EventId::Cycle => self.cycle(scheduler),
            EventId::Redraw => {
                self.with_ui(scheduler, |ui, ctx| ui.dispatch(UiEvent::Display, ctx))
            }
            EventId::ClearDebounce => self.debouncing = false,
            EventId::SettingsStore => self.store_settings(scheduler),
        }
    }
}

impl<B: Board> App<B> {
    fn with_ui<R>(
        &mut self,
        scheduler: &mut Scheduler,
        f: impl FnOnce(&mut UiEngine, &mut UiContext<'_>) -> R,
    ) -> R {
        let was_live = self.logger.live_write;
        let mut ctx = UiContext {
            scheduler,
            thermostat: &mut self.thermostat,
            telemetry: &self.telemetry,
            logger: &mut self.logger,
            display: &mut self.board,
        };
        let result = f(&mut self.ui, &mut ctx);

        if !was_live && self.logger.live_write {
            // Samples taken while buffered are never backfilled; anything
            // recorded from here on is logged once the medium is open.
            debug!("live write on, dropping {} buffered samples", self.telemetry.unflushed());
            self.telemetry.skip_pending();
        }
        result
    }

    fn show_message(&mut self, text: &'static str, scheduler: &mut Scheduler) {
        self.with_ui(scheduler, |ui, ctx| ui.show_message(text, ctx));
    }

    fn current_settings(&self) -> PersistedSettings {
        PersistedSettings {
            log_interval_s: self.logger.interval_s,
            thermostat: *self.thermostat.config(),
            mode: self.thermostat.mode(),
        }
    }

    fn cycle(&mut self, scheduler: &mut Scheduler) {
        let timestamp = self.board.now();
        let air_temp_c = self.board.read_air_temp_c();
        let liquid_temp_c = self.board.read_liquid_temp_c();

        // The sample carries the relay state it was taken under.
        self.telemetry.append(TelemetrySample {
            timestamp,
            air_temp_c,
            liquid_temp_c,
            relay_on: self.thermostat.is_relay_on(),
        });
        self.ui.sample_appended(self.telemetry.depth());
        debug!("sample air {air_temp_c:.2}C liquid {liquid_temp_c:.2}C");

        if let Some(level) = self.thermostat.evaluate(liquid_temp_c) {
            self.board.set_level(level);
        }

        if self.logger.live_write && self.log_open {
            self.flush_pending(scheduler);
        }
    }

    fn flush_pending(&mut self, scheduler: &mut Scheduler) {
        let mut written = 0;
        let mut failure = None;
        for sample in self.telemetry.pending() {
            if let Err(err) = self.board.append_log_line(&sample.log_line()) {
                failure = Some(err);
                break;
            }
            written += 1;
        }
        self.telemetry.mark_flushed(written);

        let failure = failure.or_else(|| self.board.flush_log().err());
        if let Some(err) = failure {
            warn!("log write failed, switching to buffered mode: {err}");
            self.logger.live_write = false;
            self.board.close_log();
            self.log_open = false;
            self.show_message(LOG_WRITE_FAILED, scheduler);
        }
    }

    fn manage_storage(&mut self, scheduler: &mut Scheduler) {
        if !self.logger.live_write {
            if self.log_open {
                self.board.close_log();
                self.log_open = false;
                info!("buffered mode, log closed");
            }
            return;
        }
        if self.log_open {
            return;
        }

        match self.board.open_log() {
            Ok(()) => {
                self.log_open = true;
                info!("live logging enabled");
                self.flush_pending(scheduler);
            }
            Err(err) => {
                warn!("storage init failed: {err}");
                self.logger.live_write = false;
                self.show_message(STORAGE_INIT_FAILED, scheduler);
            }
        }
    }

    fn load_settings(&mut self, scheduler: &mut Scheduler) {
        let contents = match self.board.read_settings() {
            Ok(contents) => contents,
            Err(err) => {
                warn!("settings load failed: {err}");
                self.show_message(SETTINGS_MISSING, scheduler);
                return;
            }
        };

        let applied = settings::load(&contents, |setting| self.apply_setting(setting, scheduler));
        info!("loaded {applied} settings");
    }

    fn apply_setting(&mut self, setting: Setting, scheduler: &mut Scheduler) {
        debug!("applying {} setting", setting.name());
        match setting {
            Setting::LogInterval(seconds) => {
                self.logger.set_interval(seconds, scheduler);
                scheduler.request(EventId::Cycle, self.logger.cycle_interval_ms());
            }
            Setting::Mode(mode) => {
                self.thermostat.set_mode(mode);
            }
            other => {
                let mut current = self.current_settings();
                other.apply_to(&mut current);
                self.thermostat.set_config(current.thermostat);
            }
        }
    }

    fn store_settings(&mut self, scheduler: &mut Scheduler) {
        let contents = settings::store(&self.current_settings());
        match self.board.write_settings(&contents) {
            Ok(()) => info!("settings stored"),
            Err(err) => {
                warn!("settings store failed: {err}");
                self.show_message(SETTINGS_STORE_FAILED, scheduler);
            }
        }
    }
}
