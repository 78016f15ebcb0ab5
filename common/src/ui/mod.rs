mod screens;

use tracing::debug;

use crate::{
    board::TextDisplay,
    scheduler::{EventId, Scheduler},
    telemetry::TelemetryBuffer,
    thermostat::Thermostat,
    types::LoggerState,
};

use screens::{
    LoadStoreView, LoggerSettingsView, MessageView, ScreenHandler, TemperatureView,
    ThermostatModeView, ThermostatSettingsView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    TemperatureDisplay,
    LoggerSettings,
    Message,
    ThermostatSettings,
    ThermostatMode,
    LoadStoreSettings,
}

impl Screen {
    pub fn successor(self) -> Self {
        match self {
            Self::TemperatureDisplay => Self::LoggerSettings,
            Self::LoggerSettings => Self::ThermostatSettings,
            Self::ThermostatSettings => Self::ThermostatMode,
            Self::ThermostatMode => Self::LoadStoreSettings,
            Self::LoadStoreSettings => Self::TemperatureDisplay,
            // Never continues; every exit goes home.
            Self::Message => Self::TemperatureDisplay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Display,
    EncoderUp,
    EncoderDown,
    Confirm,
    Clear,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Stay,
    Home,
    Continue,
}

pub struct UiContext<'a> {
    pub scheduler: &'a mut Scheduler,
    pub thermostat: &'a mut Thermostat,
    pub telemetry: &'a TelemetryBuffer,
    pub logger: &'a mut LoggerState,
    pub display: &'a mut dyn TextDisplay,
}

impl UiContext<'_> {
    pub fn request_redraw(&mut self) {
        self.scheduler.request(EventId::Redraw, 0);
    }
}

#[derive(Debug, Clone)]
pub struct UiEngine {
    active: Screen,
    temperature: TemperatureView,
    logger_settings: LoggerSettingsView,
    message: MessageView,
    thermostat_settings: ThermostatSettingsView,
    thermostat_mode: ThermostatModeView,
    load_store: LoadStoreView,
}

impl Default for UiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UiEngine {
    pub fn new() -> Self {
        Self {
            active: Screen::TemperatureDisplay,
            temperature: TemperatureView::default(),
            logger_settings: LoggerSettingsView::default(),
            message: MessageView::default(),
            thermostat_settings: ThermostatSettingsView::default(),
            thermostat_mode: ThermostatModeView::default(),
            load_store: LoadStoreView::default(),
        }
    }

    pub fn active(&self) -> Screen {
        self.active
    }

    pub fn scroll_offset(&self) -> usize {
        self.temperature.offset()
    }

    pub fn message(&self) -> &'static str {
        self.message.text()
    }

    pub fn dispatch(&mut self, event: UiEvent, ctx: &mut UiContext<'_>) {
        let outcome = self.handler(self.active).handle(event, ctx);
        match outcome {
            Outcome::Stay => {}
            Outcome::Home => self.switch_to(Screen::TemperatureDisplay, ctx),
            Outcome::Continue => self.switch_to(self.active.successor(), ctx),
        }
    }

    pub fn show_message(&mut self, text: &'static str, ctx: &mut UiContext<'_>) {
        self.message.set_text(text);
        self.switch_to(Screen::Message, ctx);
    }

    pub fn sample_appended(&mut self, depth: usize) {
        self.temperature.follow_append(depth);
    }

    fn switch_to(&mut self, next: Screen, ctx: &mut UiContext<'_>) {
        self.handler(self.active).handle(UiEvent::Leave, ctx);
        debug!("ui {:?} -> {next:?}", self.active);
        self.active = next;
        self.handler(next).handle(UiEvent::Enter, ctx);
        ctx.request_redraw();
    }

    fn handler(&mut self, screen: Screen) -> &mut dyn ScreenHandler {
        match screen {
            Screen::TemperatureDisplay => &mut self.temperature,
            Screen::LoggerSettings => &mut self.logger_settings,
            Screen::Message => &mut self.message,
            Screen::ThermostatSettings => &mut self.thermostat_settings,
            Screen::ThermostatMode => &mut self.thermostat_mode,
            Screen::LoadStoreSettings => &mut self.load_store,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::ThermostatConfig,
        testing::{boot_time, FakeDisplay},
        types::{TelemetrySample, ThermostatMode},
    };

    struct Harness {
        ui: UiEngine,
        scheduler: Scheduler,
        thermostat: Thermostat,
        telemetry: TelemetryBuffer,
        logger: LoggerState,
        display: FakeDisplay,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ui: UiEngine::new(),
                scheduler: Scheduler::new(),
                thermostat: Thermostat::new(ThermostatConfig::default(), ThermostatMode::Off),
                telemetry: TelemetryBuffer::new(boot_time()),
                logger: LoggerState {
                    live_write: true,
                    interval_s: 10,
                },
                display: FakeDisplay::default(),
            }
        }

        fn send(&mut self, event: UiEvent) {
            let mut ctx = UiContext {
                scheduler: &mut self.scheduler,
                thermostat: &mut self.thermostat,
                telemetry: &self.telemetry,
                logger: &mut self.logger,
                display: &mut self.display,
            };
            self.ui.dispatch(event, &mut ctx);
        }

        fn message(&mut self, text: &'static str) {
            let mut ctx = UiContext {
                scheduler: &mut self.scheduler,
                thermostat: &mut self.thermostat,
                telemetry: &self.telemetry,
                logger: &mut self.logger,
                display: &mut self.display,
            };
            self.ui.show_message(text, &mut ctx);
        }

        fn append(&mut self, air: f32) {
            self.telemetry.append(TelemetrySample {
                air_temp_c: air,
                ..TelemetrySample::empty(boot_time())
            });
            self.ui.sample_appended(self.telemetry.depth());
        }
    }

    #[test]
    fn confirm_walks_every_screen_once_and_returns_home() {
        let mut harness = Harness::new();
        let mut visited = vec![harness.ui.active()];

        for _ in 0..20 {
            harness.send(UiEvent::Confirm);
            if visited.last() != Some(&harness.ui.active()) {
                visited.push(harness.ui.active());
            }
            if harness.ui.active() == Screen::TemperatureDisplay {
                break;
            }
        }

        assert_eq!(
            visited,
            vec![
                Screen::TemperatureDisplay,
                Screen::LoggerSettings,
                Screen::ThermostatSettings,
                Screen::ThermostatMode,
                Screen::LoadStoreSettings,
                Screen::TemperatureDisplay,
            ]
        );
    }

    #[test]
    fn thermostat_settings_need_four_confirms() {
        let mut harness = Harness::new();
        harness.send(UiEvent::Confirm);
        harness.send(UiEvent::Confirm);
        assert_eq!(harness.ui.active(), Screen::ThermostatSettings);

        for _ in 0..3 {
            harness.send(UiEvent::Confirm);
            assert_eq!(harness.ui.active(), Screen::ThermostatSettings);
        }
        harness.send(UiEvent::Confirm);
        assert_eq!(harness.ui.active(), Screen::ThermostatMode);
    }

    #[test]
    fn clear_on_settings_screens_goes_home() {
        let screens = [
            (1, Screen::LoggerSettings),
            (2, Screen::ThermostatSettings),
            (6, Screen::ThermostatMode),
            (7, Screen::LoadStoreSettings),
        ];
        for (confirms, screen) in screens {
            let mut harness = Harness::new();
            for _ in 0..confirms {
                harness.send(UiEvent::Confirm);
            }
            assert_eq!(harness.ui.active(), screen);

            harness.send(UiEvent::Clear);
            assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
        }
    }

    #[test]
    fn clear_on_thermostat_mode_discards_staged_mode() {
        let mut harness = Harness::new();
        for _ in 0..6 {
            harness.send(UiEvent::Confirm);
        }
        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::Clear);

        assert_eq!(harness.thermostat.mode(), ThermostatMode::Off);
        assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
    }

    #[test]
    fn clear_on_load_store_schedules_nothing() {
        for steps in [1, 2] {
            let mut harness = Harness::new();
            for _ in 0..7 {
                harness.send(UiEvent::Confirm);
            }
            for _ in 0..steps {
                harness.send(UiEvent::EncoderUp);
            }
            harness.send(UiEvent::Clear);
            harness.scheduler.tick(&mut crate::testing::FixedClock(0));

            assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
            assert!(!harness.scheduler.is_active(EventId::SettingsStore));
            assert!(!harness.scheduler.is_active(EventId::SettingsLoad));
        }
    }

    #[test]
    fn confirm_on_cancel_continues_without_persistence() {
        let mut harness = Harness::new();
        for _ in 0..7 {
            harness.send(UiEvent::Confirm);
        }
        assert_eq!(harness.ui.active(), Screen::LoadStoreSettings);

        harness.send(UiEvent::Confirm);
        harness.scheduler.tick(&mut crate::testing::FixedClock(0));

        assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
        assert!(!harness.scheduler.is_active(EventId::SettingsStore));
        assert!(!harness.scheduler.is_active(EventId::SettingsLoad));
    }

    #[test]
    fn logger_interval_commits_on_confirm_only() {
        let mut harness = Harness::new();
        harness.send(UiEvent::Confirm);
        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::Clear);
        assert_eq!(harness.logger.interval_s, 10);

        harness.send(UiEvent::Confirm);
        for _ in 0..8 {
            harness.send(UiEvent::EncoderDown);
        }
        harness.send(UiEvent::Confirm);

        assert_eq!(harness.logger.interval_s, 5);
        assert_eq!(harness.scheduler.interval(EventId::Cycle), Some(5_000));
        assert_eq!(harness.ui.active(), Screen::ThermostatSettings);
    }

    #[test]
    fn thermostat_fields_are_staged_until_confirmed() {
        let mut harness = Harness::new();
        harness.send(UiEvent::Confirm);
        harness.send(UiEvent::Confirm);

        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::EncoderUp);
        assert_eq!(harness.thermostat.config().target_temp_c, 18.0);

        harness.send(UiEvent::Confirm);
        assert_eq!(harness.thermostat.config().target_temp_c, 18.2);

        harness.send(UiEvent::EncoderDown);
        harness.send(UiEvent::Clear);
        assert_eq!(harness.thermostat.config().half_window_c, 0.5);
        assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
    }

    #[test]
    fn thermostat_mode_wraps_and_commits() {
        let mut harness = Harness::new();
        for _ in 0..6 {
            harness.send(UiEvent::Confirm);
        }
        assert_eq!(harness.ui.active(), Screen::ThermostatMode);

        harness.send(UiEvent::EncoderDown);
        assert_eq!(harness.thermostat.mode(), ThermostatMode::Off);
        harness.send(UiEvent::Confirm);

        assert_eq!(harness.thermostat.mode(), ThermostatMode::Cool);
        assert_eq!(harness.ui.active(), Screen::LoadStoreSettings);
    }

    #[test]
    fn load_store_defers_persistence() {
        let mut harness = Harness::new();
        for _ in 0..7 {
            harness.send(UiEvent::Confirm);
        }
        assert_eq!(harness.ui.active(), Screen::LoadStoreSettings);
        assert!(!harness.scheduler.is_active(EventId::SettingsStore));

        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::Confirm);

        assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
        harness.scheduler.tick(&mut crate::testing::FixedClock(0));
        assert!(harness.scheduler.is_active(EventId::SettingsStore));
        assert!(!harness.scheduler.is_active(EventId::SettingsLoad));
    }

    #[test]
    fn message_returns_home_on_any_button() {
        for button in [UiEvent::Confirm, UiEvent::Clear] {
            let mut harness = Harness::new();
            harness.send(UiEvent::Confirm);
            harness.message("SD init failed");
            assert_eq!(harness.ui.active(), Screen::Message);

            harness.send(UiEvent::EncoderUp);
            harness.send(UiEvent::EncoderDown);
            assert_eq!(harness.ui.active(), Screen::Message);

            harness.send(button);
            assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
        }
    }

    #[test]
    fn scroll_is_clamped_to_recorded_depth() {
        let mut harness = Harness::new();
        for n in 0..3 {
            harness.append(n as f32);
        }

        harness.send(UiEvent::EncoderUp);
        assert_eq!(harness.ui.scroll_offset(), 0);

        for _ in 0..10 {
            harness.send(UiEvent::EncoderDown);
        }
        assert_eq!(harness.ui.scroll_offset(), 2);
    }

    #[test]
    fn scrolled_view_stays_on_the_same_sample() {
        let mut harness = Harness::new();
        for n in 0..5 {
            harness.append(n as f32);
        }
        harness.send(UiEvent::EncoderDown);
        assert_eq!(harness.telemetry.read_at(harness.ui.scroll_offset()).air_temp_c, 3.0);

        harness.append(5.0);
        assert_eq!(harness.telemetry.read_at(harness.ui.scroll_offset()).air_temp_c, 3.0);
    }

    #[test]
    fn clear_on_temperature_screen_toggles_write_mode() {
        let mut harness = Harness::new();
        harness.send(UiEvent::Clear);

        assert!(!harness.logger.live_write);
        assert_eq!(harness.ui.active(), Screen::TemperatureDisplay);
        harness.scheduler.tick(&mut crate::testing::FixedClock(0));
        assert!(harness.scheduler.is_active(EventId::ManageStorage));
    }

    #[test]
    fn live_view_renders_cursor_and_write_glyph() {
        let mut harness = Harness::new();
        harness.telemetry.append(TelemetrySample {
            air_temp_c: 21.46,
            liquid_temp_c: 18.04,
            relay_on: true,
            ..TelemetrySample::empty(boot_time())
        });
        harness.send(UiEvent::Display);

        assert_eq!(harness.display.row(0), "0    21.5  18.0*");
        assert_eq!(harness.display.row(1), "06/01 08:00:00 W");
        assert_eq!(harness.display.cursor, Some((0, 0)));
    }

    #[test]
    fn transition_requests_a_single_redraw() {
        let mut harness = Harness::new();
        harness.send(UiEvent::Confirm);
        harness.send(UiEvent::EncoderUp);
        harness.send(UiEvent::EncoderUp);

        harness.scheduler.tick(&mut crate::testing::FixedClock(0));
        assert_eq!(harness.scheduler.target_ms(EventId::Redraw), Some(0));
    }
}
