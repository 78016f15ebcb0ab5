use super::{Outcome, UiContext, UiEvent};
use crate::{
    board::DISPLAY_COLS,
    config::{ThermostatConfig, MAX_LOG_INTERVAL_S, MIN_LOG_INTERVAL_S},
    scheduler::EventId,
    types::ThermostatMode,
};

const FIELD_STEP_C: f32 = 0.1;

const FIELD_LABELS: [&str; ThermostatConfig::FIELD_COUNT] =
    ["Target", "Range +/-", "Undershoot", "Overshoot"];

pub(super) trait ScreenHandler {
    fn handle(&mut self, event: UiEvent, ctx: &mut UiContext<'_>) -> Outcome {
        match event {
            UiEvent::Display => {
                ctx.display.clear();
                ctx.display.set_cursor(None);
                self.render(ctx);
                Outcome::Stay
            }
            UiEvent::Enter => {
                self.enter(ctx);
                Outcome::Stay
            }
            UiEvent::Leave => Outcome::Stay,
            UiEvent::EncoderUp => self.step(1, ctx),
            UiEvent::EncoderDown => self.step(-1, ctx),
            UiEvent::Confirm => self.confirm(ctx),
            UiEvent::Clear => self.clear(ctx),
        }
    }

    fn enter(&mut self, _ctx: &mut UiContext<'_>) {}

    fn step(&mut self, _direction: i8, _ctx: &mut UiContext<'_>) -> Outcome {
        Outcome::Stay
    }

    fn confirm(&mut self, _ctx: &mut UiContext<'_>) -> Outcome {
        Outcome::Continue
    }

    fn clear(&mut self, _ctx: &mut UiContext<'_>) -> Outcome {
        Outcome::Home
    }

    fn render(&self, ctx: &mut UiContext<'_>);
}

#[derive(Debug, Clone, Default)]
pub(super) struct TemperatureView {
    offset: usize,
}

impl TemperatureView {
    pub(super) fn offset(&self) -> usize {
        self.offset
    }

    pub(super) fn follow_append(&mut self, depth: usize) {
        if self.offset != 0 {
            self.offset = (self.offset + 1).min(depth.saturating_sub(1));
        }
    }
}

impl ScreenHandler for TemperatureView {
    fn step(&mut self, direction: i8, ctx: &mut UiContext<'_>) -> Outcome {
        // Turning up moves towards the live sample.
        let deepest = ctx.telemetry.depth().saturating_sub(1);
        self.offset = if direction > 0 {
            self.offset.saturating_sub(1)
        } else {
            (self.offset + 1).min(deepest)
        };
        ctx.request_redraw();
        Outcome::Stay
    }

    fn clear(&mut self, ctx: &mut UiContext<'_>) -> Outcome {
        ctx.logger.live_write = !ctx.logger.live_write;
        ctx.scheduler.request(EventId::ManageStorage, 0);
        ctx.request_redraw();
        Outcome::Stay
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        let glyph = if ctx.logger.live_write { "W" } else { "B" };
        ctx.display.write_at(1, DISPLAY_COLS - 1, glyph);

        if ctx.telemetry.depth() == 0 {
            ctx.display.write_at(0, 0, "No samples yet");
            return;
        }

        let offset = self.offset.min(ctx.telemetry.depth() - 1);
        let slot = ctx.telemetry.slot_behind_head(offset);
        let sample = ctx.telemetry.read_at(offset);
        let readings = format!(
            "{slot:<3} {:>5.1} {:>5.1}",
            sample.air_temp_c, sample.liquid_temp_c
        );
        ctx.display.write_at(0, 0, &readings);
        if sample.relay_on {
            ctx.display.write_at(0, DISPLAY_COLS - 1, "*");
        }
        let stamp = sample.timestamp.format("%m/%d %H:%M:%S").to_string();
        ctx.display.write_at(1, 0, &stamp);

        if offset == 0 {
            ctx.display.set_cursor(Some((0, 0)));
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct LoggerSettingsView {
    staged_s: u16,
}

impl Default for LoggerSettingsView {
    fn default() -> Self {
        Self {
            staged_s: MIN_LOG_INTERVAL_S,
        }
    }
}

impl ScreenHandler for LoggerSettingsView {
    fn enter(&mut self, ctx: &mut UiContext<'_>) {
        self.staged_s = ctx.logger.interval_s;
    }

    fn step(&mut self, direction: i8, ctx: &mut UiContext<'_>) -> Outcome {
        self.staged_s = self
            .staged_s
            .saturating_add_signed(i16::from(direction))
            .clamp(MIN_LOG_INTERVAL_S, MAX_LOG_INTERVAL_S);
        ctx.request_redraw();
        Outcome::Stay
    }

    fn confirm(&mut self, ctx: &mut UiContext<'_>) -> Outcome {
        ctx.logger.set_interval(self.staged_s, ctx.scheduler);
        ctx.scheduler.request(EventId::Cycle, 0);
        Outcome::Continue
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        ctx.display.write_at(0, 0, "Interval:");
        let line = format!("{:>4}s  now {}s", self.staged_s, ctx.logger.interval_s);
        ctx.display.write_at(1, 0, &line);
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct MessageView {
    text: &'static str,
}

impl MessageView {
    pub(super) fn text(&self) -> &'static str {
        self.text
    }

    pub(super) fn set_text(&mut self, text: &'static str) {
        self.text = text;
    }
}

impl ScreenHandler for MessageView {
    fn confirm(&mut self, _ctx: &mut UiContext<'_>) -> Outcome {
        Outcome::Home
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        let split = self
            .text
            .char_indices()
            .nth(usize::from(DISPLAY_COLS))
            .map_or(self.text.len(), |(index, _)| index);
        let (first, second) = self.text.split_at(split);
        ctx.display.write_at(0, 0, first);
        ctx.display.write_at(1, 0, second);
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct ThermostatSettingsView {
    fields: [f32; ThermostatConfig::FIELD_COUNT],
    cursor: usize,
}

impl ScreenHandler for ThermostatSettingsView {
    fn enter(&mut self, ctx: &mut UiContext<'_>) {
        self.fields = ctx.thermostat.config().to_fields();
        self.cursor = 0;
    }

    fn step(&mut self, direction: i8, ctx: &mut UiContext<'_>) -> Outcome {
        let field = &mut self.fields[self.cursor];
        // Snap to hundredths so repeated steps do not accumulate float noise.
        *field = ((*field + f32::from(direction) * FIELD_STEP_C) * 100.0).round() / 100.0;
        ctx.request_redraw();
        Outcome::Stay
    }

    fn confirm(&mut self, ctx: &mut UiContext<'_>) -> Outcome {
        ctx.thermostat
            .set_config(ThermostatConfig::from_fields(self.fields));
        self.cursor += 1;
        if self.cursor >= ThermostatConfig::FIELD_COUNT {
            return Outcome::Continue;
        }
        ctx.request_redraw();
        Outcome::Stay
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        let title = format!(
            "{:<11}{}/{}",
            FIELD_LABELS[self.cursor],
            self.cursor + 1,
            ThermostatConfig::FIELD_COUNT
        );
        ctx.display.write_at(0, 0, &title);
        let value = format!("{:>7.2} C", self.fields[self.cursor]);
        ctx.display.write_at(1, 0, &value);
    }
}

#[derive(Debug, Clone)]
pub(super) struct ThermostatModeView {
    staged: ThermostatMode,
}

impl Default for ThermostatModeView {
    fn default() -> Self {
        Self {
            staged: ThermostatMode::Off,
        }
    }
}

impl ScreenHandler for ThermostatModeView {
    fn enter(&mut self, ctx: &mut UiContext<'_>) {
        self.staged = ctx.thermostat.mode();
    }

    fn step(&mut self, direction: i8, ctx: &mut UiContext<'_>) -> Outcome {
        self.staged = if direction > 0 {
            self.staged.next()
        } else {
            self.staged.previous()
        };
        ctx.request_redraw();
        Outcome::Stay
    }

    fn confirm(&mut self, ctx: &mut UiContext<'_>) -> Outcome {
        ctx.thermostat.set_mode(self.staged);
        Outcome::Continue
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        ctx.display.write_at(0, 0, "Thermostat mode:");
        ctx.display.write_at(1, 2, self.staged.as_str());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoadStoreOption {
    #[default]
    Cancel,
    Store,
    Load,
}

impl LoadStoreOption {
    fn next(self) -> Self {
        match self {
            Self::Cancel => Self::Store,
            Self::Store => Self::Load,
            Self::Load => Self::Cancel,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Cancel => Self::Load,
            Self::Store => Self::Cancel,
            Self::Load => Self::Store,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel",
            Self::Store => "Store",
            Self::Load => "Load",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct LoadStoreView {
    option: LoadStoreOption,
}

impl ScreenHandler for LoadStoreView {
    fn enter(&mut self, _ctx: &mut UiContext<'_>) {
        self.option = LoadStoreOption::Cancel;
    }

    fn step(&mut self, direction: i8, ctx: &mut UiContext<'_>) -> Outcome {
        self.option = if direction > 0 {
            self.option.next()
        } else {
            self.option.previous()
        };
        ctx.request_redraw();
        Outcome::Stay
    }

    fn confirm(&mut self, ctx: &mut UiContext<'_>) -> Outcome {
        // Storage is slow; the main loop does the actual work.
        match self.option {
            LoadStoreOption::Cancel => {}
            LoadStoreOption::Store => ctx.scheduler.request(EventId::SettingsStore, 0),
            LoadStoreOption::Load => ctx.scheduler.request(EventId::SettingsLoad, 0),
        }
        Outcome::Continue
    }

    fn render(&self, ctx: &mut UiContext<'_>) {
        ctx.display.write_at(0, 0, "Settings:");
        let line = format!("> {}", self.option.label());
        ctx.display.write_at(1, 0, &line);
    }
}
