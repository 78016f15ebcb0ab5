use tracing::trace;

use crate::board::MonotonicClock;

// Declaration order is firing order within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventId {
    ManageStorage,
    SettingsLoad,
    Cycle,
    Redraw,
    ClearDebounce,
    SettingsStore,
}

impl EventId {
    pub const COUNT: usize = 6;

    pub const ALL: [EventId; Self::COUNT] = [
        Self::ManageStorage,
        Self::SettingsLoad,
        Self::Cycle,
        Self::Redraw,
        Self::ClearDebounce,
        Self::SettingsStore,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

pub trait EventHandler: MonotonicClock {
    fn handle(&mut self, event: EventId, scheduler: &mut Scheduler);
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    interval_ms: Option<u64>,
    active: bool,
    target_ms: u64,
    pending_delay_ms: u64,
    dirty: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    slots: [Slot; EventId::COUNT],
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            slots: [Slot::default(); EventId::COUNT],
        }
    }

    pub fn set_interval(&mut self, event: EventId, interval_ms: Option<u64>) {
        self.slots[event.index()].interval_ms = interval_ms;
    }

    pub fn interval(&self, event: EventId) -> Option<u64> {
        self.slots[event.index()].interval_ms
    }

    pub fn request(&mut self, event: EventId, delay_ms: u64) {
        let slot = &mut self.slots[event.index()];
        slot.pending_delay_ms = delay_ms;
        slot.dirty = true;
    }

    pub fn is_active(&self, event: EventId) -> bool {
        self.slots[event.index()].active
    }

    pub fn target_ms(&self, event: EventId) -> Option<u64> {
        let slot = &self.slots[event.index()];
        slot.active.then_some(slot.target_ms)
    }

    pub fn tick<H: EventHandler>(&mut self, handler: &mut H) {
        let now_ms = handler.elapsed_ms();
        for event in EventId::ALL {
            let slot = self.slots[event.index()];
            if !slot.active || slot.target_ms > now_ms {
                continue;
            }

            trace!("firing {event:?} at {now_ms}ms");
            handler.handle(event, self);

            self.slots[event.index()].active = false;
            if let Some(interval_ms) = self.slots[event.index()].interval_ms {
                self.request(event, interval_ms);
            }
        }

        self.apply_requests(handler.elapsed_ms());
    }

    fn apply_requests(&mut self, now_ms: u64) {
        for slot in self.slots.iter_mut().filter(|slot| slot.dirty) {
            slot.target_ms = now_ms.saturating_add(slot.pending_delay_ms);
            slot.active = true;
            slot.dirty = false;
        }
    }
}
