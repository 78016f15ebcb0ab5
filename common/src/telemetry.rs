use chrono::NaiveDateTime;

use crate::types::TelemetrySample;

pub const CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    samples: [TelemetrySample; CAPACITY],
    // A u8 cursor wraps at exactly CAPACITY.
    write: u8,
    // 0..=CAPACITY; the flush cursor is derived from it.
    unflushed: u16,
    depth: u16,
}

impl TelemetryBuffer {
    pub fn new(boot_time: NaiveDateTime) -> Self {
        Self {
            samples: [TelemetrySample::empty(boot_time); CAPACITY],
            write: 0,
            unflushed: 0,
            depth: 0,
        }
    }

    pub fn append(&mut self, sample: TelemetrySample) {
        self.samples[usize::from(self.write)] = sample;
        self.write = self.write.wrapping_add(1);
        self.unflushed = (self.unflushed + 1).min(CAPACITY as u16);
        self.depth = (self.depth + 1).min(CAPACITY as u16);
    }

    pub fn read_at(&self, offset: usize) -> &TelemetrySample {
        &self.samples[usize::from(self.slot_behind_head(offset))]
    }

    pub fn slot_behind_head(&self, offset: usize) -> u8 {
        // Truncation is the wrap.
        self.write.wrapping_sub(1).wrapping_sub(offset as u8)
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        (self.depth > 0).then(|| self.read_at(0))
    }

    pub fn depth(&self) -> usize {
        usize::from(self.depth)
    }

    pub fn write_cursor(&self) -> u8 {
        self.write
    }

    /// Equals the write cursor both when nothing is pending and when a
    /// full ring is pending; [`Self::unflushed`] tells the two apart.
    pub fn flush_cursor(&self) -> u8 {
        self.write.wrapping_sub(self.unflushed as u8)
    }

    pub fn unflushed(&self) -> usize {
        usize::from(self.unflushed)
    }

    pub fn pending(&self) -> impl Iterator<Item = &TelemetrySample> + '_ {
        let start = self.flush_cursor();
        (0..self.unflushed).map(move |step| &self.samples[usize::from(start.wrapping_add(step as u8))])
    }

    pub fn mark_flushed(&mut self, count: usize) {
        self.unflushed -= count.min(usize::from(self.unflushed)) as u16;
    }

    pub fn skip_pending(&mut self) {
        self.unflushed = 0;
    }
}
