//! Fixed-capacity circular store of per-cycle light intensities.
use crate::error::{PcrError, Result};
use crate::events::{Event, EventBus};

/// Intensity readings indexed by cycle, with a wraparound write cursor.
///
/// Invariant: `cursor < len()` whenever `len() > 0`, and `cursor == 0` otherwise.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    values: Vec<f32>,
    cursor: usize,
    events: EventBus,
}

impl SampleBuffer {
    /// A zeroed buffer of `len` cycles.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
            cursor: 0,
            events: EventBus::default(),
        }
    }

    /// Build from stored values; the cursor starts at 0.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self {
            values,
            cursor: 0,
            events: EventBus::default(),
        }
    }

    /// Route this buffer's notifications to `bus`.
    pub fn attach(&mut self, bus: EventBus) {
        self.events = bus;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Result<f32> {
        self.values
            .get(index)
            .copied()
            .ok_or(PcrError::OutOfRange {
                index,
                len: self.values.len(),
            })
    }

    /// Write at the cursor and advance it modulo the capacity.
    ///
    /// Publishes `SampleUpdated` then `IndexChanged`.
    pub fn append(&mut self, value: f32) -> Result<usize> {
        let len = self.values.len();
        if len == 0 {
            return Err(PcrError::OutOfRange { index: 0, len: 0 });
        }
        let index = self.cursor;
        self.values[index] = value;
        self.cursor = (index + 1) % len;
        tracing::trace!(index, value, next = self.cursor, "sample stored");
        self.events.publish(Event::SampleUpdated { index, value });
        self.events.publish(Event::IndexChanged { index: self.cursor });
        Ok(index)
    }

    /// Truncate or zero-fill to `len`. A cursor past the new end wraps back into range.
    pub fn resize(&mut self, len: usize) {
        self.values.resize(len, 0.0);
        self.cursor = if len == 0 { 0 } else { self.cursor % len };
    }

    /// Zero every sample and rewind the cursor.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.cursor = 0;
        self.events.publish(Event::IndexChanged { index: 0 });
    }

    /// 0-based index of the first sample at or above `threshold`.
    pub fn first_crossing(&self, threshold: f64) -> Option<usize> {
        self.values.iter().position(|v| f64::from(*v) >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_and_rewinds() {
        let mut b = SampleBuffer::from_values(vec![1.0, 2.0, 3.0]);
        b.append(9.0).unwrap();
        b.reset();
        assert_eq!(b.values(), &[0.0, 0.0, 0.0]);
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn append_wraps_and_overwrites_index_zero() {
        let mut b = SampleBuffer::new(4);
        for v in 1..=5 {
            b.append(v as f32).unwrap();
        }
        assert_eq!(b.cursor(), 1);
        assert_eq!(b.values(), &[5.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn zero_capacity_append_is_out_of_range() {
        let mut b = SampleBuffer::new(0);
        assert_eq!(
            b.append(1.0),
            Err(PcrError::OutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn get_past_end_is_out_of_range() {
        let b = SampleBuffer::new(31);
        assert!(b.get(30).is_ok());
        assert_eq!(b.get(31), Err(PcrError::OutOfRange { index: 31, len: 31 }));
    }

    #[test]
    fn resize_keeps_cursor_valid() {
        let mut b = SampleBuffer::new(10);
        for _ in 0..7 {
            b.append(1.0).unwrap();
        }
        b.resize(12);
        assert_eq!(b.cursor(), 7);
        assert_eq!(b.values()[11], 0.0);
        b.resize(5);
        assert_eq!(b.len(), 5);
        assert_eq!(b.cursor(), 2);
        b.resize(0);
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn append_publishes_sample_then_index() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let mut b = SampleBuffer::new(2);
        b.attach(bus);
        b.append(4.5).unwrap();
        b.append(6.0).unwrap();
        let got: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::SampleUpdated { index: 0, value: 4.5 },
                Event::IndexChanged { index: 1 },
                Event::SampleUpdated { index: 1, value: 6.0 },
                Event::IndexChanged { index: 0 },
            ]
        );
    }

    #[test]
    fn first_crossing_is_inclusive() {
        let b = SampleBuffer::from_values(vec![0.5, 2.0, 10.0, 12.0]);
        assert_eq!(b.first_crossing(10.0), Some(2));
        assert_eq!(b.first_crossing(100.0), None);
    }
}
