use chrono::{Duration, NaiveTime, Timelike};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("slot interval must be a positive number of minutes")]
    ZeroInterval,
    #[error("closing time {closing} must be after opening time {opening}")]
    EmptyWindow {
        opening: NaiveTime,
        closing: NaiveTime,
    },
    #[error("operating window of {window} minutes is not a multiple of the {interval}-minute slot")]
    Misaligned { window: u32, interval: u32 },
}

/// The daily catalog of slots: `[opening, closing)` cut into equal intervals.
///
/// Construction is the only place the window is checked, so a `SlotGrid` value always
/// tiles its window exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotGrid {
    opening: NaiveTime,
    closing: NaiveTime,
    interval_minutes: u32,
}

impl SlotGrid {
    pub fn new(
        opening: NaiveTime,
        closing: NaiveTime,
        interval_minutes: u32,
    ) -> Result<Self, GridError> {
        if interval_minutes == 0 {
            return Err(GridError::ZeroInterval);
        }
        if closing <= opening {
            return Err(GridError::EmptyWindow { opening, closing });
        }

        let window_secs = closing.num_seconds_from_midnight() - opening.num_seconds_from_midnight();
        let interval_secs = interval_minutes * 60;
        if window_secs % interval_secs != 0 {
            return Err(GridError::Misaligned {
                window: window_secs / 60,
                interval: interval_minutes,
            });
        }

        Ok(Self {
            opening,
            closing,
            interval_minutes,
        })
    }

    pub fn opening(&self) -> NaiveTime {
        self.opening
    }

    pub fn closing(&self) -> NaiveTime {
        self.closing
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn len(&self) -> usize {
        let window_secs =
            self.closing.num_seconds_from_midnight() - self.opening.num_seconds_from_midnight();
        (window_secs / (self.interval_minutes * 60)) as usize
    }

    /// `(start, end)` pairs in order; the first starts at opening and the last ends at closing.
    pub fn slots(&self) -> Vec<(NaiveTime, NaiveTime)> {
        let step = Duration::minutes(i64::from(self.interval_minutes));
        let mut slots = Vec::with_capacity(self.len());
        let mut start = self.opening;
        for _ in 0..self.len() {
            let end = start + step;
            slots.push((start, end));
            start = end;
        }
        slots
    }
}
