use std::collections::HashSet;

use chrono::NaiveTime;
use thiserror::Error;

use super::availability::Availability;
use crate::{models::timeslots::Timeslot, utils::format_clock_span};

#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    pub max_slots: usize,
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    /// Reject a student holding two time-overlapping reservations on one date, in any rooms.
    pub forbid_student_overlap: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Span {
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UnknownStudent,
    UnknownRoom,
    UnknownTimeslot,
    InvalidDate,
    NoTimeslots,
    DuplicateTimeslots,
    ExceedsMaxDuration,
    NotConsecutive,
    AlreadyReserved,
    OutsideOperatingHours,
    StudentOverlap,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::UnknownStudent => "unknown_student",
            RejectReason::UnknownRoom => "unknown_room",
            RejectReason::UnknownTimeslot => "unknown_timeslot",
            RejectReason::InvalidDate => "invalid_date",
            RejectReason::NoTimeslots => "no_timeslots",
            RejectReason::DuplicateTimeslots => "duplicate_timeslots",
            RejectReason::ExceedsMaxDuration => "exceeds_max_duration",
            RejectReason::NotConsecutive => "not_consecutive",
            RejectReason::AlreadyReserved => "already_reserved",
            RejectReason::OutsideOperatingHours => "outside_operating_hours",
            RejectReason::StudentOverlap => "student_overlap",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct Rejection {
    pub reason: RejectReason,
    pub message: String,
}

impl Rejection {
    pub fn new<S: Into<String>>(reason: RejectReason, message: S) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Decides whether `slots` may be booked, given what is already taken in the room on that
/// date and the spans the student already holds on that date.
///
/// Rules run in a fixed order and stop at the first failure, so the same request always
/// gets the same message. On success the derived span of the reservation is returned.
pub fn validate(
    slots: &[Timeslot],
    availability: &Availability,
    student_spans: &[Span],
    rules: &Rules,
) -> Result<Span, Rejection> {
    if slots.is_empty() {
        return Err(Rejection::new(
            RejectReason::NoTimeslots,
            "No timeslots selected. Please select at least one timeslot.",
        ));
    }

    let mut seen = HashSet::with_capacity(slots.len());
    if !slots.iter().all(|slot| seen.insert(slot.id)) {
        return Err(Rejection::new(
            RejectReason::DuplicateTimeslots,
            "Duplicate timeslots are not allowed.",
        ));
    }

    if slots.len() > rules.max_slots {
        return Err(Rejection::new(
            RejectReason::ExceedsMaxDuration,
            format!(
                "Reservation exceeds maximum duration (max {} timeslots).",
                rules.max_slots
            ),
        ));
    }

    let mut sorted = slots.to_vec();
    sorted.sort_by_key(|slot| slot.start_time);
    if sorted
        .windows(2)
        .any(|pair| pair[0].end_time != pair[1].start_time)
    {
        return Err(Rejection::new(
            RejectReason::NotConsecutive,
            "Timeslots must be consecutive.",
        ));
    }

    if let Some(taken) = sorted.iter().find(|slot| !availability.is_available(slot)) {
        return Err(Rejection::new(
            RejectReason::AlreadyReserved,
            format!(
                "This study room is already reserved for timeslot: {}.",
                format_clock_span(&taken.start_time, &taken.end_time)
            ),
        ));
    }

    let span = Span {
        start_time: sorted[0].start_time,
        end_time: sorted[sorted.len() - 1].end_time,
    };
    if span.start_time >= span.end_time
        || span.start_time < rules.opening
        || span.end_time > rules.closing
    {
        return Err(Rejection::new(
            RejectReason::OutsideOperatingHours,
            format!(
                "Reservations must fall within operating hours ({}).",
                format_clock_span(&rules.opening, &rules.closing)
            ),
        ));
    }

    if rules.forbid_student_overlap {
        if let Some(held) = student_spans.iter().find(|held| held.overlaps(&span)) {
            return Err(Rejection::new(
                RejectReason::StudentOverlap,
                format!(
                    "You already have a reservation overlapping {} on this date.",
                    format_clock_span(&held.start_time, &held.end_time)
                ),
            ));
        }
    }

    Ok(span)
}
