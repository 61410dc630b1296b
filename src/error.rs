// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Everything that can go wrong when building or splitting timelines.
//!
//! All of these are caller errors. Nothing here is meant to be recovered from,
//! the operation that returned the error has not produced any output.

use snafu::Snafu;

use crate::event::{Channel, EventKind, Ms};
use crate::voice::VoiceKind;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum TimelineError {
    #[snafu(display(
        "Event {} on channel {} starts at {} ms, before the previous event ends at {} ms",
        index,
        channel,
        position,
        previous_end
    ))]
    Ordering {
        channel: Channel,
        index: usize,
        position: Ms,
        previous_end: Ms,
    },
    #[snafu(display(
        "Event {} on channel {} starts at {} ms, leaving silence after {} ms",
        index,
        channel,
        position,
        expected
    ))]
    Gap {
        channel: Channel,
        index: usize,
        position: Ms,
        expected: Ms,
    },
    #[snafu(display(
        "Event {} on channel {} has an invalid duration of {} ms",
        index,
        channel,
        duration
    ))]
    InvalidDuration {
        channel: Channel,
        index: usize,
        duration: Ms,
    },
    #[snafu(display(
        "Channel {} lasts {} ms, expected {} ms",
        channel,
        found,
        expected
    ))]
    DurationMismatch {
        channel: Channel,
        expected: Ms,
        found: Ms,
    },
    #[snafu(display("Expected channels {:?}, got {:?}", expected, found))]
    ChannelMismatch {
        expected: Vec<Channel>,
        found: Vec<Channel>,
    },
    #[snafu(display("Voice on channel {} is {:?}, got {:?}", channel, expected, found))]
    VoiceKindMismatch {
        channel: Channel,
        expected: VoiceKind,
        found: VoiceKind,
    },
    #[snafu(display(
        "Cannot cut channel {} at {} ms inside the chord spanning {}..{} ms",
        channel,
        cut,
        chord_start,
        chord_end
    ))]
    IllegalSplitPoint {
        channel: Channel,
        cut: Ms,
        chord_start: Ms,
        chord_end: Ms,
    },
    #[snafu(display("Cut at {} ms is outside of 0..={} ms", cut, duration))]
    CutOutOfRange { cut: Ms, duration: Ms },
    #[snafu(display("Cut at {} ms does not come after {} ms", cut, previous))]
    UnorderedCuts { previous: Ms, cut: Ms },
    #[snafu(display(
        "Requested {} barlines but only {} legal positions exist",
        requested,
        available
    ))]
    NotEnoughBoundaries { requested: usize, available: usize },
    #[snafu(display(
        "Event {} on channel {} is {:?}, expected {:?}",
        index,
        channel,
        found,
        expected
    ))]
    TemplateMismatch {
        channel: Channel,
        index: usize,
        expected: Option<EventKind>,
        found: Option<EventKind>,
    },
    #[snafu(display(
        "Event at {} ms on channel {} lies outside a bar of {} ms",
        position,
        channel,
        duration
    ))]
    OutsideBar {
        channel: Channel,
        position: Ms,
        duration: Ms,
    },
    #[snafu(display("Index {} is out of range for {} events", index, len))]
    IndexOutOfRange { index: usize, len: usize },
    #[snafu(display("Cannot divide a timeline into {} bars", n_bars))]
    InvalidBarCount { n_bars: usize },
    #[snafu(display("The timeline has no duration to divide"))]
    EmptyTimeline,
    #[snafu(display("Master volume {} is not a MIDI value", volume))]
    InvalidVolume { volume: u8 },
}

pub type Result<T, E = TimelineError> = std::result::Result<T, E>;
