// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use crate::error::{Result, TimelineError};
use crate::event::{Channel, Ms, UniqueEvent};
use crate::timeline::Timeline;

/// A sequence of events on one channel, as produced by a composition algorithm.
///
/// A track is owned by exactly one container. Use `clone` to put the same material
/// somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trk {
    channel: Channel,
    /// Where this track's zero lies in its container.
    position_re_container: Ms,
    events: Vec<UniqueEvent>,
}

impl Trk {
    pub fn new(channel: Channel) -> Self {
        Trk {
            channel,
            position_re_container: 0,
            events: Vec::new(),
        }
    }

    /// Build a track from literal events. They have to form a consistent timeline.
    ///
    /// # Examples
    ///
    /// ```
    /// use syn_score::event::UniqueEvent;
    /// use syn_score::note::{Note, Velocity};
    /// use syn_score::timeline::Timeline;
    /// use syn_score::track::Trk;
    ///
    /// let c4 = vec![Note::from_midi(60)];
    /// let trk = Trk::from_events(0, vec![
    ///     UniqueEvent::chord(0, c4.clone(), Velocity::DEFAULT, 500),
    ///     UniqueEvent::rest(500, 1000),
    ///     UniqueEvent::chord(1500, c4, Velocity::DEFAULT, 500),
    /// ]).unwrap();
    /// assert_eq!(trk.duration(), 2000);
    /// ```
    pub fn from_events(channel: Channel, events: Vec<UniqueEvent>) -> Result<Self> {
        let mut trk = Trk::new(channel);
        for event in events {
            trk.add(event)?;
        }
        Ok(trk)
    }

    pub fn with_position_re_container(mut self, position: Ms) -> Self {
        self.position_re_container = position;
        self
    }

    pub fn position_re_container(&self) -> Ms {
        self.position_re_container
    }

    pub fn set_position_re_container(&mut self, position: Ms) {
        self.position_re_container = position;
    }

    /// Where the track ends, measured from its container's zero.
    pub fn end_ms_re_container(&self) -> Ms {
        self.position_re_container + self.duration()
    }

    /// Append another track of the same channel at the end of this one.
    pub fn concat(&mut self, other: Trk) -> Result<()> {
        if other.channel != self.channel {
            return Err(TimelineError::ChannelMismatch {
                expected: vec![self.channel],
                found: vec![other.channel],
            });
        }
        self.append_events(other.events);
        Ok(())
    }

    /// Turn a leading offset into an explicit rest, so the track starts at its
    /// container's zero.
    pub(crate) fn make_offset_explicit(&mut self) {
        let offset = self.position_re_container;
        if offset > 0 {
            let mut padded = Trk::new(self.channel);
            padded.events.push(UniqueEvent::rest(0, offset));
            padded.append_events(std::mem::take(&mut self.events));
            self.events = padded.events;
            self.position_re_container = 0;
        }
    }

    pub fn into_events(self) -> Vec<UniqueEvent> {
        self.events
    }
}

impl Timeline for Trk {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn events(&self) -> &[UniqueEvent] {
        &self.events
    }

    fn events_mut(&mut self) -> &mut Vec<UniqueEvent> {
        &mut self.events
    }
}
