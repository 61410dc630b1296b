// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Operations shared by everything that holds a single-channel sequence of events.
//!
//! A consistent timeline starts at 0 and has no holes: every event begins exactly
//! where the previous one ended. Silence is spelled out as rests, and clef markers
//! sit on the boundary in front of the event they apply to.
//!
//! Building and validating are separate steps. `add` and the `push_*` family keep
//! the timeline consistent, while `insert` trusts the caller and leaves checking
//! to `assert_consistency`.

use crate::error::{Result, TimelineError};
use crate::event::{Channel, Clef, EventKind, Ms, UniqueEvent};
use crate::note::{Note, Velocity};

pub trait Timeline {
    fn channel(&self) -> Channel;

    fn events(&self) -> &[UniqueEvent];

    fn events_mut(&mut self) -> &mut Vec<UniqueEvent>;

    fn len(&self) -> usize {
        self.events().len()
    }

    fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    /// Time from the timeline's zero to the end of its last event.
    fn duration(&self) -> Ms {
        self.events().iter().map(UniqueEvent::end).max().unwrap_or(0)
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(UniqueEvent::kind).collect()
    }

    /// Append an event, which has to start exactly where the timeline currently ends.
    fn add(&mut self, event: UniqueEvent) -> Result<()> {
        let channel = self.channel();
        let index = self.len();
        let end = self.duration();
        if !event.is_marker() && event.duration() == 0 {
            return Err(TimelineError::InvalidDuration {
                channel,
                index,
                duration: 0,
            });
        }
        if event.position() < end {
            return Err(TimelineError::Ordering {
                channel,
                index,
                position: event.position(),
                previous_end: end,
            });
        }
        if event.position() > end {
            return Err(TimelineError::Gap {
                channel,
                index,
                position: event.position(),
                expected: end,
            });
        }
        self.events_mut().push(event);
        Ok(())
    }

    fn push_chord(&mut self, notes: Vec<Note>, velocity: Velocity, duration: Ms) -> Result<()> {
        let position = self.duration();
        self.add(UniqueEvent::chord(position, notes, velocity, duration))
    }

    fn push_rest(&mut self, duration: Ms) -> Result<()> {
        let position = self.duration();
        self.add(UniqueEvent::rest(position, duration))
    }

    fn push_clef(&mut self, clef: Clef) -> Result<()> {
        let position = self.duration();
        self.add(UniqueEvent::clef(position, clef))
    }

    /// Insert an event as is. Positions are neither adjusted nor checked.
    fn insert(&mut self, index: usize, event: UniqueEvent) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(TimelineError::IndexOutOfRange { index, len });
        }
        self.events_mut().insert(index, event);
        Ok(())
    }

    /// Splice a run of events in front of `index`, pushing everything from `index`
    /// onwards back by the length of the run.
    ///
    /// The positions in `run` are relative to the start of the run.
    fn insert_range(&mut self, index: usize, mut run: Vec<UniqueEvent>) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(TimelineError::IndexOutOfRange { index, len });
        }
        let at = self
            .events()
            .get(index)
            .map_or_else(|| self.duration(), UniqueEvent::position);
        let shift = run.iter().map(UniqueEvent::end).max().unwrap_or(0);

        let events = self.events_mut();
        for event in events[index..].iter_mut() {
            event.set_position(event.position() + shift);
        }
        for event in run.iter_mut() {
            event.set_position(event.position() + at);
        }
        events.splice(index..index, run);
        Ok(())
    }

    /// Remove `count` events starting at `index` and close the hole they leave.
    /// The removed events are returned rebased to start at 0.
    fn remove_range(&mut self, index: usize, count: usize) -> Result<Vec<UniqueEvent>> {
        let len = self.len();
        if index + count > len {
            return Err(TimelineError::IndexOutOfRange {
                index: index + count,
                len,
            });
        }
        let events = self.events_mut();
        let mut removed: Vec<UniqueEvent> = events.drain(index..index + count).collect();
        let start = removed.first().map_or(0, UniqueEvent::position);
        let span = removed.iter().map(UniqueEvent::end).max().unwrap_or(start) - start;
        for event in removed.iter_mut() {
            event.set_position(event.position() - start);
        }
        for event in events[index..].iter_mut() {
            event.set_position(event.position() - span);
        }
        Ok(removed)
    }

    /// Append events that are positioned relative to their own zero at the end of this timeline.
    ///
    /// A trailing rest here and a leading rest in `other` become a single rest,
    /// so repeated concatenation does not accumulate rest fragments.
    fn append_events(&mut self, other: Vec<UniqueEvent>) {
        let offset = self.duration();
        let events = self.events_mut();
        let mut other = other.into_iter().peekable();

        let merge = match (events.last(), other.peek()) {
            (Some(last), Some(first)) => last.is_rest() && first.is_rest() && first.position() == 0,
            _ => false,
        };
        if merge {
            if let (Some(last), Some(first)) = (events.last_mut(), other.next()) {
                last.set_duration(last.duration() + first.duration());
            }
        }

        for mut event in other {
            event.set_position(event.position() + offset);
            events.push(event);
        }
    }

    /// Merge every run of directly adjacent rests into a single rest.
    fn agglomerate_rests(&mut self) {
        let events = self.events_mut();
        let mut merged: Vec<UniqueEvent> = Vec::with_capacity(events.len());
        for event in events.drain(..) {
            match merged.last_mut() {
                Some(last) if last.is_rest() && event.is_rest() => {
                    last.set_duration(last.duration() + event.duration());
                }
                _ => merged.push(event),
            }
        }
        *events = merged;
    }

    /// Stretch or compress the timeline to a new total duration.
    ///
    /// Boundaries are scaled and rounded to the nearest millisecond, so the
    /// total comes out exact. Fails without changing anything if an event
    /// would be rounded away.
    fn set_duration(&mut self, new_duration: Ms) -> Result<()> {
        let channel = self.channel();
        let old_duration = self.duration();
        if old_duration == 0 {
            return Err(TimelineError::EmptyTimeline);
        }

        let mut scaled = Vec::with_capacity(self.len());
        for (index, event) in self.events().iter().enumerate() {
            let start = scale(event.position(), new_duration, old_duration);
            let end = scale(event.end(), new_duration, old_duration);
            if !event.is_marker() && end <= start {
                return Err(TimelineError::InvalidDuration {
                    channel,
                    index,
                    duration: 0,
                });
            }
            scaled.push((start, end - start));
        }

        log::trace!(
            "channel {}: rescaling {} ms to {} ms",
            channel,
            old_duration,
            new_duration
        );
        for (event, (start, duration)) in self.events_mut().iter_mut().zip(scaled) {
            event.set_position(start);
            event.set_duration(duration);
        }
        Ok(())
    }

    /// Check that the events form a gapless, non-overlapping timeline starting at 0.
    fn assert_consistency(&self) -> Result<()> {
        let channel = self.channel();
        let mut cursor = 0;
        for (index, event) in self.events().iter().enumerate() {
            if event.position() < cursor {
                return Err(TimelineError::Ordering {
                    channel,
                    index,
                    position: event.position(),
                    previous_end: cursor,
                });
            }
            if event.position() > cursor {
                return Err(TimelineError::Gap {
                    channel,
                    index,
                    position: event.position(),
                    expected: cursor,
                });
            }
            if !event.is_marker() && event.duration() == 0 {
                return Err(TimelineError::InvalidDuration {
                    channel,
                    index,
                    duration: 0,
                });
            }
            cursor = event.end();
        }
        Ok(())
    }

    /// Check that the sequence of event kinds is exactly `template`, ignoring durations.
    fn assert_kind_template(&self, template: &[EventKind]) -> Result<()> {
        let kinds = self.kinds();
        for index in 0..kinds.len().max(template.len()) {
            let expected = template.get(index).copied();
            let found = kinds.get(index).copied();
            if expected != found {
                return Err(TimelineError::TemplateMismatch {
                    channel: self.channel(),
                    index,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Check that two timelines built independently still have the same chord/rest skeleton.
    fn assert_same_skeleton<T: Timeline + ?Sized>(&self, other: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.assert_kind_template(&other.kinds())
    }

    /// Index of the event sounding at `ms`, ignoring markers.
    fn event_at(&self, ms: Ms) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| !e.is_marker() && e.position() <= ms && ms < e.end())
    }
}

/// `ms * new / old`, rounded to the nearest integer.
fn scale(ms: Ms, new: Ms, old: Ms) -> Ms {
    let (ms, new, old) = (ms as u128, new as u128, old as u128);
    ((2 * ms * new + old) / (2 * old)) as Ms
}
