// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Voices are what ends up in bars: a channel's events plus what the channel is for.

use std::fmt;

use crate::error::{Result, TimelineError};
use crate::event::{Channel, Ms, UniqueEvent};
use crate::timeline::Timeline;
use crate::track::Trk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceKind {
    /// A voice played by an instrument.
    Output { master_volume: u8 },
    /// A voice performed on a controller.
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDef {
    kind: VoiceKind,
    channel: Channel,
    events: Vec<UniqueEvent>,
}

impl VoiceDef {
    pub fn output(channel: Channel, master_volume: u8) -> Result<Self> {
        if master_volume > 127 {
            return Err(TimelineError::InvalidVolume {
                volume: master_volume,
            });
        }
        Ok(VoiceDef {
            kind: VoiceKind::Output { master_volume },
            channel,
            events: Vec::new(),
        })
    }

    pub fn input(channel: Channel) -> Self {
        VoiceDef {
            kind: VoiceKind::Input,
            channel,
            events: Vec::new(),
        }
    }

    /// An empty voice with the same kind and channel.
    pub fn empty_like(&self) -> Self {
        VoiceDef {
            kind: self.kind,
            channel: self.channel,
            events: Vec::new(),
        }
    }

    /// Wrap a finished track. A leading offset becomes a rest.
    pub fn from_trk(kind: VoiceKind, mut trk: Trk) -> Result<Self> {
        if let VoiceKind::Output { master_volume } = kind {
            if master_volume > 127 {
                return Err(TimelineError::InvalidVolume {
                    volume: master_volume,
                });
            }
        }
        trk.make_offset_explicit();
        Ok(VoiceDef {
            kind,
            channel: trk.channel(),
            events: trk.into_events(),
        })
    }

    /// Assemble a voice from fragments that were generated separately, in order.
    /// All fragments have to be on the same channel.
    pub fn from_fragments(kind: VoiceKind, fragments: Vec<Trk>) -> Result<Self> {
        let mut fragments = fragments.into_iter();
        let mut voice = match fragments.next() {
            Some(first) => VoiceDef::from_trk(kind, first)?,
            None => return Err(TimelineError::EmptyTimeline),
        };
        for mut fragment in fragments {
            if fragment.channel() != voice.channel {
                return Err(TimelineError::ChannelMismatch {
                    expected: vec![voice.channel],
                    found: vec![fragment.channel()],
                });
            }
            fragment.make_offset_explicit();
            voice.append_events(fragment.into_events());
        }
        Ok(voice)
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    pub fn master_volume(&self) -> Option<u8> {
        match self.kind {
            VoiceKind::Output { master_volume } => Some(master_volume),
            VoiceKind::Input => None,
        }
    }

    /// Append another voice on the same channel.
    pub fn concat(&mut self, other: VoiceDef) -> Result<()> {
        if other.channel != self.channel {
            return Err(TimelineError::ChannelMismatch {
                expected: vec![self.channel],
                found: vec![other.channel],
            });
        }
        self.append_events(other.events);
        Ok(())
    }

    /// Where the voice would have to be cut at `cut`, without touching it.
    pub(crate) fn plan_split(&self, cut: Ms) -> Result<SplitPlan> {
        let duration = self.duration();
        if cut > duration {
            return Err(TimelineError::CutOutOfRange { cut, duration });
        }
        for (index, event) in self.events.iter().enumerate() {
            if event.straddles(cut) {
                return if event.is_rest() {
                    Ok(SplitPlan::InsideRest(index))
                } else {
                    Err(TimelineError::IllegalSplitPoint {
                        channel: self.channel,
                        cut,
                        chord_start: event.position(),
                        chord_end: event.end(),
                    })
                };
            }
            if event.position() >= cut {
                return Ok(SplitPlan::Before(index));
            }
        }
        Ok(SplitPlan::Before(self.events.len()))
    }

    /// Cut the voice in two according to a plan made for this voice. `self` keeps
    /// everything before the cut, the returned voice starts at the cut.
    pub(crate) fn split_off(&mut self, cut: Ms, plan: SplitPlan) -> VoiceDef {
        let at = match plan {
            SplitPlan::Before(index) => index,
            SplitPlan::InsideRest(index) => {
                let rest = &mut self.events[index];
                let tail = rest.end() - cut;
                rest.set_duration(cut - rest.position());
                self.events.insert(index + 1, UniqueEvent::rest(cut, tail));
                index + 1
            }
        };
        let mut after = self.empty_like();
        after.events = self.events.split_off(at);
        for event in after.events.iter_mut() {
            event.set_position(event.position() - cut);
        }
        after
    }
}

/// How a single voice is cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitPlan {
    /// The cut lies on the boundary in front of this event index (or at the end).
    Before(usize),
    /// The cut lies inside the rest at this index.
    InsideRest(usize),
}

impl Timeline for VoiceDef {
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

impl fmt::Display for VoiceDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            VoiceKind::Output { master_volume } => {
                write!(f, "out {} (vol {}):", self.channel, master_volume)?
            }
            VoiceKind::Input => write!(f, "in {}:", self.channel)?,
        }
        for event in self.events.iter() {
            write!(f, " {}", event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Clef;
    use crate::note::{Note, Velocity};

    fn chord(position: Ms, duration: Ms) -> UniqueEvent {
        UniqueEvent::chord(position, vec![Note::from_midi(48)], Velocity::DEFAULT, duration)
    }

    fn voice() -> VoiceDef {
        let trk = Trk::from_events(
            0,
            vec![
                chord(0, 500),
                UniqueEvent::rest(500, 1000),
                UniqueEvent::clef(1500, Clef::Bass),
                chord(1500, 500),
            ],
        )
        .unwrap();
        VoiceDef::from_trk(VoiceKind::Output { master_volume: 100 }, trk).unwrap()
    }

    #[test]
    fn volume_range() {
        assert_eq!(
            VoiceDef::output(0, 128),
            Err(TimelineError::InvalidVolume { volume: 128 })
        );
        assert_eq!(VoiceDef::output(0, 127).unwrap().master_volume(), Some(127));
        assert_eq!(VoiceDef::input(0).master_volume(), None);
    }

    #[test]
    fn fragments_are_concatenated() {
        let a = Trk::from_events(5, vec![chord(0, 100)]).unwrap();
        let b = Trk::from_events(5, vec![chord(0, 200)])
            .unwrap()
            .with_position_re_container(50);
        let voice = VoiceDef::from_fragments(VoiceKind::Input, vec![a, b]).unwrap();
        voice.assert_consistency().unwrap();
        assert_eq!(voice.channel(), 5);
        assert_eq!(voice.duration(), 350);
        assert_eq!(voice.events()[1], UniqueEvent::rest(100, 50));

        let c = Trk::new(6);
        assert_eq!(
            VoiceDef::from_fragments(VoiceKind::Input, vec![Trk::new(5), c]),
            Err(TimelineError::ChannelMismatch {
                expected: vec![5],
                found: vec![6]
            })
        );
        assert_eq!(
            VoiceDef::from_fragments(VoiceKind::Input, Vec::new()),
            Err(TimelineError::EmptyTimeline)
        );
    }

    #[test]
    fn split_plans() {
        let v = voice();
        assert_eq!(v.plan_split(0), Ok(SplitPlan::Before(0)));
        assert_eq!(v.plan_split(500), Ok(SplitPlan::Before(1)));
        assert_eq!(v.plan_split(800), Ok(SplitPlan::InsideRest(1)));
        assert_eq!(v.plan_split(1500), Ok(SplitPlan::Before(2)));
        assert_eq!(v.plan_split(2000), Ok(SplitPlan::Before(4)));
        assert_eq!(
            v.plan_split(1700),
            Err(TimelineError::IllegalSplitPoint {
                channel: 0,
                cut: 1700,
                chord_start: 1500,
                chord_end: 2000
            })
        );
        assert_eq!(
            v.plan_split(2001),
            Err(TimelineError::CutOutOfRange {
                cut: 2001,
                duration: 2000
            })
        );
    }

    #[test]
    fn split_inside_rest() {
        let mut before = voice();
        let plan = before.plan_split(800).unwrap();
        let after = before.split_off(800, plan);
        before.assert_consistency().unwrap();
        after.assert_consistency().unwrap();
        assert_eq!(before.duration(), 800);
        assert_eq!(after.duration(), 1200);
        assert_eq!(before.events()[1], UniqueEvent::rest(500, 300));
        assert_eq!(after.events()[0], UniqueEvent::rest(0, 700));
        assert_eq!(after.events()[1], UniqueEvent::clef(700, Clef::Bass));
        assert_eq!(after.kind(), before.kind());
    }

    #[test]
    fn marker_on_cut_moves_to_later_part() {
        let mut before = voice();
        let plan = before.plan_split(1500).unwrap();
        let after = before.split_off(1500, plan);
        assert_eq!(before.len(), 2);
        assert_eq!(after.events()[0], UniqueEvent::clef(0, Clef::Bass));
        assert_eq!(after.events()[1], chord(0, 500));
    }

    #[test]
    fn display() {
        assert_eq!(
            voice().to_string(),
            "out 0 (vol 100): C3/500 r1000 {bass} C3/500"
        );
        assert_eq!(VoiceDef::input(2).to_string(), "in 2:");
    }
}
