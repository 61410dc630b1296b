// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The events a timeline is made of.

use std::fmt;
use std::str::FromStr;

use crate::note::{Note, Velocity};

/// Time in milliseconds. Positions are always relative to some container.
pub type Ms = u64;

/// Index of an output or input line.
pub type Channel = u8;

/// A single event on a timeline.
///
/// The position is relative to the start of the timeline holding the event
/// and is only ever changed by that timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueEvent {
    position: Ms,
    pub def: EventDef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDef {
    Chord(ChordDef),
    Rest { duration: Ms },
    /// Marks a clef change before the event that follows. Takes no time.
    Clef(Clef),
}

/// Keys sounding together, with a velocity per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordDef {
    pub notes: Vec<Note>,
    pub velocities: Vec<Velocity>,
    pub duration: Ms,
}

/// Payload-free tag of an event, used for comparing event skeletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Chord,
    Rest,
    Clef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clef {
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
}

impl UniqueEvent {
    /// A chord where all keys share one velocity.
    pub fn chord(position: Ms, notes: Vec<Note>, velocity: Velocity, duration: Ms) -> Self {
        let velocities = vec![velocity; notes.len()];
        UniqueEvent {
            position,
            def: EventDef::Chord(ChordDef {
                notes,
                velocities,
                duration,
            }),
        }
    }

    pub fn from_chord(position: Ms, chord: ChordDef) -> Self {
        UniqueEvent {
            position,
            def: EventDef::Chord(chord),
        }
    }

    pub fn rest(position: Ms, duration: Ms) -> Self {
        UniqueEvent {
            position,
            def: EventDef::Rest { duration },
        }
    }

    pub fn clef(position: Ms, clef: Clef) -> Self {
        UniqueEvent {
            position,
            def: EventDef::Clef(clef),
        }
    }

    pub fn position(&self) -> Ms {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Ms) {
        self.position = position;
    }

    pub fn duration(&self) -> Ms {
        match &self.def {
            EventDef::Chord(chord) => chord.duration,
            EventDef::Rest { duration } => *duration,
            EventDef::Clef(_) => 0,
        }
    }

    /// Change the duration, keeping the position. Has no effect on markers.
    pub fn set_duration(&mut self, duration: Ms) {
        match &mut self.def {
            EventDef::Chord(chord) => chord.duration = duration,
            EventDef::Rest { duration: d } => *d = duration,
            EventDef::Clef(_) => {}
        }
    }

    pub fn end(&self) -> Ms {
        self.position + self.duration()
    }

    pub fn kind(&self) -> EventKind {
        match self.def {
            EventDef::Chord(_) => EventKind::Chord,
            EventDef::Rest { .. } => EventKind::Rest,
            EventDef::Clef(_) => EventKind::Clef,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.kind() == EventKind::Clef
    }

    pub fn is_rest(&self) -> bool {
        self.kind() == EventKind::Rest
    }

    /// True if `ms` lies strictly between the start and the end of this event.
    pub fn straddles(&self, ms: Ms) -> bool {
        self.position < ms && ms < self.end()
    }
}

impl fmt::Display for UniqueEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.def {
            EventDef::Chord(chord) => {
                for (i, note) in chord.notes.iter().enumerate() {
                    if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}", note)?;
                }
                write!(f, "/{}", chord.duration)?;
                // Uniform velocities are the common case, anything else is spelled out
                match chord.velocities.first() {
                    Some(v) if chord.velocities.iter().all(|w| w == v) => {
                        if *v != Velocity::DEFAULT {
                            write!(f, "@{}", v)?;
                        }
                    }
                    Some(_) => {
                        let vels: Vec<String> =
                            chord.velocities.iter().map(|v| v.to_string()).collect();
                        write!(f, "@[{}]", vels.join(","))?;
                    }
                    None => {}
                }
                Ok(())
            }
            EventDef::Rest { duration } => write!(f, "r{}", duration),
            EventDef::Clef(clef) => write!(f, "{{{}}}", clef),
        }
    }
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
            Clef::Alto => "alto",
            Clef::Tenor => "tenor",
            Clef::Percussion => "percussion",
        };
        f.write_str(name)
    }
}

impl FromStr for Clef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "treble" => Ok(Clef::Treble),
            "bass" => Ok(Clef::Bass),
            "alto" => Ok(Clef::Alto),
            "tenor" => Ok(Clef::Tenor),
            "percussion" => Ok(Clef::Percussion),
            other => Err(format!("unknown clef {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_take_no_time() {
        let mut clef = UniqueEvent::clef(300, Clef::Bass);
        clef.set_duration(100);
        assert_eq!(clef.duration(), 0);
        assert_eq!(clef.end(), 300);
        assert!(!clef.straddles(300));
    }

    #[test]
    fn straddling_is_exclusive() {
        let chord = UniqueEvent::chord(100, vec![Note::from_midi(60)], Velocity::MAX, 400);
        assert!(!chord.straddles(100));
        assert!(chord.straddles(101));
        assert!(chord.straddles(499));
        assert!(!chord.straddles(500));
    }

    #[test]
    fn display() {
        let chord = UniqueEvent::chord(
            0,
            vec![Note::from_midi(60), Note::from_midi(64)],
            Velocity::DEFAULT,
            500,
        );
        assert_eq!(chord.to_string(), "C4+E4/500");
        let mut loud = chord.clone();
        if let EventDef::Chord(def) = &mut loud.def {
            def.velocities[1] = Velocity::MAX;
        }
        assert_eq!(loud.to_string(), "C4+E4/500@[64,127]");
        assert_eq!(UniqueEvent::rest(0, 20).to_string(), "r20");
        assert_eq!(UniqueEvent::clef(0, Clef::Alto).to_string(), "{alto}");
        assert_eq!("Bass".parse::<Clef>(), Ok(Clef::Bass));
    }
}
