// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The payload of a chord: which keys are pressed and how hard.

use std::fmt;

/// A MIDI key index, where C4 corresponds to 60.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    pub fn try_from_midi(midi_note: i64) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }

    /// # Panics
    ///
    /// If `midi_note` is not below 128.
    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    /// Parse a note written as `<letter>[#|b]<octave>`, the octave defaulting to 4.
    ///
    /// # Examples
    ///
    /// ```
    /// use syn_score::note::Note;
    ///
    /// assert_eq!(Note::named_str("A4"), Some(Note::from_midi(69)));
    /// assert_eq!(Note::named_str("c#6"), Some(Note::from_midi(85)));
    /// assert_eq!(Note::named_str("Gb2"), Some(Note::from_midi(42)));
    /// assert_eq!(Note::named_str("C-1"), Some(Note::from_midi(0)));
    /// assert_eq!(Note::named_str("E"), Some(Note::from_midi(64)));
    /// assert_eq!(Note::named_str("H4"), None);
    /// ```
    pub fn named_str(name_str: &str) -> Option<Note> {
        let mut chars = name_str.chars();
        let step: i64 = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let rest = chars.as_str();
        let (accidental, octave_str) = if let Some(octave) = rest.strip_prefix('#') {
            (1, octave)
        } else if let Some(octave) = rest.strip_prefix('b') {
            (-1, octave)
        } else {
            (0, rest)
        };
        let octave: i64 = if octave_str.is_empty() {
            4
        } else {
            octave_str.parse().ok()?
        };
        let midi = octave
            .checked_add(1)?
            .checked_mul(12)?
            .checked_add(step + accidental)?;
        Note::try_from_midi(midi)
    }

    /// Shift by a number of semitones, if the result is still a MIDI key.
    pub fn transposed(self, semitones: i64) -> Option<Note> {
        Note::try_from_midi(self.0 as i64 + semitones)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let octave = self.0 as i32 / 12 - 1;
        write!(f, "{}{}", NAMES[self.0 as usize % 12], octave)
    }
}

/// MIDI velocity of a chord, 0 to 127 inclusive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Velocity(u8);

impl Velocity {
    pub const MAX: Velocity = Velocity(127);
    pub const MIN: Velocity = Velocity(0);
    /// Used when a literal chord does not state its velocity.
    pub const DEFAULT: Velocity = Velocity(64);

    pub fn try_from_midi(velocity: i64) -> Option<Velocity> {
        if (0..128).contains(&velocity) {
            Some(Velocity(velocity as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity::DEFAULT
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
