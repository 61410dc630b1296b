// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Cutting parallel voices into bars.
//!
//! Splitting is lossless: every event ends up in exactly one bar, repositioned
//! relative to the bar start. The only event that is ever divided is a rest
//! crossing a barline. A chord crossing a barline means the barline was not
//! snapped to a legal position, which is reported as an error.
//!
//! All checks run before the first event is moved, so a failed split never
//! hands out partial bars.

use std::fmt;

use log::{debug, trace};

use crate::barline;
use crate::config::TieBreak;
use crate::error::{Result, TimelineError};
use crate::event::Ms;
use crate::timeline::Timeline;
use crate::voice::VoiceDef;

/// A stretch of the piece holding one voice per output/input line.
///
/// Bars can only be obtained from the splitting functions in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    abs_start_ms: Ms,
    voices: Vec<VoiceDef>,
}

impl Bar {
    pub fn abs_start_ms(&self) -> Ms {
        self.abs_start_ms
    }

    pub fn duration(&self) -> Ms {
        self.voices.first().map_or(0, VoiceDef::duration)
    }

    pub fn abs_end_ms(&self) -> Ms {
        self.abs_start_ms + self.duration()
    }

    pub fn voices(&self) -> &[VoiceDef] {
        &self.voices
    }

    pub fn into_voices(self) -> Vec<VoiceDef> {
        self.voices
    }

    /// Check that all voices are consistent, fill the whole bar, and keep their
    /// events inside it.
    pub fn assert_consistency(&self) -> Result<()> {
        let duration = barline::common_duration(&self.voices)?;
        for voice in self.voices.iter() {
            voice.assert_consistency()?;
            check_inside(voice, duration)?;
        }
        Ok(())
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bar {}..{}", self.abs_start_ms, self.abs_end_ms())?;
        for voice in self.voices.iter() {
            write!(f, "\n  {}", voice)?;
        }
        Ok(())
    }
}

/// Every event has to start before the end, markers included.
fn check_inside(voice: &VoiceDef, duration: Ms) -> Result<()> {
    match voice.events().iter().find(|e| e.position() >= duration) {
        Some(event) => Err(TimelineError::OutsideBar {
            channel: voice.channel(),
            position: event.position(),
            duration,
        }),
        None => Ok(()),
    }
}

/// Cut all voices at `cut`, measured from their common zero.
///
/// Returns the parts before and after the cut. The later part is rebased to start
/// at 0, and a marker sitting exactly on the cut goes with it. The voices have to
/// be consistent.
///
/// # Examples
///
/// ```
/// use syn_score::block::split_bar;
/// use syn_score::event::UniqueEvent;
/// use syn_score::note::{Note, Velocity};
/// use syn_score::timeline::Timeline;
/// use syn_score::track::Trk;
/// use syn_score::voice::{VoiceDef, VoiceKind};
///
/// let trk = Trk::from_events(0, vec![
///     UniqueEvent::rest(0, 100),
///     UniqueEvent::chord(100, vec![Note::from_midi(60)], Velocity::DEFAULT, 400),
/// ]).unwrap();
/// let voice = VoiceDef::from_trk(VoiceKind::Input, trk).unwrap();
///
/// assert!(split_bar(vec![voice.clone()], 300).is_err());
/// let (before, after) = split_bar(vec![voice], 50).unwrap();
/// assert_eq!(before[0].duration(), 50);
/// assert_eq!(after[0].duration(), 450);
/// ```
pub fn split_bar(mut voices: Vec<VoiceDef>, cut: Ms) -> Result<(Vec<VoiceDef>, Vec<VoiceDef>)> {
    if voices.is_empty() {
        return Ok((voices, Vec::new()));
    }
    for voice in voices.iter() {
        voice.assert_consistency()?;
    }
    barline::common_duration(&voices)?;
    let plans = voices
        .iter()
        .map(|voice| voice.plan_split(cut))
        .collect::<Result<Vec<_>>>()?;

    trace!("cutting {} voices at {} ms", voices.len(), cut);
    let after = voices
        .iter_mut()
        .zip(plans)
        .map(|(voice, plan)| voice.split_off(cut, plan))
        .collect();
    Ok((voices, after))
}

/// Cut voices into bars at the given positions, measured from the voices' zero.
///
/// `cuts` have to be strictly increasing and lie within `(0, duration]`. A cut at
/// the very end is the closing barline and does not produce an extra bar.
pub fn get_bars(voices: Vec<VoiceDef>, cuts: &[Ms]) -> Result<Vec<Bar>> {
    bars_from(0, voices, cuts)
}

fn bars_from(abs_start_ms: Ms, voices: Vec<VoiceDef>, cuts: &[Ms]) -> Result<Vec<Bar>> {
    if voices.is_empty() {
        return match cuts.first() {
            Some(&cut) => Err(TimelineError::CutOutOfRange { cut, duration: 0 }),
            None => Ok(Vec::new()),
        };
    }

    let duration = barline::common_duration(&voices)?;
    for voice in voices.iter() {
        voice.assert_consistency()?;
        check_inside(voice, duration)?;
    }
    let mut previous = 0;
    for &cut in cuts {
        if cut == 0 || cut > duration {
            return Err(TimelineError::CutOutOfRange { cut, duration });
        }
        if cut <= previous {
            return Err(TimelineError::UnorderedCuts { previous, cut });
        }
        for voice in voices.iter() {
            voice.plan_split(cut)?;
        }
        previous = cut;
    }

    debug!(
        "splitting {} voices of {} ms at {:?}",
        voices.len(),
        duration,
        cuts
    );
    let mut bars = Vec::with_capacity(cuts.len() + 1);
    let mut remainder = voices;
    let mut offset = 0;
    for &cut in cuts.iter().filter(|&&cut| cut < duration) {
        let (bar, rest) = split_bar(remainder, cut - offset)?;
        bars.push(Bar {
            abs_start_ms: abs_start_ms + offset,
            voices: bar,
        });
        remainder = rest;
        offset = cut;
    }
    if offset < duration {
        bars.push(Bar {
            abs_start_ms: abs_start_ms + offset,
            voices: remainder,
        });
    }
    Ok(bars)
}

/// Parallel voices placed at an absolute position in the piece, ready to be cut into bars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    abs_position_ms: Ms,
    voices: Vec<VoiceDef>,
}

impl Block {
    /// The voices have to be consistent and of equal duration.
    pub fn new(abs_position_ms: Ms, voices: Vec<VoiceDef>) -> Result<Self> {
        for voice in voices.iter() {
            voice.assert_consistency()?;
        }
        if !voices.is_empty() {
            barline::common_duration(&voices)?;
        }
        Ok(Block {
            abs_position_ms,
            voices,
        })
    }

    pub fn abs_position_ms(&self) -> Ms {
        self.abs_position_ms
    }

    pub fn duration(&self) -> Ms {
        self.voices.first().map_or(0, VoiceDef::duration)
    }

    pub fn abs_end_ms(&self) -> Ms {
        self.abs_position_ms + self.duration()
    }

    pub fn voices(&self) -> &[VoiceDef] {
        &self.voices
    }

    /// Append another block voice by voice. Both need the same voices in the same order.
    pub fn concat(&mut self, other: Block) -> Result<()> {
        let expected: Vec<_> = self.voices.iter().map(VoiceDef::channel).collect();
        let found: Vec<_> = other.voices.iter().map(VoiceDef::channel).collect();
        if expected != found {
            return Err(TimelineError::ChannelMismatch { expected, found });
        }
        let mismatch = self
            .voices
            .iter()
            .zip(other.voices.iter())
            .find(|(a, b)| a.kind() != b.kind());
        if let Some((a, b)) = mismatch {
            return Err(TimelineError::VoiceKindMismatch {
                channel: a.channel(),
                expected: a.kind(),
                found: b.kind(),
            });
        }
        for (voice, tail) in self.voices.iter_mut().zip(other.voices) {
            voice.concat(tail)?;
        }
        Ok(())
    }

    /// Interior barlines for `n_bars` bars of about the same length, absolute.
    pub fn balanced_barline_abs_ms_positions(
        &self,
        n_bars: usize,
        tie_break: TieBreak,
    ) -> Result<Vec<Ms>> {
        let positions =
            barline::balanced_barline_ms_positions_with(&self.voices, n_bars, tie_break)?;
        Ok(positions
            .into_iter()
            .map(|p| p + self.abs_position_ms)
            .collect())
    }

    /// Cut the block into bars at absolute positions.
    pub fn into_bars(self, abs_cuts: &[Ms]) -> Result<Vec<Bar>> {
        let start = self.abs_position_ms;
        let duration = self.duration();
        let cuts = abs_cuts
            .iter()
            .map(|&cut| {
                if cut < start {
                    Err(TimelineError::CutOutOfRange { cut, duration })
                } else {
                    Ok(cut - start)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        bars_from(start, self.voices, &cuts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitConfig;
    use crate::event::{Clef, UniqueEvent};
    use crate::note::{Note, Velocity};
    use crate::seq::Seq;
    use crate::track::Trk;
    use crate::voice::VoiceKind;
    use expect_test::{expect, Expect};

    fn chord(position: Ms, midi: u8, duration: Ms) -> UniqueEvent {
        UniqueEvent::chord(position, vec![Note::from_midi(midi)], Velocity::DEFAULT, duration)
    }

    fn output(trk: Trk) -> VoiceDef {
        VoiceDef::from_trk(VoiceKind::Output { master_volume: 100 }, trk).unwrap()
    }

    fn example() -> Vec<VoiceDef> {
        let melody = Trk::from_events(
            0,
            vec![chord(0, 60, 500), UniqueEvent::rest(500, 1000), chord(1500, 62, 500)],
        )
        .unwrap();
        let pedal = Trk::from_events(
            1,
            vec![
                UniqueEvent::rest(0, 1000),
                UniqueEvent::clef(1000, Clef::Bass),
                chord(1000, 36, 1000),
            ],
        )
        .unwrap();
        vec![
            output(melody),
            VoiceDef::from_trk(VoiceKind::Input, pedal).unwrap(),
        ]
    }

    fn check(bars: &[Bar], output: Expect) {
        let rendered: Vec<String> = bars.iter().map(|b| b.to_string()).collect();
        output.assert_eq(&rendered.join("\n"));
    }

    /// Put the parts of a split back together without merging anything.
    fn rejoin(before: &VoiceDef, after: &VoiceDef, cut: Ms) -> Vec<UniqueEvent> {
        let mut events = before.events().to_vec();
        for event in after.events() {
            let mut event = event.clone();
            event.set_position(event.position() + cut);
            events.push(event);
        }
        events
    }

    #[test]
    fn split_on_boundaries_is_lossless() {
        let voices = example();
        for &cut in [500, 1000].iter() {
            let (before, after) = split_bar(voices.clone(), cut).unwrap();
            for ((original, a), b) in voices.iter().zip(before.iter()).zip(after.iter()) {
                assert_eq!(a.duration(), cut);
                assert_eq!(b.duration(), 2000 - cut);
                let rejoined = rejoin(a, b, cut);
                let mut expected = original.clone();
                expected.events_mut().clear();
                expected.append_events(rejoined);
                expected.agglomerate_rests();
                assert_eq!(&expected, original);
            }
        }
    }

    #[test]
    fn chords_are_never_cut() {
        let trk =
            Trk::from_events(0, vec![UniqueEvent::rest(0, 100), chord(100, 60, 400)]).unwrap();
        let voices = vec![output(trk)];
        assert_eq!(
            split_bar(voices.clone(), 300),
            Err(TimelineError::IllegalSplitPoint {
                channel: 0,
                cut: 300,
                chord_start: 100,
                chord_end: 500
            })
        );
        assert!(split_bar(voices.clone(), 100).is_ok());
        assert!(split_bar(voices, 500).is_ok());
    }

    #[test]
    fn unchecked_inserts_are_caught_before_splitting() {
        let mut voice = VoiceDef::input(0);
        voice.insert(0, UniqueEvent::rest(0, 100)).unwrap();
        voice.insert(1, chord(200, 60, 100)).unwrap();
        voice.insert(2, UniqueEvent::rest(50, 10)).unwrap();
        assert_eq!(
            split_bar(vec![voice], 150),
            Err(TimelineError::Gap {
                channel: 0,
                index: 1,
                position: 200,
                expected: 100
            })
        );
    }

    #[test]
    fn balanced_example_bars() {
        let melody = Trk::from_events(
            0,
            vec![chord(0, 60, 500), UniqueEvent::rest(500, 1000), chord(1500, 62, 500)],
        )
        .unwrap();
        let voices = vec![output(melody)];
        let cuts = barline::balanced_barline_ms_positions(&voices, 2).unwrap();
        assert_eq!(cuts, vec![500]);
        let bars = get_bars(voices, &cuts).unwrap();
        let events: usize = bars.iter().map(|b| b.voices()[0].len()).sum();
        assert_eq!(events, 3);
        check(
            &bars,
            expect![[r#"
                bar 0..500
                  out 0 (vol 100): C4/500
                bar 500..2000
                  out 0 (vol 100): r1000 D4/500"#]],
        );
    }

    #[test]
    fn example_bars() {
        let voices = example();
        // 1000 is inside voice 1's leading rest and on the chord onset, 1500 is inside its chord
        assert_eq!(
            barline::balanced_barline_ms_positions(&voices, 2).unwrap(),
            vec![1000]
        );
        let bars = get_bars(voices, &[1000, 2000]).unwrap();
        assert_eq!(bars.len(), 2);
        for bar in bars.iter() {
            bar.assert_consistency().unwrap();
        }
        check(
            &bars,
            expect![[r#"
                bar 0..1000
                  out 0 (vol 100): C4/500 r500
                  in 1: r1000
                bar 1000..2000
                  out 0 (vol 100): r500 D4/500
                  in 1: {bass} C2/1000"#]],
        );
    }

    #[test]
    fn failed_split_returns_no_bars() {
        assert_eq!(
            get_bars(example(), &[500, 1500]),
            Err(TimelineError::IllegalSplitPoint {
                channel: 1,
                cut: 1500,
                chord_start: 1000,
                chord_end: 2000
            })
        );
        assert_eq!(
            get_bars(example(), &[1000, 500]),
            Err(TimelineError::UnorderedCuts {
                previous: 1000,
                cut: 500
            })
        );
        assert_eq!(
            get_bars(example(), &[0]),
            Err(TimelineError::CutOutOfRange {
                cut: 0,
                duration: 2000
            })
        );
        assert_eq!(
            get_bars(example(), &[2500]),
            Err(TimelineError::CutOutOfRange {
                cut: 2500,
                duration: 2000
            })
        );
    }

    #[test]
    fn unequal_voices_are_rejected() {
        let mut voices = example();
        voices[1].push_rest(1).unwrap();
        assert_eq!(
            get_bars(voices.clone(), &[1000]),
            Err(TimelineError::DurationMismatch {
                channel: 1,
                expected: 2000,
                found: 2001
            })
        );
        assert!(split_bar(voices, 1000).is_err());
    }

    #[test]
    fn trailing_markers_are_rejected() {
        let mut voices = example();
        voices[0].push_clef(Clef::Treble).unwrap();
        assert_eq!(
            get_bars(voices, &[]),
            Err(TimelineError::OutsideBar {
                channel: 0,
                position: 2000,
                duration: 2000
            })
        );
    }

    #[test]
    fn no_events_are_lost_or_duplicated() {
        let mut trk = Trk::new(0);
        for i in 0..20 {
            if i % 3 == 0 {
                trk.push_rest(70).unwrap();
            } else {
                trk.push_chord(vec![Note::from_midi(50 + i)], Velocity::DEFAULT, 30 + i as Ms)
                    .unwrap();
            }
        }
        let voices = vec![output(trk.clone())];
        let duration = trk.duration();
        for n in 1..=8 {
            let cuts = barline::balanced_barline_ms_positions(&voices, n).unwrap();
            let bars = get_bars(voices.clone(), &cuts).unwrap();
            assert_eq!(bars.len(), n);
            assert_eq!(bars.last().map(Bar::abs_end_ms), Some(duration));
            let chords: usize = bars
                .iter()
                .flat_map(|b| b.voices()[0].events().iter())
                .filter(|e| !e.is_rest())
                .count();
            assert_eq!(chords, 13);
            for (bar, next) in bars.iter().zip(bars.iter().skip(1)) {
                assert_eq!(bar.abs_end_ms(), next.abs_start_ms());
                bar.assert_consistency().unwrap();
            }
        }
    }

    #[test]
    fn blocks_from_sequences() {
        let melody = Trk::from_events(0, vec![chord(0, 60, 300), chord(300, 64, 300)]).unwrap();
        let seq = Seq::new(4000, vec![melody], &[0]).unwrap();
        let mut block = seq.clone().into_block(&SplitConfig::default()).unwrap();
        block.concat(seq.into_block(&SplitConfig::default()).unwrap()).unwrap();
        assert_eq!(block.abs_end_ms(), 5200);

        let cuts = block
            .balanced_barline_abs_ms_positions(2, TieBreak::Earlier)
            .unwrap();
        assert_eq!(cuts, vec![4600]);
        check(
            &block.into_bars(&cuts).unwrap(),
            expect![[r#"
                bar 4000..4600
                  out 0 (vol 100): C4/300 E4/300
                bar 4600..5200
                  out 0 (vol 100): C4/300 E4/300"#]],
        );
    }

    #[test]
    fn block_concat_needs_matching_voices() {
        let mut block = Block::new(0, example()).unwrap();
        let other = Block::new(0, vec![VoiceDef::input(0)]).unwrap();
        assert_eq!(
            block.concat(other),
            Err(TimelineError::ChannelMismatch {
                expected: vec![0, 1],
                found: vec![0]
            })
        );
        let inputs: Vec<VoiceDef> = example()
            .into_iter()
            .map(|v| {
                let mut input = VoiceDef::input(v.channel());
                input.append_events(v.events().to_vec());
                input
            })
            .collect();
        assert_eq!(
            block.concat(Block::new(0, inputs).unwrap()),
            Err(TimelineError::VoiceKindMismatch {
                channel: 0,
                expected: VoiceKind::Output { master_volume: 100 },
                found: VoiceKind::Input
            })
        );
        assert_eq!(
            Block::new(100, example()).unwrap().into_bars(&[50]),
            Err(TimelineError::CutOutOfRange {
                cut: 50,
                duration: 2000
            })
        );
    }
}
