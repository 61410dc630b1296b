// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Finding positions where barlines can go.
//!
//! A barline may only sit on an event boundary, and never inside a chord of any
//! of the parallel timelines. Cutting through a rest is fine.

use log::debug;

use crate::config::TieBreak;
use crate::error::{Result, TimelineError};
use crate::event::{Ms, UniqueEvent};
use crate::timeline::Timeline;

/// The duration shared by all timelines.
pub fn common_duration<T: Timeline>(timelines: &[T]) -> Result<Ms> {
    let first = timelines.first().ok_or(TimelineError::EmptyTimeline)?;
    let expected = first.duration();
    for timeline in timelines.iter() {
        let found = timeline.duration();
        if found != expected {
            return Err(TimelineError::DurationMismatch {
                channel: timeline.channel(),
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

/// All positions that are a boundary in some timeline and lie inside no chord, ascending.
pub fn legal_boundaries<T: Timeline>(timelines: &[T]) -> Vec<Ms> {
    let mut boundaries: Vec<Ms> = timelines
        .iter()
        .flat_map(|t| t.events().iter())
        .flat_map(|e| vec![e.position(), e.end()])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let chords: Vec<&UniqueEvent> = timelines
        .iter()
        .flat_map(|t| t.events().iter())
        .filter(|e| !e.is_marker() && !e.is_rest())
        .collect();
    boundaries.retain(|&b| !chords.iter().any(|c| c.straddles(b)));
    boundaries
}

/// Move each target to the closest candidate, keeping the result strictly increasing.
///
/// Targets have to be strictly increasing. Each one may only use candidates after
/// the one picked for its predecessor, and has to leave enough candidates for the
/// targets still to come, so a target can end up on a boundary that is not the
/// closest one to it.
pub fn snap_positions(candidates: &[Ms], targets: &[Ms], tie_break: TieBreak) -> Result<Vec<Ms>> {
    if candidates.len() < targets.len() {
        return Err(TimelineError::NotEnoughBoundaries {
            requested: targets.len(),
            available: candidates.len(),
        });
    }
    if let Some(w) = targets.windows(2).find(|w| w[1] <= w[0]) {
        return Err(TimelineError::UnorderedCuts {
            previous: w[0],
            cut: w[1],
        });
    }

    let mut snapped = Vec::with_capacity(targets.len());
    let mut next = 0;
    for (i, &target) in targets.iter().enumerate() {
        let last = candidates.len() - (targets.len() - i);
        let mut best = next;
        for j in next..=last {
            let d = distance(candidates[j], target);
            let best_d = distance(candidates[best], target);
            let better = match tie_break {
                TieBreak::Earlier => d < best_d,
                TieBreak::Later => d <= best_d,
            };
            if better {
                best = j;
            }
        }
        snapped.push(candidates[best]);
        next = best + 1;
    }
    debug!("snapped barlines {:?} to {:?}", targets, snapped);
    Ok(snapped)
}

fn distance(a: Ms, b: Ms) -> Ms {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Interior barline positions dividing the timelines into `n_bars` bars of about
/// the same length. Returns exactly `n_bars - 1` strictly increasing positions,
/// the final barline at the very end is implied.
///
/// # Examples
///
/// ```
/// use syn_score::barline::balanced_barline_ms_positions;
/// use syn_score::note::{Note, Velocity};
/// use syn_score::timeline::Timeline;
/// use syn_score::track::Trk;
///
/// let mut trk = Trk::new(0);
/// trk.push_chord(vec![Note::from_midi(60)], Velocity::DEFAULT, 500).unwrap();
/// trk.push_rest(1000).unwrap();
/// trk.push_chord(vec![Note::from_midi(62)], Velocity::DEFAULT, 500).unwrap();
///
/// // 500 and 1500 are equally close to 1000, the earlier one wins
/// assert_eq!(balanced_barline_ms_positions(&[trk], 2).unwrap(), vec![500]);
/// ```
pub fn balanced_barline_ms_positions<T: Timeline>(
    timelines: &[T],
    n_bars: usize,
) -> Result<Vec<Ms>> {
    balanced_barline_ms_positions_with(timelines, n_bars, TieBreak::default())
}

pub fn balanced_barline_ms_positions_with<T: Timeline>(
    timelines: &[T],
    n_bars: usize,
    tie_break: TieBreak,
) -> Result<Vec<Ms>> {
    if n_bars == 0 {
        return Err(TimelineError::InvalidBarCount { n_bars });
    }
    let duration = common_duration(timelines)?;
    if duration == 0 {
        return Err(TimelineError::EmptyTimeline);
    }

    let n = n_bars as Ms;
    let targets: Vec<Ms> = (1..n).map(|i| duration * i / n).collect();
    let interior: Vec<Ms> = legal_boundaries(timelines)
        .into_iter()
        .filter(|&b| 0 < b && b < duration)
        .collect();
    snap_positions(&interior, &targets, tie_break)
}
