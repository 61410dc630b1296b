// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Parallel tracks covering the same stretch of a piece.

use crate::barline;
use crate::block::Block;
use crate::config::{SplitConfig, TieBreak};
use crate::error::{Result, TimelineError};
use crate::event::{Channel, Ms};
use crate::timeline::Timeline;
use crate::track::Trk;
use crate::voice::{VoiceDef, VoiceKind};

/// A bundle of tracks, one per channel, all lasting equally long.
///
/// Tracks are kept in the channel order the sequence was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seq {
    abs_position_ms: Ms,
    trks: Vec<Trk>,
}

impl Seq {
    /// Bundle `trks`, which must contain exactly one track per channel in `channel_order`.
    ///
    /// Track offsets inside the sequence are turned into leading rests before the
    /// durations are compared.
    pub fn new(abs_position_ms: Ms, trks: Vec<Trk>, channel_order: &[Channel]) -> Result<Self> {
        let found: Vec<Channel> = trks.iter().map(Trk::channel).collect();
        if !same_channel_set(channel_order, &found) {
            return Err(TimelineError::ChannelMismatch {
                expected: channel_order.to_vec(),
                found,
            });
        }

        let mut trks = trks;
        for trk in trks.iter_mut() {
            trk.make_offset_explicit();
            trk.assert_consistency()?;
        }
        barline::common_duration(&trks)?;

        let mut ordered = Vec::with_capacity(trks.len());
        for &channel in channel_order {
            if let Some(index) = trks.iter().position(|t| t.channel() == channel) {
                ordered.push(trks.swap_remove(index));
            }
        }
        Ok(Seq {
            abs_position_ms,
            trks: ordered,
        })
    }

    pub fn abs_position_ms(&self) -> Ms {
        self.abs_position_ms
    }

    pub fn set_abs_position_ms(&mut self, position: Ms) {
        self.abs_position_ms = position;
    }

    pub fn duration(&self) -> Ms {
        self.trks.first().map_or(0, Trk::duration)
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.trks.iter().map(Trk::channel).collect()
    }

    pub fn trks(&self) -> &[Trk] {
        &self.trks
    }

    pub fn trk(&self, channel: Channel) -> Option<&Trk> {
        self.trks.iter().find(|t| t.channel() == channel)
    }

    /// Append another sequence channel by channel. Both have to cover the same
    /// channels, in whatever order.
    pub fn concat(&mut self, other: Seq) -> Result<()> {
        let own = self.channels();
        let theirs = other.channels();
        if !same_channel_set(&own, &theirs) {
            return Err(TimelineError::ChannelMismatch {
                expected: own,
                found: theirs,
            });
        }
        let mut other_trks = other.trks;
        for trk in self.trks.iter_mut() {
            if let Some(index) = other_trks.iter().position(|t| t.channel() == trk.channel()) {
                trk.concat(other_trks.swap_remove(index))?;
            }
        }
        Ok(())
    }

    /// Snap wanted barline positions (absolute, ascending) to positions where the
    /// sequence can actually be cut, using the default tie break.
    pub fn barline_abs_ms_positions(&self, approximate: &[Ms]) -> Result<Vec<Ms>> {
        self.barline_abs_ms_positions_with(approximate, TieBreak::default())
    }

    /// Unlike the balanced barlines, the end of the sequence is a valid result here.
    ///
    /// Every barline gets a boundary of its own. When wanted positions crowd around
    /// few boundaries, some of them are moved to a boundary further away, e.g.
    /// `[2999, 3100]` may become `[2500, 3000]` instead of both snapping to 3000.
    /// Wanted positions that are not strictly increasing are rejected.
    pub fn barline_abs_ms_positions_with(
        &self,
        approximate: &[Ms],
        tie_break: TieBreak,
    ) -> Result<Vec<Ms>> {
        let start = self.abs_position_ms;
        let candidates: Vec<Ms> = barline::legal_boundaries(&self.trks)
            .into_iter()
            .filter(|&b| b > 0)
            .map(|b| b + start)
            .collect();
        barline::snap_positions(&candidates, approximate, tie_break)
    }

    /// Absolute positions of `n_bars - 1` interior barlines of roughly equal spacing.
    pub fn balanced_barline_abs_ms_positions(
        &self,
        n_bars: usize,
        tie_break: TieBreak,
    ) -> Result<Vec<Ms>> {
        let positions =
            barline::balanced_barline_ms_positions_with(&self.trks, n_bars, tie_break)?;
        Ok(positions
            .into_iter()
            .map(|p| p + self.abs_position_ms)
            .collect())
    }

    /// Turn every track into an output voice.
    pub fn into_block(self, config: &SplitConfig) -> Result<Block> {
        let kind = VoiceKind::Output {
            master_volume: config.master_volume,
        };
        let voices = self
            .trks
            .into_iter()
            .map(|trk| VoiceDef::from_trk(kind, trk))
            .collect::<Result<Vec<_>>>()?;
        Block::new(self.abs_position_ms, voices)
    }
}

fn same_channel_set(a: &[Channel], b: &[Channel]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    let unique = a.windows(2).all(|w| w[0] != w[1]);
    unique && a == b
}
