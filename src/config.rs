// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Knobs of the splitting pipeline. Passed in explicitly, there is no global state.

use std::str::FromStr;

/// Which boundary wins when two are equally close to a wanted barline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    Earlier,
    Later,
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::Earlier
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earlier" => Ok(TieBreak::Earlier),
            "later" => Ok(TieBreak::Later),
            other => Err(format!("expected `earlier` or `later`, got {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    pub tie_break: TieBreak,
    /// Master volume given to output voices created from plain tracks.
    pub master_volume: u8,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            tie_break: TieBreak::default(),
            master_volume: 100,
        }
    }
}
