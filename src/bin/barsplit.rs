// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `barsplit` - cuts a sequence written in the text format into bars.

use std::io;
use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

use syn_score::config::{SplitConfig, TieBreak};
use syn_score::text;

#[derive(Debug, StructOpt)]
#[structopt(name = "barsplit", about = "Cutting sequences into bars")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The sequence to split.
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    /// Divide the sequence into this many bars of about equal length.
    #[structopt(short, long, conflicts_with = "cuts")]
    bars: Option<usize>,

    /// Wanted barline positions in absolute milliseconds, moved to the closest legal positions.
    #[structopt(short, long, use_delimiter = true)]
    cuts: Vec<u64>,

    /// Which position wins when two are equally close to a wanted barline (`earlier` or `later`).
    #[structopt(long, default_value = "earlier")]
    tie_break: TieBreak,

    /// Master volume of the generated output voices.
    #[structopt(long, default_value = "100")]
    master_volume: u8,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    let source = std::fs::read_to_string(&opt.source)?;
    let seq = text::parse_seq(&source).map_err(invalid_data)?;
    info!(
        "{}: {} channels, {} ms starting at {} ms",
        opt.source.display(),
        seq.channels().len(),
        seq.duration(),
        seq.abs_position_ms()
    );

    let config = SplitConfig {
        tie_break: opt.tie_break,
        master_volume: opt.master_volume,
    };
    let cuts = match opt.bars {
        Some(n_bars) => seq.balanced_barline_abs_ms_positions(n_bars, config.tie_break),
        None if !opt.cuts.is_empty() => {
            seq.barline_abs_ms_positions_with(&opt.cuts, config.tie_break)
        }
        None => Ok(Vec::new()),
    }
    .map_err(invalid_data)?;
    info!("barlines at {:?}", cuts);

    let bars = seq
        .into_block(&config)
        .and_then(|block| block.into_bars(&cuts))
        .map_err(invalid_data)?;
    for bar in bars.iter() {
        println!("{}", bar);
    }
    Ok(())
}

fn invalid_data<E>(err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}
