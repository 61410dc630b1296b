// syn.score -- timelines and bar splitting for algorithmic scores
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A simple line based format for writing down sequences by hand.
//!
//! ```text
//! # everything after a hash is ignored
//! start 4000
//! 0: C4+E4/500@80 r1000 {bass} G2/500
//! 1: r2000
//! ```
//!
//! Each line after `<channel>:` continues that channel's track. A chord is a list of
//! notes joined by `+`, its duration in milliseconds after `/`, and optionally a
//! velocity after `@`, either one for all notes or a list like `@[80,90]`.
//! Rests are `r<ms>` and clef changes `{<clef>}`. Channels appear in the sequence in
//! the order of their first line.

use snafu::Snafu;

use crate::error::TimelineError;
use crate::event::{Channel, ChordDef, Clef, Ms, UniqueEvent};
use crate::note::{Note, Velocity};
use crate::seq::Seq;
use crate::timeline::Timeline;
use crate::track::Trk;

#[derive(Debug, PartialEq, Snafu)]
pub enum ParseError {
    #[snafu(display("line {}: {}", line, message))]
    Syntax { line: usize, message: String },
    #[snafu(display("line {}: {}", line, source))]
    Event { line: usize, source: TimelineError },
    #[snafu(display("{}", source))]
    Sequence { source: TimelineError },
}

pub fn parse_seq(input: &str) -> Result<Seq, ParseError> {
    let mut start = 0;
    let mut trks: Vec<Trk> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        if let Some(position) = content.strip_prefix("start") {
            start = parse_ms(line, position.trim())?;
            continue;
        }

        let mut parts = content.splitn(2, ':');
        let channel_str = parts.next().unwrap_or("").trim();
        let body = parts
            .next()
            .ok_or_else(|| syntax(line, "expected `<channel>: <events>`"))?;
        let channel: Channel = channel_str
            .parse()
            .map_err(|_| syntax(line, format!("invalid channel {:?}", channel_str)))?;

        let index = match trks.iter().position(|t| t.channel() == channel) {
            Some(index) => index,
            None => {
                trks.push(Trk::new(channel));
                trks.len() - 1
            }
        };
        let trk = &mut trks[index];
        for token in body.split_ascii_whitespace() {
            let event = parse_event(line, token, trk.duration())?;
            trk.add(event)
                .map_err(|source| ParseError::Event { line, source })?;
        }
    }

    let order: Vec<Channel> = trks.iter().map(Trk::channel).collect();
    Seq::new(start, trks, &order).map_err(|source| ParseError::Sequence { source })
}

fn parse_event(line: usize, token: &str, position: Ms) -> Result<UniqueEvent, ParseError> {
    if let Some(duration) = token.strip_prefix('r') {
        return Ok(UniqueEvent::rest(position, parse_ms(line, duration)?));
    }
    if let Some(name) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        let clef: Clef = name.parse().map_err(|msg: String| syntax(line, msg))?;
        return Ok(UniqueEvent::clef(position, clef));
    }

    let mut parts = token.splitn(2, '/');
    let notes_str = parts.next().unwrap_or("");
    let timing = parts
        .next()
        .ok_or_else(|| syntax(line, format!("chord {:?} has no duration", token)))?;
    let notes = notes_str
        .split('+')
        .map(|name| {
            Note::named_str(name).ok_or_else(|| syntax(line, format!("invalid note {:?}", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut timing = timing.splitn(2, '@');
    let duration = parse_ms(line, timing.next().unwrap_or(""))?;
    let velocities = match timing.next() {
        None => vec![Velocity::DEFAULT; notes.len()],
        Some(vel) => {
            let list = vel.strip_prefix('[').and_then(|v| v.strip_suffix(']'));
            match list {
                Some(list) => list
                    .split(',')
                    .map(|v| parse_velocity(line, v))
                    .collect::<Result<Vec<_>, _>>()?,
                None => vec![parse_velocity(line, vel)?; notes.len()],
            }
        }
    };
    if velocities.len() != notes.len() {
        return Err(syntax(
            line,
            format!("{} velocities for {} notes", velocities.len(), notes.len()),
        ));
    }

    Ok(UniqueEvent::from_chord(
        position,
        ChordDef {
            notes,
            velocities,
            duration,
        },
    ))
}

fn parse_ms(line: usize, s: &str) -> Result<Ms, ParseError> {
    s.parse()
        .map_err(|_| syntax(line, format!("invalid duration {:?}", s)))
}

fn parse_velocity(line: usize, s: &str) -> Result<Velocity, ParseError> {
    s.trim()
        .parse()
        .ok()
        .and_then(Velocity::try_from_midi)
        .ok_or_else(|| syntax(line, format!("invalid velocity {:?}", s)))
}

fn syntax<S: Into<String>>(line: usize, message: S) -> ParseError {
    ParseError::Syntax {
        line,
        message: message.into(),
    }
}
