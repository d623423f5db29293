/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

/// the streaming ACMI line parser. Input arrives as arbitrarily sized byte chunks that
/// are not aligned to line boundaries - partial lines are buffered across chunks.
/// A single corrupt line never aborts the stream, it is skipped and counted.
///
/// Line examples:
///   FileType=text/acmi/tacview
///   #47.63
///   9341,T=6.85|7.27|4572.13|-4.2|3.5|-161.8|701491.99|679328.81|-155.7,Type=Air+FixedWing,Pilot=Falcon42
///   -9341

use std::sync::Arc;
use serde::{Serialize,Deserialize};
use radar_common::datetime::SimTime;
use radar_common::debug;
use crate::{AcmiData, AcmiRecord, IngestCounters, Transform, GLOBAL_ID};
use crate::errors::{Result, RadarAcmiError, parse_error};

/// what to do with object records that arrive before the first time marker
/// (without a marker their stream time cannot be established)
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Default)]
pub enum PreMarkerPolicy {
    /// drop and count them (the default)
    #[default]
    Discard,
    /// hold them back and emit them stamped with the first marker time
    Buffer,
}

pub struct AcmiParser {
    policy: PreMarkerPolicy,
    counters: Arc<IngestCounters>,

    buf: Vec<u8>,              // partial line carry-over across chunk boundaries
    pending: Vec<AcmiRecord>,  // held back pre-marker records (Buffer policy)
    seq: u64,
    time: SimTime,             // current stream time, re-based by time markers
    saw_marker: bool,
}

impl AcmiParser {
    pub fn new (policy: PreMarkerPolicy, counters: Arc<IngestCounters>)->Self {
        AcmiParser {
            policy,
            counters,
            buf: Vec::with_capacity(512),
            pending: Vec::new(),
            seq: 0,
            time: SimTime::ZERO,
            saw_marker: false,
        }
    }

    /// the current stream-relative time (as of the last time marker)
    pub fn time (&self)->SimTime { self.time }

    /// prepare for a new connection of the same session. Buffered partial input and
    /// held back records of the old connection are dropped. Note the stream time is
    /// kept - a live re-connect continues at mission time and per-object timestamps
    /// have to stay monotonic for the downstream store
    pub fn reset (&mut self) {
        self.buf.clear();
        self.pending.clear();
        self.saw_marker = false;
    }

    /// feed one raw chunk, appending all records that become complete to `out`
    pub fn push_chunk (&mut self, chunk: &[u8], out: &mut Vec<AcmiRecord>) {
        self.buf.extend_from_slice( chunk);

        let buf = std::mem::take( &mut self.buf);
        let mut start = 0;
        while let Some(i) = memchr::memchr( b'\n', &buf[start..]) {
            match str::from_utf8( &buf[start..start+i]) {
                Ok(line) => self.parse_line( line, out),
                Err(_) => {
                    self.counters.inc_lines();
                    self.counters.inc_malformed();
                }
            }
            start += i + 1;
        }
        self.buf.extend_from_slice( &buf[start..]); // keep the partial tail
    }

    /// feed one pre-split line (no trailing newline). Used by push_chunk but also
    /// directly by file replay and tests
    pub fn parse_line (&mut self, line: &str, out: &mut Vec<AcmiRecord>) {
        self.counters.inc_lines();

        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() { return }

        // known ignorable headers
        if line.starts_with("FileType") || line.starts_with("FileVersion") {
            self.counters.inc_ignored();
            return
        }

        match self.parse_record( line) {
            Ok(data) => self.emit( data, out),
            Err(e) => {
                self.counters.inc_malformed();
                debug!("skipping malformed line {:?}: {}", line, e);
            }
        }
    }

    fn parse_record (&self, line: &str)->Result<ParsedLine> {
        if let Some(rest) = line.strip_prefix('#') {
            // time marker - the actual re-basing happens in emit()
            let secs: f64 = rest.trim().parse().map_err(|_| parse_error!("invalid time marker: {}", line))?;
            if !secs.is_finite() { return Err( parse_error!("non-finite time marker: {}", line)) }
            return Ok( ParsedLine::Marker(secs))
        }

        if let Some(id) = line.strip_prefix('-') {
            let id = id.trim();
            if id.is_empty() { return Err( parse_error!("removal without object id: {}", line)) }
            return Ok( ParsedLine::Data( AcmiData::Remove{ id: id.to_string() }))
        }

        //--- object update: <id>,key=value,...
        let mut parts = line.split(',');
        let id = parts.next().unwrap_or(""); // split always yields at least one element
        if id.is_empty() { return Err( parse_error!("update without object id: {}", line)) }

        let mut transform: Option<Transform> = None;
        let mut props: Vec<(String,String)> = Vec::new();

        for prop in parts {
            let Some((key,value)) = prop.split_once('=') else {
                return Err( parse_error!("invalid property syntax {:?} in: {}", prop, line))
            };
            if key == "T" {
                transform = Some( parse_transform( value)?); // a later T wins
            } else {
                props.push( (key.to_string(), value.to_string()));
            }
        }

        if id == GLOBAL_ID {
            // the global pseudo object has no transform worth keeping
            Ok( ParsedLine::Data( AcmiData::Global{ props }))
        } else {
            Ok( ParsedLine::Data( AcmiData::Update{ id: id.to_string(), transform, props }))
        }
    }

    fn emit (&mut self, parsed: ParsedLine, out: &mut Vec<AcmiRecord>) {
        match parsed {
            ParsedLine::Marker(secs) => self.emit_marker( secs, out),

            // global records are time-independent session metadata (ReferenceTime etc.)
            // and are exempt from the pre-marker policy
            ParsedLine::Data( data @ AcmiData::Global{..}) => self.emit_record( data, out),

            ParsedLine::Data(data) => {
                if self.saw_marker {
                    self.emit_record( data, out);
                } else {
                    match self.policy {
                        PreMarkerPolicy::Discard => self.counters.inc_pre_marker_dropped(),
                        PreMarkerPolicy::Buffer => {
                            let rec = self.new_record( data);
                            self.pending.push( rec);
                        }
                    }
                }
            }
        }
    }

    fn emit_marker (&mut self, secs: f64, out: &mut Vec<AcmiRecord>) {
        let mut t = SimTime::new( secs);
        if t < self.time {
            // a regressing marker cannot re-order the stream, clamp it
            self.counters.inc_marker_regressions();
            t = self.time;
        }
        self.time = t;

        if !self.saw_marker {
            self.saw_marker = true;
            for mut rec in self.pending.drain(..) {
                rec.time = t; // held back records are stamped with the first marker time
                self.counters.inc_records();
                out.push( rec);
            }
        }

        self.emit_record( AcmiData::TimeMarker, out);
    }

    fn emit_record (&mut self, data: AcmiData, out: &mut Vec<AcmiRecord>) {
        let rec = self.new_record( data);
        self.counters.inc_records();
        out.push( rec);
    }

    fn new_record (&mut self, data: AcmiData)->AcmiRecord {
        let seq = self.seq;
        self.seq += 1;
        AcmiRecord{ seq, time: self.time, data }
    }
}

enum ParsedLine {
    Marker(f64),
    Data(AcmiData),
}

/// parse the pipe separated `T=` composite. Empty components mean "unchanged".
/// The component count discriminates the variants the sim emits:
///   lon|lat|alt                                        simple object, spherical world
///   lon|lat|alt|u|v                                    simple object, flat world
///   lon|lat|alt|u|v|<spurious>                         flat world bullseye (extra separator quirk)
///   lon|lat|alt|roll|pitch|yaw|u|v|heading             full object, flat world
pub fn parse_transform (value: &str)->Result<Transform> {
    let mut c: [Option<f64>; 9] = [None; 9];

    let mut n = 0;
    for (i,s) in value.split('|').enumerate() {
        if i >= c.len() { break } // tolerated, see bullseye quirk
        let s = s.trim();
        if !s.is_empty() {
            let v: f64 = s.parse().map_err(|_| parse_error!("invalid transform component {:?} in T={}", s, value))?;
            c[i] = Some(v);
        }
        n += 1;
    }

    match n {
        3 => Ok( Transform{ lon: c[0], lat: c[1], alt: c[2], ..Transform::default() }),
        5 | 6 => Ok( Transform{ lon: c[0], lat: c[1], alt: c[2], u: c[3], v: c[4], ..Transform::default() }),
        9 => Ok( Transform{
            lon: c[0], lat: c[1], alt: c[2],
            roll: c[3], pitch: c[4], yaw: c[5],
            u: c[6], v: c[7], heading: c[8],
        }),
        _ => Err( parse_error!("unsupported transform arity {} in T={}", n, value))
    }
}
