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

//! support for the Tacview ACMI real time telemetry (TRTT) wire format: the streaming
//! line parser, the decoded update record model and the socket client that feeds records
//! into a downstream sink.
//! See https://www.tacview.net/documentation/acmi/ for the text format this decodes

use std::fmt;
use std::sync::{Arc, atomic::{AtomicU64,Ordering}};
use radar_common::datetime::SimTime;

pub mod parse;
pub mod trtt;
pub mod errors;

/// the object id of the implicit global object
pub const GLOBAL_ID: &str = "0";

/// one decoded record of a telemetry stream. `seq` is a per-connection sequence
/// number for ordering diagnostics, `time` the stream-relative time the record was
/// decoded at (re-based by the preceding time marker)
#[derive(Debug,Clone,PartialEq)]
pub struct AcmiRecord {
    pub seq: u64,
    pub time: SimTime,
    pub data: AcmiData,
}

/// the discriminated payload of an AcmiRecord
#[derive(Debug,Clone,PartialEq)]
pub enum AcmiData {
    /// `#<secs>` - re-bases the stream-relative time of all subsequent records
    TimeMarker,

    /// `-<id>` - the object left the battlefield
    Remove { id: String },

    /// properties of the global (id 0) pseudo object, e.g. ReferenceTime
    Global { props: Vec<(String,String)> },

    /// `<id>,T=...,k=v,...` - delta update (doubles as creation for unknown ids).
    /// Property values are kept as raw strings and coerced by the consumer
    Update { id: String, transform: Option<Transform>, props: Vec<(String,String)> },
}

impl AcmiRecord {
    pub fn is_time_marker (&self)->bool { matches!( self.data, AcmiData::TimeMarker) }
}

impl fmt::Display for AcmiRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            AcmiData::TimeMarker => write!( f, "#{} (seq {})", self.time, self.seq),
            AcmiData::Remove{id} => write!( f, "-{} at {} (seq {})", id, self.time, self.seq),
            AcmiData::Global{props} => write!( f, "global {} props at {} (seq {})", props.len(), self.time, self.seq),
            AcmiData::Update{id,transform,props} => {
                write!( f, "{} {} props at {} (seq {})", id, props.len(), self.time, self.seq)
            }
        }
    }
}

/// the decoded `T=` composite property. Components are deltas - a `None` means
/// "unchanged", not "zero" (the wire format leaves unchanged components empty)
#[derive(Debug,Clone,Copy,Default,PartialEq)]
pub struct Transform {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub alt: Option<f64>,     // meters MSL

    pub roll: Option<f64>,    // degrees
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,

    pub u: Option<f64>,       // flat world east offset, meters
    pub v: Option<f64>,       // flat world north offset, meters
    pub heading: Option<f64>, // degrees
}

impl Transform {
    pub fn is_empty (&self)->bool { *self == Transform::default() }

    pub fn has_planar_position (&self)->bool { self.u.is_some() && self.v.is_some() }
}

/// ingest diagnostics counters, shared between the network context that owns the
/// parser and whoever reports them. All counters are monotonically increasing
#[derive(Debug,Default)]
pub struct IngestCounters {
    lines: AtomicU64,              // total lines seen (incl. skipped ones)
    records: AtomicU64,            // records emitted downstream
    malformed: AtomicU64,          // unparseable lines, skipped
    ignored: AtomicU64,            // headers and other known ignorable lines
    marker_regressions: AtomicU64, // time markers older than stream time, clamped
    pre_marker_dropped: AtomicU64, // records discarded before the first time marker
    reconnects: AtomicU64,
}

impl IngestCounters {
    pub fn new ()->Arc<Self> { Arc::new( IngestCounters::default()) }

    #[inline] pub(crate) fn inc_lines (&self) { self.lines.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_records (&self) { self.records.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_malformed (&self) { self.malformed.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_ignored (&self) { self.ignored.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_marker_regressions (&self) { self.marker_regressions.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_pre_marker_dropped (&self) { self.pre_marker_dropped.fetch_add(1, Ordering::Relaxed); }
    #[inline] pub(crate) fn inc_reconnects (&self) { self.reconnects.fetch_add(1, Ordering::Relaxed); }

    pub fn lines (&self)->u64 { self.lines.load(Ordering::Relaxed) }
    pub fn records (&self)->u64 { self.records.load(Ordering::Relaxed) }
    pub fn malformed (&self)->u64 { self.malformed.load(Ordering::Relaxed) }
    pub fn ignored (&self)->u64 { self.ignored.load(Ordering::Relaxed) }
    pub fn marker_regressions (&self)->u64 { self.marker_regressions.load(Ordering::Relaxed) }
    pub fn pre_marker_dropped (&self)->u64 { self.pre_marker_dropped.load(Ordering::Relaxed) }
    pub fn reconnects (&self)->u64 { self.reconnects.load(Ordering::Relaxed) }
}

impl fmt::Display for IngestCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "IngestCounters( lines: {}, records: {}, malformed: {}, ignored: {}, marker_regressions: {}, pre_marker_dropped: {}, reconnects: {})",
            self.lines(), self.records(), self.malformed(), self.ignored(),
            self.marker_regressions(), self.pre_marker_dropped(), self.reconnects())
    }
}

/// where the connector pushes decoded records to. Implemented by the downstream
/// update queue - the network context never talks to the entity store directly
pub trait RecordSink: Send + Sync {
    fn push (&self, rec: AcmiRecord);
}

/// a sink that just collects records, for tests and tools
#[derive(Default)]
pub struct VecSink {
    records: std::sync::Mutex<Vec<AcmiRecord>>
}

impl VecSink {
    pub fn new ()->Arc<Self> { Arc::new( VecSink::default()) }

    pub fn take (&self)->Vec<AcmiRecord> {
        std::mem::take( &mut *self.records.lock().unwrap())
    }
}

impl RecordSink for VecSink {
    fn push (&self, rec: AcmiRecord) {
        self.records.lock().unwrap().push( rec);
    }
}
