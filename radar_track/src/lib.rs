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

//! the entity state engine behind the tactical display: an authoritative, mutation
//! serialized store of everything the telemetry stream reports, with lifecycle aging,
//! dead reckoning and the tactical geometry derived from it.
//!
//! The store is single threaded by design - the network context only ever talks to it
//! through the bounded update queue (see `pump`), which the render loop drains at each
//! frame boundary. Everything the rest of the pipeline reads is a by-value snapshot.

use std::collections::{HashMap,HashSet,VecDeque,hash_map::Entry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use lazy_static::lazy_static;

use radar_common::{warn,debug};
use radar_common::angle::Angle360;
use radar_common::collections::RingDeque;
use radar_common::datetime::{SimTime, parse_reference_time, millis, secs};
use radar_acmi::{AcmiData, AcmiRecord, Transform};

pub mod annotations;
pub mod geometry;
pub mod pump;
pub mod theater;
pub mod errors;

use annotations::{AnnotationSet, MapAnnotation};

/* #region entity model ******************************************************************************/

/// closed classification of tracked objects. Dispatch is by match, kind specific
/// attributes live in the open property bag of the entity
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum EntityKind {
    FixedWing,
    RotaryWing,
    GroundUnit,
    Missile,
    SurfaceVessel,
    Unknown,
}

impl EntityKind {
    pub fn display_name (&self)->&'static str {
        match self {
            EntityKind::FixedWing => "Fixed Wing",
            EntityKind::RotaryWing => "Helicopter",
            EntityKind::GroundUnit => "Ground",
            EntityKind::Missile => "Missile",
            EntityKind::SurfaceVessel => "Sea",
            EntityKind::Unknown => "Unknown",
        }
    }

    pub fn is_air_unit (&self)->bool {
        matches!( self, EntityKind::FixedWing | EntityKind::RotaryWing)
    }
}

lazy_static! {
    // tacview class fragment -> kind, checked in order against the full Type tag list
    static ref TACVIEW_CLASS_MAP: Vec<(&'static str, EntityKind)> = vec![
        ("FixedWing", EntityKind::FixedWing),
        ("Rotorcraft", EntityKind::RotaryWing),
        ("Missile", EntityKind::Missile),
        ("Ground+Vehicle", EntityKind::GroundUnit),
        ("Watercraft", EntityKind::SurfaceVessel),
    ];

    static ref COLOR_MAP: HashMap<&'static str,[f32;4]> = HashMap::from([
        ("White",  [1.0, 1.0, 1.0, 1.0]),
        ("Green",  [0.0, 1.0, 0.0, 1.0]),
        ("Blue",   [0.0, 0.0, 1.0, 1.0]),
        ("Brown",  [0.5, 0.25, 0.0, 1.0]),
        ("Orange", [1.0, 0.5, 0.0, 1.0]),
        ("Yellow", [1.0, 1.0, 0.0, 1.0]),
        ("Red",    [1.0, 0.0, 0.0, 1.0]),
        ("Black",  [0.0, 0.0, 0.0, 1.0]),
        ("Cyan",   [0.0, 1.0, 1.0, 1.0]),
    ]);
}

pub const DEFAULT_RGBA: [f32;4] = [1.0, 1.0, 1.0, 1.0];

/// classify a tacview `Type` tag list (e.g. "Air+FixedWing")
pub fn classify_type (type_field: &str)->EntityKind {
    for (fragment,kind) in TACVIEW_CLASS_MAP.iter() {
        if type_field.contains( fragment) { return *kind }
    }
    EntityKind::Unknown
}

/// the sim reports the bullseye as an object ("Navaid+Static+Bullseye") but it has no
/// telemetry lifecycle - we divert it into the store's bullseye slot
pub fn is_bullseye_type (type_field: &str)->bool {
    type_field.contains("Bullseye")
}

pub fn rgba_from_color (color: &str)->[f32;4] {
    COLOR_MAP.get( color).copied().unwrap_or(DEFAULT_RGBA)
}

/// lifecycle state of a tracked entity. There is no Removed variant - removed entities
/// are purged from the store, the id must not resurface as the same logical entity
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum EntityStatus {
    Active,
    /// no update within the staleness window - still rendered, from extrapolated
    /// positions, but flagged for distinct visual treatment
    Stale,
}

/// a property the protocol supplies but we don't promote to a first class field
#[derive(Serialize,Debug,Clone,PartialEq)]
#[serde(untagged)]
pub enum PropValue {
    Num(f64),
    Str(String),
}

impl PropValue {
    pub fn of (value: &str)->Self {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => PropValue::Num(n),
            _ => PropValue::Str( value.to_string())
        }
    }

    pub fn as_num (&self)->Option<f64> {
        if let PropValue::Num(n) = self { Some(*n) } else { None }
    }

    pub fn as_str (&self)->Option<&str> {
        if let PropValue::Str(s) = self { Some(s.as_str()) } else { None }
    }
}

/// position in native flat world coordinates (meters east, meters north, meters MSL)
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Default)]
pub struct NativePos {
    pub u: f64,
    pub v: f64,
    pub alt: f64,
}

impl NativePos {
    pub fn new (u: f64, v: f64, alt: f64)->Self { NativePos{u,v,alt} }
}

impl fmt::Display for NativePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.0},{:.0},{:.0}m)", self.u, self.v, self.alt)
    }
}

/// finite differenced velocity estimate in native coordinates, meters per second
#[derive(Serialize,Debug,Clone,Copy,PartialEq)]
pub struct NativeVel {
    pub vu: f64,
    pub vv: f64,
    pub valt: f64,
}

impl NativeVel {
    pub fn ground_speed (&self)->f64 { (self.vu*self.vu + self.vv*self.vv).sqrt() }
}

/// one timestamped raw position report, kept in the entity trace ringbuffer
#[derive(Serialize,Debug,Clone,Copy,PartialEq)]
pub struct PosFix {
    pub time: SimTime,
    pub pos: NativePos,
}

/// the current known state of one tracked object. Snapshots hand out clones of this,
/// consumers never hold references into the store
#[derive(Serialize,Debug,Clone)]
pub struct Entity {
    pub id: Arc<String>,
    pub kind: EntityKind,
    pub status: EntityStatus,
    pub type_field: Option<String>, // the raw tacview Type tag list

    pub first_seen: SimTime,        // reset on re-creation of a reused id
    pub last_seen: SimTime,

    pub pos: NativePos,
    pub lon: Option<f64>,           // raw geodetic, for readouts only
    pub lat: Option<f64>,
    pub heading: Option<Angle360>,
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,

    pub velocity: Option<NativeVel>,

    // the promoted, frequently used properties
    pub callsign: Option<String>,
    pub pilot: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub coalition: Option<String>,
    pub color: Option<String>,
    pub color_rgba: [f32;4],
    pub locked_target: Option<String>, // id of the locked object, "0" = no lock
    pub cas: Option<f64>,
    pub mach: Option<f64>,
    pub health: Option<f64>,
    pub fuel_weight: Option<f64>,

    /// everything else the protocol supplied for this object
    pub extras: HashMap<String,PropValue>,

    /// bounded history of raw position reports (newest last)
    pub trace: VecDeque<PosFix>,
}

impl Entity {
    pub fn new (id: String, time: SimTime, max_trace: usize)->Self {
        Entity {
            id: Arc::new(id),
            kind: EntityKind::Unknown,
            status: EntityStatus::Active,
            type_field: None,
            first_seen: time,
            last_seen: time,
            pos: NativePos::default(),
            lon: None, lat: None,
            heading: None, roll: None, pitch: None, yaw: None,
            velocity: None,
            callsign: None, pilot: None, name: None, group: None,
            coalition: None, color: None,
            color_rgba: DEFAULT_RGBA,
            locked_target: None,
            cas: None, mach: None, health: None, fuel_weight: None,
            extras: HashMap::new(),
            trace: RingDeque::new( max_trace),
        }
    }

    /// the best available display name for this object
    pub fn display_name (&self)->&str {
        if let Some(p) = &self.pilot { if !p.is_empty() { return p } }
        if let Some(c) = &self.callsign { if !c.is_empty() { return c } }
        if let Some(n) = &self.name { if !n.is_empty() { return n } }
        if let Some(t) = &self.type_field { if !t.is_empty() { return t } }
        self.id.as_str()
    }

    pub fn has_lock (&self)->bool {
        matches!( &self.locked_target, Some(id) if !id.is_empty() && id != "0")
    }

    /// apply a delta update. Empty / missing components never overwrite previous values
    fn update (&mut self, time: SimTime, transform: Option<Transform>, props: Vec<(String,String)>, config: &TrackConfig) {
        self.last_seen = time;
        self.status = EntityStatus::Active;

        if let Some(t) = transform {
            if let Some(lon) = t.lon { self.lon = Some(lon) }
            if let Some(lat) = t.lat { self.lat = Some(lat) }
            if let Some(roll) = t.roll { self.roll = Some(roll) }
            if let Some(pitch) = t.pitch { self.pitch = Some(pitch) }
            if let Some(yaw) = t.yaw { self.yaw = Some(yaw) }
            if let Some(hdg) = t.heading { self.heading = Some( Angle360::from_degrees(hdg)) }

            if t.has_planar_position() {
                let pos = NativePos::new( t.u.unwrap(), t.v.unwrap(), t.alt.unwrap_or( self.pos.alt));
                self.push_fix( PosFix{ time, pos }, config);
            } else if let Some(alt) = t.alt {
                self.pos.alt = alt; // altitude-only delta
            }
        }

        for (key,value) in props {
            match key.as_str() {
                "Type" => {} // classification is resolved by the store before this
                "CallSign" => self.callsign = Some(value),
                "Pilot" => self.pilot = Some(value),
                "Name" => self.name = Some(value),
                "Group" => self.group = Some(value),
                "Coalition" => self.coalition = Some(value),
                "Color" => {
                    self.color_rgba = rgba_from_color( &value);
                    self.color = Some(value);
                }
                "LockedTarget" => self.locked_target = Some(value),
                "CAS" => set_num( &mut self.cas, &value),
                "Mach" => set_num( &mut self.mach, &value),
                "Health" => set_num( &mut self.health, &value),
                "FuelWeight" => set_num( &mut self.fuel_weight, &value),
                _ => {
                    if !value.is_empty() {
                        self.extras.insert( key, PropValue::of( &value));
                    }
                }
            }
        }
    }

    /// record a raw position report and refresh the finite differenced velocity.
    /// Near-duplicate fixes replace the previous one so the ringbuffer does not fill
    /// up with (almost) identical points and velocity stays numerically stable
    fn push_fix (&mut self, fix: PosFix, config: &TrackConfig) {
        let min_interval = config.min_trace_interval.as_secs_f64();

        if let Some(last) = self.trace.back() {
            let dt = fix.time.elapsed_since( last.time);
            if dt < min_interval {
                self.trace.pop_back();
            }
        }

        if let Some(prev) = self.trace.back() {
            let dt = fix.time.elapsed_since( prev.time);
            if dt > 0.0 {
                self.velocity = Some( NativeVel {
                    vu: (fix.pos.u - prev.pos.u) / dt,
                    vv: (fix.pos.v - prev.pos.v) / dt,
                    valt: (fix.pos.alt - prev.pos.alt) / dt,
                });
            }
        }

        self.pos = fix.pos;
        self.trace.push_to_ringbuffer( fix);
    }

    pub fn last_fix (&self)->Option<&PosFix> { self.trace.back() }

    /// dead reckoned position for `at > last_seen`, linear from the velocity estimate.
    /// Extrapolation freezes at the horizon - straight line continuation of maneuvering
    /// objects becomes implausible quickly
    pub fn extrapolated_pos (&self, at: SimTime, horizon: Duration)->NativePos {
        let Some(vel) = self.velocity else { return self.pos };

        let dt = at.elapsed_since( self.last_seen);
        if dt <= 0.0 { return self.pos }

        let dt = dt.min( horizon.as_secs_f64());
        NativePos {
            u: self.pos.u + vel.vu * dt,
            v: self.pos.v + vel.vv * dt,
            alt: self.pos.alt + vel.valt * dt,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Entity( id: {}, kind: {:?}", self.id, self.kind);
        if self.status == EntityStatus::Stale { write!( f, " (stale)"); }
        write!( f, ", name: \"{}\", pos: {}", self.display_name(), self.pos);
        if let Some(hdg) = self.heading { write!( f, ", hdg: {:.0}", hdg.degrees()); }
        if let Some(v) = self.velocity { write!( f, ", spd: {:.1}m/s", v.ground_speed()); }
        write!( f, ", time: {})", self.last_seen)
    }
}

fn set_num (field: &mut Option<f64>, value: &str) {
    // empty or unparseable numerics are "no update", not zero
    if let Ok(n) = value.trim().parse::<f64>() {
        if n.is_finite() { *field = Some(n) }
    }
}

/* #endregion entity model */

/* #region store *************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone)]
pub struct TrackConfig {
    pub staleness_after: Duration,       // Active -> Stale without updates
    pub remove_after: Duration,          // Active/Stale -> purged without updates
    pub extrapolation_horizon: Duration, // dead reckoning freezes past this
    pub min_trace_interval: Duration,    // near-duplicate fix replacement window
    pub max_trace: usize,                // trace ringbuffer length
    pub queue_capacity: usize,           // update queue bound (see pump)
}

impl Default for TrackConfig {
    fn default()->Self {
        TrackConfig {
            staleness_after: secs(5),
            remove_after: secs(30),
            extrapolation_horizon: secs(4),
            min_trace_interval: millis(500),
            max_trace: 8,
            queue_capacity: 4096,
        }
    }
}

/// store diagnostics - monotonically increasing, exposed through snapshots
#[derive(Serialize,Debug,Clone,Copy,Default,PartialEq)]
pub struct StoreCounters {
    pub applied: u64,       // records that mutated the store
    pub out_of_order: u64,  // per-object timestamp regressions, dropped
    pub id_conflicts: u64,  // id reused with an incompatible type, newest won
    pub removed: u64,       // explicit removal records
    pub timed_out: u64,     // entities purged by the removal timeout
}

impl fmt::Display for StoreCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "StoreCounters( applied: {}, out_of_order: {}, id_conflicts: {}, removed: {}, timed_out: {})",
            self.applied, self.out_of_order, self.id_conflicts, self.removed, self.timed_out)
    }
}

/// the authoritative entity state store. All mutation is serialized through `apply` and
/// `advance`, called from the single render/update context
pub struct EntityStore {
    config: TrackConfig,

    time: SimTime, // high water mark of stream time
    reference_time: Option<DateTime<Utc>>,
    globals: HashMap<String,String>,

    entities: HashMap<String,Entity>,

    bullseye: Option<NativePos>,
    bullseye_ids: HashSet<String>, // stream objects diverted to the bullseye slot

    annotations: Arc<Vec<MapAnnotation>>,
    annotation_gen: u64,

    counters: StoreCounters,
}

impl EntityStore {
    pub fn new (config: TrackConfig)->Self {
        EntityStore {
            config,
            time: SimTime::ZERO,
            reference_time: None,
            globals: HashMap::new(),
            entities: HashMap::new(),
            bullseye: None,
            bullseye_ids: HashSet::new(),
            annotations: Arc::new( Vec::new()),
            annotation_gen: 0,
            counters: StoreCounters::default(),
        }
    }

    pub fn config (&self)->&TrackConfig { &self.config }
    pub fn time (&self)->SimTime { self.time }
    pub fn reference_time (&self)->Option<DateTime<Utc>> { self.reference_time }
    pub fn counters (&self)->StoreCounters { self.counters }
    pub fn len (&self)->usize { self.entities.len() }
    pub fn is_empty (&self)->bool { self.entities.is_empty() }
    pub fn get (&self, id: &str)->Option<&Entity> { self.entities.get(id) }
    pub fn bullseye (&self)->Option<NativePos> { self.bullseye }
    pub fn global (&self, key: &str)->Option<&str> { self.globals.get(key).map(|s| s.as_str()) }

    /// apply one decoded stream record. This never fails on stream input - malformed
    /// or conflicting records are resolved by counting and trusting the newest data
    pub fn apply (&mut self, rec: AcmiRecord) {
        match rec.data {
            AcmiData::TimeMarker => {
                if rec.time > self.time { self.time = rec.time }
            }

            AcmiData::Global{props} => {
                for (key,value) in props {
                    if key == "ReferenceTime" {
                        match parse_reference_time( &value) {
                            Ok(dt) => self.reference_time = Some(dt),
                            Err(e) => debug!("unparseable ReferenceTime {:?}: {}", value, e),
                        }
                    }
                    self.globals.insert( key, value);
                }
                self.counters.applied += 1;
            }

            AcmiData::Remove{id} => {
                if self.entities.remove( &id).is_some() {
                    self.counters.applied += 1;
                    self.counters.removed += 1;
                } else if self.bullseye_ids.contains( &id) {
                    self.bullseye_ids.remove( &id); // the bullseye annotation itself persists
                } else {
                    debug!("removal of unknown object {}", id);
                }
            }

            AcmiData::Update{id, transform, props} => {
                self.apply_update( rec.time, id, transform, props);
            }
        }
    }

    fn apply_update (&mut self, time: SimTime, id: String, transform: Option<Transform>, props: Vec<(String,String)>) {
        let type_field = props.iter()
            .find( |(k,_)| k == "Type")
            .map( |(_,v)| v.clone());

        // bullseye objects have no telemetry lifecycle, divert them to the bullseye slot
        if self.bullseye_ids.contains( id.as_str())
            || type_field.as_deref().map( is_bullseye_type).unwrap_or(false)
        {
            self.update_bullseye( id, transform);
            self.counters.applied += 1;
            return
        }

        match self.entities.entry( id) {
            Entry::Occupied(mut oe) => {
                let e = oe.get_mut();
                if !time.is_after( e.last_seen) {
                    self.counters.out_of_order += 1; // stale or duplicate report, not an error
                    return
                }

                if let Some(tf) = &type_field {
                    let kind = classify_type( tf);
                    if kind != EntityKind::Unknown {
                        if e.kind != EntityKind::Unknown && e.kind != kind {
                            // trust the most recent record
                            self.counters.id_conflicts += 1;
                            warn!("object {} reclassified {:?} -> {:?}", e.id, e.kind, kind);
                        }
                        e.kind = kind;
                    }
                    e.type_field = Some( tf.clone());
                }

                e.update( time, transform, props, &self.config);
                self.counters.applied += 1;
            }

            Entry::Vacant(ve) => {
                // first record for this id is the creation (Unseen -> Active). A reused
                // id gets a fresh creation time and trace - it is a new logical entity
                let mut e = Entity::new( ve.key().clone(), time, self.config.max_trace);
                if let Some(tf) = &type_field {
                    e.kind = classify_type( tf);
                    e.type_field = Some( tf.clone());
                }
                e.update( time, transform, props, &self.config);
                ve.insert( e);
                self.counters.applied += 1;
            }
        }
    }

    fn update_bullseye (&mut self, id: String, transform: Option<Transform>) {
        if let Some(t) = transform {
            if t.has_planar_position() {
                let prev = self.bullseye.unwrap_or_default();
                let pos = Some( NativePos::new( t.u.unwrap(), t.v.unwrap(), t.alt.unwrap_or( prev.alt)));
                if pos != self.bullseye {
                    self.bullseye = pos;
                    self.annotation_gen += 1; // invalidates cached annotation geometry
                }
            }
        }
        self.bullseye_ids.insert( id);
    }

    /// per frame lifecycle sweep: age entities into Stale and purge the ones past the
    /// removal timeout. Called once per frame boundary so the transition cost is bound
    /// by entity count, not update volume
    pub fn advance (&mut self, now: SimTime) {
        if now > self.time { self.time = now }

        let stale_after = self.config.staleness_after.as_secs_f64();
        let remove_after = self.config.remove_after.as_secs_f64();
        let counters = &mut self.counters;

        self.entities.retain( |_id, e| {
            let age = now.elapsed_since( e.last_seen);
            if age > remove_after {
                counters.timed_out += 1;
                false
            } else {
                e.status = if age > stale_after { EntityStatus::Stale } else { EntityStatus::Active };
                true
            }
        });
    }

    /// immutable point-in-time view of all non-removed entities and annotations.
    /// This is the only thing the rest of the pipeline reads and it does not change
    /// while held - the store stays free to mutate between frames
    pub fn snapshot (&self)->StoreSnapshot {
        let mut entities: Vec<Entity> = self.entities.values().cloned().collect();
        entities.sort_by( |a,b| a.id.cmp( &b.id));

        StoreSnapshot {
            time: self.time,
            reference_time: self.reference_time,
            entities,
            bullseye: self.bullseye,
            annotations: self.annotations.clone(),
            annotation_gen: self.annotation_gen,
            counters: self.counters,
        }
    }

    /// dead reckoned position of a tracked entity, capped at the configured horizon
    pub fn extrapolate (&self, id: &str, at: SimTime)->Option<NativePos> {
        self.entities.get( id).map( |e| e.extrapolated_pos( at, self.config.extrapolation_horizon))
    }

    //--- the operator/import mutations (not driven by the telemetry stream)

    /// one-shot import of the static annotation set (pre-planned threats, reference
    /// lines). Replaces previous annotations; Bullseye entries set the bullseye slot
    pub fn import_annotations (&mut self, set: AnnotationSet) {
        let mut annotations = Vec::with_capacity( set.annotations.len());
        for a in set.annotations {
            if let MapAnnotation::Bullseye{u,v} = a {
                self.bullseye = Some( NativePos::new( u, v, 0.0));
            } else {
                annotations.push(a);
            }
        }
        self.annotations = Arc::new( annotations);
        self.annotation_gen += 1;
    }

    /// explicit operator override of the authoritative bullseye
    pub fn set_bullseye (&mut self, pos: NativePos) {
        self.bullseye = Some(pos);
        self.annotation_gen += 1;
    }
}

/// the by-value render data handed to the consumer side each frame
#[derive(Serialize,Debug,Clone)]
pub struct StoreSnapshot {
    pub time: SimTime,
    pub reference_time: Option<DateTime<Utc>>,
    pub entities: Vec<Entity>,
    pub bullseye: Option<NativePos>,
    pub annotations: Arc<Vec<MapAnnotation>>,
    pub annotation_gen: u64,
    pub counters: StoreCounters,
}

impl StoreSnapshot {
    pub fn get (&self, id: &str)->Option<&Entity> {
        self.entities.iter().find( |e| e.id.as_str() == id)
    }

    pub fn to_json (&self)->errors::Result<String> {
        Ok( serde_json::to_string( self)?)
    }
}

/* #endregion store */
