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

/// the tactical geometry derived from store snapshots: BRAA readouts, bullseye relative
/// positions and annotation shapes. All functions here are total - degenerate input
/// (zero range, no authoritative bullseye) yields a defined value or an absent Option,
/// never an error the renderer would have to handle

use std::fmt;
use uom::si::f64::Length;
use uom::si::length::{foot, kilometer, meter, nautical_mile};
use radar_common::angle::Angle360;
use crate::{Entity, NativePos, StoreSnapshot};
use crate::annotations::MapAnnotation;
use crate::theater::{AltitudeUnit, RangeUnit, RenderPos, TheaterTransform};

/* #region BRAA **************************************************************************************/

/// the standard readout of a contact relative to a reference point
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Braa {
    pub bearing: Angle360,
    pub range: Length,
    pub altitude: Length,
}

impl Braa {
    /// render in the configured display units, e.g. "045/12 25000ft"
    pub fn format (&self, range_unit: RangeUnit, altitude_unit: AltitudeUnit)->String {
        let range = match range_unit {
            RangeUnit::NauticalMiles => self.range.get::<nautical_mile>(),
            RangeUnit::Kilometers => self.range.get::<kilometer>(),
        };
        let (alt,alt_suffix) = match altitude_unit {
            AltitudeUnit::Feet => (self.altitude.get::<foot>(), "ft"),
            AltitudeUnit::Meters => (self.altitude.get::<meter>(), "m"),
        };
        format!("{:03.0}/{:.0} {:.0}{}", self.bearing.degrees(), range, alt, alt_suffix)
    }
}

impl fmt::Display for Braa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03.0}/{:.0} {:.0}ft",
            self.bearing.degrees(), self.range.get::<nautical_mile>(), self.altitude.get::<foot>())
    }
}

/// bearing/range/altitude of `target` as seen from `reference` (both in render plane
/// coordinates). reference == target yields bearing 0 / range 0, never NaN
pub fn braa_between (tf: &TheaterTransform, reference: &RenderPos, target: &RenderPos)->Braa {
    Braa {
        bearing: tf.compass_bearing( reference, target),
        range: Length::new::<meter>( tf.range_meters( reference, target)),
        altitude: Length::new::<meter>( target.alt),
    }
}

/// the bullseye relative position of `target`, recomputed every frame since bullseye
/// and target both move. Absent (not zero) while no bullseye is authoritative
pub fn bullseye_braa (tf: &TheaterTransform, snapshot: &StoreSnapshot, target: &RenderPos)->Option<Braa> {
    snapshot.bullseye.map( |be| braa_between( tf, &tf.to_render( &be), target))
}

/// end points of the velocity leader line of an entity: its current render position
/// continued `seconds` along the velocity estimate. None without a velocity estimate
pub fn velocity_leader (tf: &TheaterTransform, e: &Entity, seconds: f64)->Option<[RenderPos;2]> {
    e.velocity.map( |vel| {
        let p1 = NativePos::new(
            e.pos.u + vel.vu * seconds,
            e.pos.v + vel.vv * seconds,
            e.pos.alt,
        );
        [ tf.to_render( &e.pos), tf.to_render( &p1) ]
    })
}

/* #endregion BRAA */

/* #region annotation shapes *************************************************************************/

pub const RING_SEGMENTS: usize = 72;

/// a render plane polyline (closed rings for threat circles)
#[derive(Debug,Clone,PartialEq)]
pub struct Polyline {
    pub label: Option<String>,
    pub points: Vec<[f64;2]>,
    pub closed: bool,
}

/// tessellated annotation geometry. Annotations are far less volatile than tracked
/// entities, so shapes are cached and only recomputed when the annotation set or the
/// theater transform changed
pub struct AnnotationShapes {
    key: Option<(u64,TheaterTransform)>,
    pub rings: Vec<Polyline>,
    pub lines: Vec<Polyline>,
}

impl AnnotationShapes {
    pub fn new ()->Self {
        AnnotationShapes { key: None, rings: Vec::new(), lines: Vec::new() }
    }

    /// refresh from a snapshot, returns true if the shapes were recomputed
    pub fn refresh (&mut self, snapshot: &StoreSnapshot, tf: &TheaterTransform)->bool {
        let key = (snapshot.annotation_gen, *tf);
        if self.key == Some(key) { return false }

        self.rings.clear();
        self.lines.clear();

        for a in snapshot.annotations.iter() {
            match a {
                MapAnnotation::ThreatRing{label,u,v,radius_m} => {
                    self.rings.push( tessellate_ring( tf, *u, *v, *radius_m, label));
                }
                MapAnnotation::ReferenceLine{label,points} => {
                    let points = points.iter()
                        .map( |(u,v)| { let p = tf.to_render( &NativePos::new(*u,*v,0.0)); [p.x, p.y] })
                        .collect();
                    self.lines.push( Polyline{ label: Some(label.clone()), points, closed: false });
                }
                MapAnnotation::Bullseye{..} => {} // lives in the snapshot bullseye slot
            }
        }

        self.key = Some(key);
        true
    }
}

fn tessellate_ring (tf: &TheaterTransform, u: f64, v: f64, radius_m: f64, label: &str)->Polyline {
    let mut points = Vec::with_capacity( RING_SEGMENTS);
    for i in 0..RING_SEGMENTS {
        let phi = (i as f64) * std::f64::consts::TAU / (RING_SEGMENTS as f64);
        let p = tf.to_render( &NativePos::new( u + radius_m * phi.cos(), v + radius_m * phi.sin(), 0.0));
        points.push( [p.x, p.y]);
    }
    Polyline{ label: Some(label.to_string()), points, closed: true }
}

/* #endregion annotation shapes */
