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

/// the theater reference frame: a pure, invertible affine map between native flat world
/// coordinates (meters east/north of the theater origin corner) and the render plane.
/// Re-configuring the theater (switching maps) replaces the transform wholesale - it is
/// Copy and never mutated in place, so geometry computed from a prior frame stays
/// internally consistent

use serde::{Serialize,Deserialize};
use radar_common::angle::Angle360;
use crate::NativePos;

/// display unit for ranges
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub enum RangeUnit {
    #[default]
    NauticalMiles,
    Kilometers,
}

/// display unit for altitudes
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub enum AltitudeUnit {
    #[default]
    Feet,
    Meters,
}

#[derive(Serialize,Deserialize,Debug,Clone)]
pub struct TheaterConfig {
    pub name: String,
    pub size_km: f64,           // edge length of the square flat world (BMS: 1024)

    #[serde(default)]
    pub origin_u: f64,          // native meters mapped to render plane (0,0)
    #[serde(default)]
    pub origin_v: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,             // render units per native meter
    #[serde(default)]
    pub rotation: f64,          // clockwise render plane rotation, degrees
    #[serde(default)]
    pub north_offset: f64,      // compass correction for theaters where grid north != true north

    #[serde(default)]
    pub range_unit: RangeUnit,
    #[serde(default)]
    pub altitude_unit: AltitudeUnit,
}

fn default_scale()->f64 { 1.0 }

impl Default for TheaterConfig {
    fn default()->Self {
        TheaterConfig {
            name: "default".to_string(),
            size_km: 1024.0,
            origin_u: 0.0,
            origin_v: 0.0,
            scale: 1.0,
            rotation: 0.0,
            north_offset: 0.0,
            range_unit: RangeUnit::default(),
            altitude_unit: AltitudeUnit::default(),
        }
    }
}

/// a point on the render plane (x right, y up in render units) plus altitude in meters.
/// Altitude passes through the planar transform untouched
#[derive(Serialize,Debug,Clone,Copy,PartialEq,Default)]
pub struct RenderPos {
    pub x: f64,
    pub y: f64,
    pub alt: f64,
}

impl RenderPos {
    pub fn new (x: f64, y: f64, alt: f64)->Self { RenderPos{x,y,alt} }
}

/// the derived transform. All operations are pure and deterministic; points outside the
/// theater bounds are transformed like any other (off-map contacts are valid)
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct TheaterTransform {
    origin_u: f64,
    origin_v: f64,
    scale: f64,
    rot_sin: f64,
    rot_cos: f64,
    rotation: f64,
    north_offset: f64,
    size_m: f64,
    pub range_unit: RangeUnit,
    pub altitude_unit: AltitudeUnit,
}

impl TheaterTransform {
    pub fn new (config: &TheaterConfig)->Self {
        let rot = config.rotation.to_radians();
        TheaterTransform {
            origin_u: config.origin_u,
            origin_v: config.origin_v,
            scale: config.scale,
            rot_sin: rot.sin(),
            rot_cos: rot.cos(),
            rotation: config.rotation,
            north_offset: config.north_offset,
            size_m: config.size_km * 1000.0,
            range_unit: config.range_unit,
            altitude_unit: config.altitude_unit,
        }
    }

    pub fn scale (&self)->f64 { self.scale }
    pub fn size_m (&self)->f64 { self.size_m }

    pub fn to_render (&self, p: &NativePos)->RenderPos {
        let du = p.u - self.origin_u;
        let dv = p.v - self.origin_v;
        RenderPos {
            x: (du * self.rot_cos + dv * self.rot_sin) * self.scale,
            y: (dv * self.rot_cos - du * self.rot_sin) * self.scale,
            alt: p.alt,
        }
    }

    pub fn to_native (&self, p: &RenderPos)->NativePos {
        let x = p.x / self.scale;
        let y = p.y / self.scale;
        NativePos {
            u: self.origin_u + x * self.rot_cos - y * self.rot_sin,
            v: self.origin_v + x * self.rot_sin + y * self.rot_cos,
            alt: p.alt,
        }
    }

    /// compass bearing from one render plane point to another, relative to the
    /// configured theater north (not the render plane vertical axis)
    pub fn compass_bearing (&self, from: &RenderPos, to: &RenderPos)->Angle360 {
        Angle360::from_planar( to.x - from.x, to.y - from.y)
            + Angle360::from_degrees( self.north_offset - self.rotation)
    }

    /// planar distance between two render plane points, in native meters
    pub fn range_meters (&self, from: &RenderPos, to: &RenderPos)->f64 {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        (dx*dx + dy*dy).sqrt() / self.scale
    }

    pub fn contains_native (&self, p: &NativePos)->bool {
        p.u >= 0.0 && p.u <= self.size_m && p.v >= 0.0 && p.v <= self.size_m
    }
}
