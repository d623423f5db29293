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

/// static map annotations: pre-planned threat rings, reference lines and the bullseye.
/// These share the positional machinery of tracked entities but have no telemetry
/// lifecycle - they are imported once from configuration and only mutated by explicit
/// operator action, never by the stream

use std::path::Path;
use serde::{Serialize,Deserialize};
use radar_common::config::load_config_path;
use crate::errors::Result;

/// all positions in native flat world meters
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub enum MapAnnotation {
    /// circle around a pre-planned threat (SAM ring etc.)
    ThreatRing { label: String, u: f64, v: f64, radius_m: f64 },

    /// open polyline (steerpoint lines, FLOT and the like)
    ReferenceLine { label: String, points: Vec<(f64,f64)> },

    /// the tactical reference point. At most one is authoritative at a time
    Bullseye { u: f64, v: f64 },
}

/// the one-shot import format (RON)
#[derive(Serialize,Deserialize,Debug,Clone,Default)]
pub struct AnnotationSet {
    pub annotations: Vec<MapAnnotation>,
}

pub fn load_annotations<P> (path: P)->Result<AnnotationSet> where P: AsRef<Path> {
    Ok( load_config_path( path)?)
}
