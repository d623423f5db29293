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

use chrono::{DateTime, Utc};
use serde::{Serialize,Deserialize};
use std::time::Duration;
use std::fmt;
use std::ops;

/// seconds since the mission reference time, as reported by the telemetry stream.
/// This is sim clock, not wall clock - it only advances with stream time markers
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn new (secs: f64)->Self { SimTime(secs) }

    pub fn secs (&self)->f64 { self.0 }

    /// seconds elapsed since `earlier` (negative if `earlier` is in the future)
    pub fn elapsed_since (&self, earlier: SimTime)->f64 { self.0 - earlier.0 }

    pub fn is_after (&self, other: SimTime)->bool { self.0 > other.0 }

    /// map to an absolute timestamp given the mission reference time
    pub fn to_utc (&self, reference_time: DateTime<Utc>)->DateTime<Utc> {
        reference_time + chrono::TimeDelta::milliseconds( (self.0 * 1000.0) as i64)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl ops::Add<Duration> for SimTime {
    type Output = Self;
    fn add (self, rhs: Duration)->Self::Output { SimTime( self.0 + rhs.as_secs_f64()) }
}

impl ops::Sub<Duration> for SimTime {
    type Output = Self;
    fn sub (self, rhs: Duration)->Self::Output { SimTime( self.0 - rhs.as_secs_f64()) }
}

// the Duration ctor shorthands we use in configs and tests
#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }
#[inline] pub fn secs_f64 (n: f64)->Duration { Duration::from_secs_f64(n) }

/// parse the ACMI `ReferenceTime` global property (ISO-8601, e.g. "2011-06-02T05:00:00Z")
pub fn parse_reference_time (s: &str)->Result<DateTime<Utc>, chrono::ParseError> {
    Ok( DateTime::parse_from_rfc3339(s)?.with_timezone( &Utc))
}
