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

/// the hand-off boundary between the always-running network context and the fixed
/// cadence render loop: a bounded, mutex guarded ring queue with concurrent append and
/// a single non-blocking bulk drain per frame. If the consumer falls behind, the oldest
/// records are dropped - the store only cares about current state, recency beats
/// completeness of history

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, atomic::{AtomicU64,Ordering}};
use std::time::Instant;
use radar_common::datetime::{SimTime, secs_f64};
use radar_acmi::{AcmiRecord, RecordSink};
use crate::EntityStore;

/// the shared queue handle. Cloning yields another handle to the same queue
#[derive(Clone)]
pub struct UpdateQueue {
    queue: Arc<Mutex<VecDeque<AcmiRecord>>>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl UpdateQueue {
    pub fn new (capacity: usize)->Self {
        UpdateQueue {
            queue: Arc::new( Mutex::new( VecDeque::with_capacity( capacity))),
            capacity,
            dropped: Arc::new( AtomicU64::new(0)),
        }
    }

    /// append from the network context. Never blocks on a slow consumer - a full queue
    /// evicts the oldest unapplied record, counted as overflow drop
    pub fn push (&self, rec: AcmiRecord) {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add( 1, Ordering::Relaxed);
        }
        queue.push_back( rec);
    }

    /// non-blocking bulk drain for the consumer side. The lock is held only for the
    /// swap, records are processed outside of it
    pub fn drain (&self)->VecDeque<AcmiRecord> {
        let mut queue = self.queue.lock().unwrap();
        std::mem::replace( &mut *queue, VecDeque::with_capacity( self.capacity))
    }

    pub fn len (&self)->usize { self.queue.lock().unwrap().len() }

    /// monotonically increasing overflow drop count
    pub fn dropped (&self)->u64 { self.dropped.load(Ordering::Relaxed) }
}

impl RecordSink for UpdateQueue {
    fn push (&self, rec: AcmiRecord) {
        UpdateQueue::push( self, rec);
    }
}

/// per frame result of the synchronizer
#[derive(Debug,Clone,Copy)]
pub struct FrameStats {
    pub applied: usize, // records drained and applied this frame
    pub now: SimTime,   // the time the store was advanced to
}

/// drives the frame boundary: drain the whole queue, apply every record, then run the
/// lifecycle sweep - all before any geometry/render computation of the frame, so the
/// store is never observed mid-mutation.
///
/// Stream time only advances with time markers; so that entities still age out when
/// the link drops, the sweep time is the last marker projected forward by wall clock
pub struct FrameSync {
    queue: UpdateQueue,
    anchor_sim: SimTime,
    anchor_wall: Option<Instant>,
}

impl FrameSync {
    pub fn new (queue: UpdateQueue)->Self {
        FrameSync { queue, anchor_sim: SimTime::ZERO, anchor_wall: None }
    }

    pub fn queue (&self)->&UpdateQueue { &self.queue }

    /// the record sink to hand to the network context
    pub fn sink (&self)->Arc<UpdateQueue> { Arc::new( self.queue.clone()) }

    /// to be called once at the start of each frame's event processing phase
    pub fn run_frame (&mut self, store: &mut EntityStore)->FrameStats {
        let drained = self.queue.drain();
        let applied = drained.len();

        let mut stream_time = self.anchor_sim;
        for rec in drained {
            if rec.time > stream_time { stream_time = rec.time }
            store.apply( rec);
        }

        // re-anchor whenever the stream delivered a newer timestamp, project by wall
        // clock in between (and across link drops)
        if self.anchor_wall.is_none() || stream_time > self.anchor_sim {
            self.anchor_sim = stream_time;
            self.anchor_wall = Some( Instant::now());
        }
        let elapsed = self.anchor_wall.map( |w| w.elapsed().as_secs_f64()).unwrap_or(0.0);
        let now = self.anchor_sim + secs_f64( elapsed);

        store.advance( now);
        FrameStats{ applied, now }
    }
}
