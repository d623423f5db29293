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

use std::collections::VecDeque;

/// trait to use a VecDeque as a ringbuffer of bounded size - pushing to a full
/// ringbuffer evicts the oldest element.
/// Note the bound is the initial capacity, i.e. the VecDeque has to be created
/// through `RingDeque::new` and must not be grown explicitly afterwards
pub trait RingDeque<T> {
    fn new (max_len: usize)->Self;
    fn push_to_ringbuffer (&mut self, t: T)->Option<T>;
}

impl<T> RingDeque<T> for VecDeque<T> {
    fn new (max_len: usize)->Self {
        VecDeque::with_capacity(max_len)
    }

    /// push a new element to the end, returning the evicted element if the ringbuffer was full
    #[inline]
    fn push_to_ringbuffer (&mut self, t: T)->Option<T> {
        let evicted = if self.len() == self.capacity() { self.pop_front() } else { None };
        self.push_back(t);
        evicted
    }
}
