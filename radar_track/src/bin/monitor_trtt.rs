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

//! live monitor for a Tacview real time telemetry stream: connects, runs the same
//! drain/advance frame cycle a radar display would, and periodically prints the
//! tracked picture with bullseye BRAA readouts.
//!
//!   monitor_trtt --url localhost:42674 --theater radar_track/configs/theater_korea.ron

use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use clap::Parser;
use radar_common::config::load_config_path;
use radar_acmi::{IngestCounters, RecordSink};
use radar_acmi::trtt::{AcmiConnector, TrttClient, TrttConfig};
use radar_track::{EntityStatus, EntityStore, TrackConfig};
use radar_track::annotations::load_annotations;
use radar_track::geometry::{bullseye_braa, AnnotationShapes};
use radar_track::pump::{FrameSync, UpdateQueue};
use radar_track::theater::{TheaterConfig, TheaterTransform};

#[derive(Parser)]
#[command(about = "monitor a Tacview real time telemetry stream")]
struct Args {
    /// telemetry server (host:port), overrides the trtt config file
    #[arg(long)]
    url: Option<String>,

    /// TrttConfig RON file
    #[arg(long)]
    trtt: Option<String>,

    /// TrackConfig RON file
    #[arg(long)]
    track: Option<String>,

    /// TheaterConfig RON file
    #[arg(long)]
    theater: Option<String>,

    /// AnnotationSet RON file to import at startup
    #[arg(long)]
    annotations: Option<String>,

    /// frame period in milliseconds
    #[arg(long, default_value_t = 100)]
    frame_millis: u64,

    /// print the picture every n-th frame
    #[arg(long, default_value_t = 10)]
    report_every: u64,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut trtt_config: TrttConfig = match &args.trtt {
        Some(path) => load_config_path( path)?,
        None => TrttConfig::default(),
    };
    if let Some(url) = &args.url { trtt_config.url = url.clone() }

    let track_config: TrackConfig = match &args.track {
        Some(path) => load_config_path( path)?,
        None => TrackConfig::default(),
    };
    let theater_config: TheaterConfig = match &args.theater {
        Some(path) => load_config_path( path)?,
        None => TheaterConfig::default(),
    };
    let tf = TheaterTransform::new( &theater_config);

    let mut store = EntityStore::new( track_config.clone());
    if let Some(path) = &args.annotations {
        store.import_annotations( load_annotations( path)?);
    }

    let queue = UpdateQueue::new( track_config.queue_capacity);
    let mut sync = FrameSync::new( queue.clone());
    let mut shapes = AnnotationShapes::new();

    let counters = IngestCounters::new();
    let sink: Arc<dyn RecordSink> = sync.sink();
    let mut client = TrttClient::new( Arc::new(trtt_config), sink, counters.clone());
    client.start().await?;

    let frame_period = Duration::from_millis( args.frame_millis);
    let mut frame: u64 = 0;

    loop {
        let stats = sync.run_frame( &mut store);
        frame += 1;

        if frame % args.report_every == 0 {
            let snapshot = store.snapshot();
            shapes.refresh( &snapshot, &tf);

            println!("------------------ frame {} at {} ({} applied, {} tracked, {} queue drops)",
                frame, stats.now, stats.applied, snapshot.entities.len(), queue.dropped());

            for e in &snapshot.entities {
                let pos = e.extrapolated_pos( stats.now, track_config.extrapolation_horizon);
                let stale = if e.status == EntityStatus::Stale { " STALE" } else { "" };
                match bullseye_braa( &tf, &snapshot, &tf.to_render( &pos)) {
                    Some(braa) => println!("{:>10} {:<12} {:<16} be {}{}",
                        e.id, e.kind.display_name(), e.display_name(),
                        braa.format( tf.range_unit, tf.altitude_unit), stale),
                    None => println!("{:>10} {:<12} {:<16} {}{}",
                        e.id, e.kind.display_name(), e.display_name(), pos, stale),
                }
            }

            println!("{}", counters);
            println!("{}", snapshot.counters);
        }

        std::thread::sleep( frame_period);
    }
}
