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

//! tool to host a recorded .acmi/.txt file as a Tacview Real Time Telemetry stream,
//! paced by its time markers. Useful to develop/test against a canned mission without
//! a running simulator:
//!
//!   serve_acmi recordings/mission.acmi --multiplier 32

use std::fs;
use std::io::{Read,Write};
use std::net::{TcpListener,TcpStream};
use std::time::Duration;
use anyhow::{anyhow,Result};
use clap::Parser;
use radar_acmi::trtt::{STREAM_PROTOCOL,TELEMETRY_PROTOCOL};
use radar_common::info;

#[derive(Parser)]
#[command(about = "host a recorded ACMI file as a Tacview real time telemetry stream")]
struct Args {
    /// the .acmi/.txt recording to serve
    path: String,

    /// address to listen on
    #[arg(long, default_value = "127.0.0.1:42674")]
    addr: String,

    /// replay speed multiplier
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,

    /// host name to report in the handshake
    #[arg(long, default_value = "serve_acmi")]
    name: String,
}

fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let data = fs::read_to_string( &args.path)?;
    let lines: Vec<&str> = data.lines().collect();
    info!("serving {} lines from {} on {}", lines.len(), args.path, args.addr);

    let listener = TcpListener::bind( args.addr.as_str())?;
    loop {
        let (stream, addr) = listener.accept()?;
        info!("client connected from {}", addr);
        match serve_client( stream, &lines, &args) {
            Ok(()) => info!("replay finished"),
            Err(e) => info!("client dropped: {}", e),
        }
    }
}

fn serve_client (mut stream: TcpStream, lines: &[&str], args: &Args)->Result<()> {
    let handshake = format!("{}\n{}\nHost {}\n\0", STREAM_PROTOCOL, TELEMETRY_PROTOCOL, args.name);
    stream.write_all( handshake.as_bytes())?;
    read_client_handshake( &mut stream)?;

    let mut last_time: Option<f64> = None;
    for line in lines {
        if let Some(rest) = line.strip_prefix('#') {
            if let Ok(t) = rest.trim().parse::<f64>() {
                if let Some(t0) = last_time {
                    let dt = (t - t0).max(0.0) / args.multiplier;
                    std::thread::sleep( Duration::from_secs_f64( dt));
                }
                last_time = Some(t);
            }
        }
        stream.write_all( line.as_bytes())?;
        stream.write_all( b"\n")?;
    }

    Ok(())
}

fn read_client_handshake (stream: &mut TcpStream)->Result<()> {
    let mut received: Vec<u8> = Vec::with_capacity(128);
    let mut buf = [0u8; 256];
    loop {
        let n = stream.read( &mut buf)?;
        if n == 0 { return Err( anyhow!("client closed connection during handshake")) }
        received.extend_from_slice( &buf[..n]);
        if received.contains( &0u8) { return Ok(()) }
        if received.len() > 4096 { return Err( anyhow!("oversized client handshake")) }
    }
}
