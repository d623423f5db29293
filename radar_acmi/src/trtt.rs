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

/// the Tacview Real Time Telemetry (TRTT) socket client. The client owns the network
/// context: it connects, performs the handshake, reads raw chunks, feeds them through
/// an AcmiParser and pushes decoded records into a RecordSink. It never blocks the
/// consumer side - the sink is the only shared boundary.
///
/// handshake (both sides, NUL terminated):
///   XtraLib.Stream.0
///   Tacview.RealTimeTelemetry.0
///   Client <name>         (resp. Host <name> from the server)
///   <password>

use std::io::{Read,Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, atomic::{AtomicBool,Ordering}};
use std::thread::JoinHandle;
use std::time::Duration;
use serde::{Serialize,Deserialize};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt,AsyncWriteExt};
use radar_common::{warn,info,debug};
use radar_common::datetime::{millis,secs};
use crate::{AcmiRecord, IngestCounters, RecordSink};
use crate::parse::{AcmiParser, PreMarkerPolicy};
use crate::errors::{Result, RadarAcmiError, handshake_error};

pub const STREAM_PROTOCOL: &str = "XtraLib.Stream.0";
pub const TELEMETRY_PROTOCOL: &str = "Tacview.RealTimeTelemetry.0";

#[derive(Serialize,Deserialize,Debug,Clone)]
pub struct TrttConfig {
    pub url: String,                       // host:port of the telemetry server
    pub client_name: String,               // reported to the server in the handshake
    pub password: String,                  // empty for open servers
    pub connect_retries: usize,            // per (re)connect attempt sequence
    pub retry_interval: Duration,
    pub read_timeout: Duration,            // granularity at which the reader notices terminate()
    pub read_buffer_size: usize,
    pub pre_marker_policy: PreMarkerPolicy,
}

impl Default for TrttConfig {
    fn default()->Self {
        TrttConfig {
            url: "localhost:42674".to_string(),
            client_name: "radar".to_string(),
            password: String::new(),
            connect_retries: 5,
            retry_interval: secs(10),
            read_timeout: millis(500),
            read_buffer_size: 8192,
            pre_marker_policy: PreMarkerPolicy::Discard,
        }
    }
}

/// abstraction of a telemetry source that feeds a RecordSink, so that consumers do not
/// care whether records come from a live socket, a file replay or a test fixture
#[async_trait]
pub trait AcmiConnector {
    fn new (config: Arc<TrttConfig>, sink: Arc<dyn RecordSink>, counters: Arc<IngestCounters>)->Self;
    async fn start (&mut self)->Result<()>;
    fn terminate (&mut self);
}

/// blocking TRTT client running the stream on a native thread (the read can block for
/// extended amounts of time, which we don't want on an async worker)
pub struct TrttClient {
    config: Arc<TrttConfig>,
    sink: Arc<dyn RecordSink>,
    counters: Arc<IngestCounters>,
    server_name: Arc<Mutex<String>>,
    task: Option<JoinHandle<()>>,
    keep_alive: Arc<AtomicBool>, // used to signal the input thread to terminate
}

impl TrttClient {
    /// the name the server reported in its handshake, once connected
    pub fn server_name (&self)->String { self.server_name.lock().unwrap().clone() }
}

#[async_trait]
impl AcmiConnector for TrttClient {
    fn new (config: Arc<TrttConfig>, sink: Arc<dyn RecordSink>, counters: Arc<IngestCounters>)->Self {
        TrttClient {
            config, sink, counters,
            server_name: Arc::new( Mutex::new( String::new())),
            task: None,
            keep_alive: Arc::new( AtomicBool::new(true)),
        }
    }

    async fn start (&mut self)->Result<()> {
        let config = self.config.clone();
        let sink = self.sink.clone();
        let counters = self.counters.clone();
        let server_name = self.server_name.clone();
        let keep_alive = self.keep_alive.clone();
        keep_alive.store( true, Ordering::Relaxed);

        let join_handle = std::thread::Builder::new().name( "trtt-task".to_string()).spawn( move || {
            if let Err(e) = run_stream( config, sink, counters, server_name, keep_alive) {
                warn!("telemetry stream terminated: {}", e);
            }
        })?;
        self.task = Some(join_handle);

        Ok(())
    }

    fn terminate (&mut self) {
        if let Some(join_handle) = &self.task {
            self.keep_alive.store( false, Ordering::Relaxed); // reader checks within read_timeout
            self.task = None;
        }
    }
}

/// the connect / read / reconnect loop of the network context. A dropped link is not an
/// error of the stream - we reconnect with backoff and keep the parser stream time, the
/// downstream store ages out entities on its own
fn run_stream (config: Arc<TrttConfig>, sink: Arc<dyn RecordSink>, counters: Arc<IngestCounters>,
               server_name: Arc<Mutex<String>>, keep_alive: Arc<AtomicBool>)->Result<()>
{
    let mut parser = AcmiParser::new( config.pre_marker_policy, counters.clone());
    let mut is_reconnect = false;

    while keep_alive.load(Ordering::Relaxed) {
        let mut stream = connect_with_retries( &config, &keep_alive)?;

        let (name, leftover) = client_handshake( &mut stream, &config)?;
        info!("connected to telemetry server '{}' at {}", name, config.url);
        *server_name.lock().unwrap() = name;

        if is_reconnect {
            counters.inc_reconnects();
            parser.reset();
        }
        is_reconnect = true;

        let mut out: Vec<AcmiRecord> = Vec::with_capacity(256);
        if !leftover.is_empty() {
            parser.push_chunk( &leftover, &mut out); // bytes that trailed the handshake NUL
            drain_to_sink( &mut out, &sink);
        }

        stream.set_read_timeout( Some(config.read_timeout))?;
        let mut chunk = vec![0u8; config.read_buffer_size];

        loop {
            if !keep_alive.load(Ordering::Relaxed) { return Ok(()) }

            match stream.read( &mut chunk) {
                Ok(0) => {
                    debug!("telemetry server closed connection");
                    break // EOF -> reconnect
                }
                Ok(n) => {
                    parser.push_chunk( &chunk[..n], &mut out);
                    drain_to_sink( &mut out, &sink);
                }
                Err(e) if is_timeout(&e) => continue, // just re-check keep_alive
                Err(e) => {
                    debug!("telemetry read failed: {}", e);
                    break // -> reconnect
                }
            }
        }
    }

    Ok(())
}

#[inline]
fn drain_to_sink (out: &mut Vec<AcmiRecord>, sink: &Arc<dyn RecordSink>) {
    for rec in out.drain(..) {
        sink.push( rec);
    }
}

#[inline]
fn is_timeout (e: &std::io::Error)->bool {
    matches!( e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
}

fn connect_with_retries (config: &TrttConfig, keep_alive: &AtomicBool)->Result<TcpStream> {
    let mut retries = 0;
    loop {
        if !keep_alive.load(Ordering::Relaxed) {
            return Err( RadarAcmiError::OpFailedError("terminated while connecting".into()))
        }

        match TcpStream::connect( config.url.as_str()) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                retries += 1;
                if retries >= config.connect_retries {
                    return Err( e.into())
                }
                warn!("connection to {} failed ({}), retrying in {:?} [{}/{}]",
                      config.url, e, config.retry_interval, retries, config.connect_retries);
                std::thread::sleep( config.retry_interval);
            }
        }
    }
}

pub fn client_handshake_msg (config: &TrttConfig)->String {
    format!("{}\n{}\nClient {}\n{}\0", STREAM_PROTOCOL, TELEMETRY_PROTOCOL, config.client_name, config.password)
}

/// send our handshake, then read the server header up to its NUL terminator.
/// Returns the server name and whatever stream bytes trailed the terminator
fn client_handshake (stream: &mut TcpStream, config: &TrttConfig)->Result<(String,Vec<u8>)> {
    stream.write_all( client_handshake_msg( config).as_bytes())?;

    let mut received: Vec<u8> = Vec::with_capacity(128);
    let mut buf = [0u8; 256];
    loop {
        let n = stream.read( &mut buf)?;
        if n == 0 {
            return Err( handshake_error!("connection closed during handshake"))
        }
        received.extend_from_slice( &buf[..n]);

        if let Some(i) = memchr::memchr( 0u8, &received) {
            let header = String::from_utf8_lossy( &received[..i]).into_owned();
            let leftover = received.split_off(i+1);
            return Ok( (parse_server_header( &header)?, leftover))
        }
        if received.len() > 4096 {
            return Err( handshake_error!("oversized handshake header"))
        }
    }
}

pub fn parse_server_header (header: &str)->Result<String> {
    let mut lines = header.lines();
    if lines.next() != Some(STREAM_PROTOCOL) || lines.next() != Some(TELEMETRY_PROTOCOL) {
        return Err( handshake_error!("not a {} server: {:?}", TELEMETRY_PROTOCOL, header))
    }
    let name = lines.next().unwrap_or("").trim();
    Ok( name.strip_prefix("Host ").unwrap_or(name).to_string())
}

/// async single-connection variant for callers that already run a tokio runtime.
/// Re-connect policy is up to the caller here
pub async fn async_read_records (config: &TrttConfig, sink: Arc<dyn RecordSink>, counters: Arc<IngestCounters>)->Result<()> {
    let mut stream = tokio::net::TcpStream::connect( config.url.as_str()).await?;
    stream.write_all( client_handshake_msg( config).as_bytes()).await?;

    let mut parser = AcmiParser::new( config.pre_marker_policy, counters);
    let mut out: Vec<AcmiRecord> = Vec::with_capacity(256);

    //--- handshake
    let mut received: Vec<u8> = Vec::with_capacity(128);
    let mut buf = vec![0u8; config.read_buffer_size];
    loop {
        let n = stream.read( &mut buf).await?;
        if n == 0 { return Err( handshake_error!("connection closed during handshake")) }
        received.extend_from_slice( &buf[..n]);

        if let Some(i) = memchr::memchr( 0u8, &received) {
            let header = String::from_utf8_lossy( &received[..i]).into_owned();
            let name = parse_server_header( &header)?;
            info!("connected to telemetry server '{}' at {}", name, config.url);

            parser.push_chunk( &received[i+1..], &mut out);
            drain_to_sink( &mut out, &sink);
            break
        }
        if received.len() > 4096 { return Err( handshake_error!("oversized handshake header")) }
    }

    //--- stream body
    loop {
        let n = stream.read( &mut buf).await?;
        if n == 0 { return Ok(()) } // EOF
        parser.push_chunk( &buf[..n], &mut out);
        drain_to_sink( &mut out, &sink);
    }
}
