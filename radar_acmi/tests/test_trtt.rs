#![allow(unused)]

/// tests for the TRTT handshake and the socket client against a loopback server
/// run with "cargo test --test test_trtt -- --nocapture"

use std::io::{Read,Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration,Instant};
use radar_acmi::{AcmiData, IngestCounters, VecSink};
use radar_acmi::trtt::{
    client_handshake_msg, parse_server_header, AcmiConnector, TrttClient, TrttConfig,
    STREAM_PROTOCOL, TELEMETRY_PROTOCOL,
};

#[test]
fn test_handshake_msg () {
    let config = TrttConfig{ client_name: "OpenRadar".to_string(), password: "hunter2".to_string(), ..TrttConfig::default() };
    let msg = client_handshake_msg( &config);

    assert_eq!( msg, "XtraLib.Stream.0\nTacview.RealTimeTelemetry.0\nClient OpenRadar\nhunter2\0");
}

#[test]
fn test_server_header () {
    let name = parse_server_header( "XtraLib.Stream.0\nTacview.RealTimeTelemetry.0\nHost Falcon BMS\n").unwrap();
    assert_eq!( name, "Falcon BMS");

    // wrong protocol is a handshake failure, not a panic
    assert!( parse_server_header( "HTTP/1.1 200 OK\n\n").is_err());
}

#[test]
fn test_client_against_loopback_server () {
    println!("--- canned stream over a loopback socket");

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = std::thread::spawn( move || {
        let (mut stream, _) = listener.accept().unwrap();

        // read the client handshake up to its NUL terminator
        let mut received = Vec::new();
        let mut buf = [0u8; 256];
        while !received.contains( &0u8) {
            let n = stream.read( &mut buf).unwrap();
            if n == 0 { panic!("client closed during handshake") }
            received.extend_from_slice( &buf[..n]);
        }
        assert!( received.starts_with( format!("{}\n{}\n", STREAM_PROTOCOL, TELEMETRY_PROTOCOL).as_bytes()));

        stream.write_all( format!("{}\n{}\nHost loopback\n\0", STREAM_PROTOCOL, TELEMETRY_PROTOCOL).as_bytes()).unwrap();
        stream.write_all( b"#0.0\n9341,T=1.0|2.0|3000.0|1000.0|2000.0,Type=Air+FixedWing\n#1.0\n-9341\n").unwrap();
        // connection drops after the canned data
    });

    let config = Arc::new( TrttConfig {
        url: addr.to_string(),
        connect_retries: 2,
        retry_interval: Duration::from_millis(50),
        read_timeout: Duration::from_millis(50),
        ..TrttConfig::default()
    });

    let sink = VecSink::new();
    let counters = IngestCounters::new();
    let mut client = TrttClient::new( config, sink.clone(), counters.clone());

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on( client.start()).unwrap();

    // wait for all 4 records (2 markers, update, removal) to arrive through the sink
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut records = Vec::new();
    while records.len() < 4 && Instant::now() < deadline {
        records.extend( sink.take());
        std::thread::sleep( Duration::from_millis(10));
    }
    client.terminate();
    server.join().unwrap();

    assert_eq!( records.len(), 4);
    assert!( matches!( &records[1].data, AcmiData::Update{id,..} if id == "9341"));
    assert!( matches!( &records[3].data, AcmiData::Remove{id} if id == "9341"));
    assert_eq!( records[3].time.secs(), 1.0);
    assert_eq!( counters.malformed(), 0);
}
