#![allow(unused)]

/// unit tests for the streaming ACMI parser
/// run with "cargo test --test test_parse -- --nocapture"

use radar_acmi::{AcmiData, AcmiRecord, IngestCounters};
use radar_acmi::parse::{AcmiParser, PreMarkerPolicy, parse_transform};
use std::sync::Arc;

const SAMPLE: &str = "FileType=text/acmi/tacview\n\
FileVersion=2.1\n\
0,ReferenceTime=2024-09-16T19:09:36Z,ReferenceLongitude=120,ReferenceLatitude=33\n\
#0.0\n\
9341,T=6.852304|7.270763|4572.13|-4.2|3.5|-161.8|701491.99|679328.81|-155.7,Type=Air+FixedWing,Name=F-16CM-52,Pilot=Falcon42,Coalition=Bosnia,Color=Cyan\n\
#1.5\n\
9341,T=||4580.0||||701500.0|679300.0|\n\
-9341\n";

fn new_parser (policy: PreMarkerPolicy)->(AcmiParser, Arc<IngestCounters>) {
    let counters = IngestCounters::new();
    (AcmiParser::new( policy, counters.clone()), counters)
}

#[test]
fn test_sample_stream () {
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();
    parser.push_chunk( SAMPLE.as_bytes(), &mut out);

    for rec in &out { println!("{}", rec) }

    assert_eq!( out.len(), 6); // global, 2 markers, 2 updates, 1 removal
    assert_eq!( counters.malformed(), 0);
    assert_eq!( counters.ignored(), 2); // the two file headers

    // global record comes through before the first marker
    let AcmiData::Global{props} = &out[0].data else { panic!("expected global record, got {}", out[0]) };
    assert!( props.iter().any( |(k,v)| k == "ReferenceTime" && v == "2024-09-16T19:09:36Z"));

    // full transform decoded from the 9 component T=
    let AcmiData::Update{id, transform, props} = &out[2].data else { panic!("expected update, got {}", out[2]) };
    assert_eq!( id, "9341");
    let t = transform.expect("missing transform");
    assert_eq!( t.u, Some(701491.99));
    assert_eq!( t.v, Some(679328.81));
    assert_eq!( t.heading, Some(-155.7));
    assert!( props.iter().any( |(k,v)| k == "Pilot" && v == "Falcon42"));

    // delta update: empty components stay None, record is stamped with the marker time
    let AcmiData::Update{transform, ..} = &out[4].data else { panic!("expected update") };
    let t = transform.expect("missing transform");
    assert_eq!( t.lon, None);
    assert_eq!( t.alt, Some(4580.0));
    assert_eq!( t.heading, None);
    assert_eq!( out[4].time.secs(), 1.5);

    let AcmiData::Remove{id} = &out[5].data else { panic!("expected removal") };
    assert_eq!( id, "9341");

    // sequence numbers are strictly increasing
    for w in out.windows(2) {
        assert!( w[1].seq > w[0].seq);
    }
}

#[test]
fn test_chunk_boundaries () {
    println!("--- feeding the sample stream one byte at a time");
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();

    for b in SAMPLE.as_bytes() {
        parser.push_chunk( std::slice::from_ref(b), &mut out);
    }

    assert_eq!( out.len(), 6); // same result as one big chunk
    assert_eq!( counters.malformed(), 0);
}

#[test]
fn test_malformed_lines_are_skipped () {
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();

    parser.parse_line( "#0.0", &mut out);
    parser.parse_line( "9341,Type Air+FixedWing", &mut out);       // missing '='
    parser.parse_line( "9341,T=1|2|x|4|5", &mut out);              // non numeric component
    parser.parse_line( "#not_a_number", &mut out);
    parser.parse_line( "9341,T=1|2", &mut out);                    // unsupported arity
    parser.parse_line( "9342,Type=Air+FixedWing", &mut out);       // a good one after the bad ones

    assert_eq!( counters.malformed(), 4);
    assert_eq!( out.len(), 2); // the marker and the good update
    assert!( matches!( &out[1].data, AcmiData::Update{id,..} if id == "9342"));
}

#[test]
fn test_marker_regression_is_clamped () {
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();

    parser.parse_line( "#10.0", &mut out);
    parser.parse_line( "#5.0", &mut out);  // regression
    parser.parse_line( "1,Type=Air+FixedWing", &mut out);

    assert_eq!( counters.marker_regressions(), 1);
    assert_eq!( out.last().unwrap().time.secs(), 10.0); // still at the high water mark
}

#[test]
fn test_pre_marker_discard () {
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();

    parser.parse_line( "1,Type=Air+FixedWing", &mut out);
    parser.parse_line( "-2", &mut out);
    assert!( out.is_empty());
    assert_eq!( counters.pre_marker_dropped(), 2);

    parser.parse_line( "#3.0", &mut out);
    parser.parse_line( "1,Type=Air+FixedWing", &mut out);
    assert_eq!( out.len(), 2);
}

#[test]
fn test_pre_marker_buffer () {
    let (mut parser, counters) = new_parser( PreMarkerPolicy::Buffer);
    let mut out = Vec::new();

    parser.parse_line( "1,Type=Air+FixedWing", &mut out);
    assert!( out.is_empty()); // held back until the first marker

    parser.parse_line( "#7.5", &mut out);
    assert_eq!( out.len(), 2); // the held back record plus the marker
    assert_eq!( out[0].time.secs(), 7.5); // stamped with the marker time
    assert!( matches!( &out[0].data, AcmiData::Update{id,..} if id == "1"));
    assert_eq!( counters.pre_marker_dropped(), 0);
}

#[test]
fn test_bullseye_extra_pipe () {
    // flat world bullseye lines carry a spurious trailing separator
    let t = parse_transform( "4.123|5.456|0.0|400000.0|500000.0|").unwrap();
    assert_eq!( t.u, Some(400000.0));
    assert_eq!( t.v, Some(500000.0));
    assert_eq!( t.roll, None);
}

#[test]
fn test_partial_tail_survives_reset_boundary () {
    let (mut parser, _) = new_parser( PreMarkerPolicy::Discard);
    let mut out = Vec::new();

    parser.push_chunk( b"#1.0\n9341,Type=Air", &mut out);
    assert_eq!( out.len(), 1); // the trailing partial line is not parsed yet

    parser.push_chunk( b"+FixedWing,Pilot=A\n", &mut out);
    assert_eq!( out.len(), 2);
    let AcmiData::Update{props,..} = &out[1].data else { panic!("expected update") };
    assert!( props.iter().any( |(k,v)| k == "Type" && v == "Air+FixedWing"));
}
