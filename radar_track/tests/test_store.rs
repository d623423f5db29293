#![allow(unused)]

/// unit tests for the entity store: lifecycle, ordering, extrapolation
/// run with "cargo test --test test_store -- --nocapture"

use std::time::Duration;
use radar_acmi::{AcmiData, AcmiRecord, Transform};
use radar_common::datetime::{secs, SimTime};
use radar_track::{classify_type, EntityKind, EntityStatus, EntityStore, NativePos, TrackConfig};
use radar_track::annotations::{AnnotationSet, MapAnnotation};

fn new_store ()->EntityStore {
    EntityStore::new( TrackConfig::default()) // staleness 5s, removal 30s, horizon 4s
}

fn pos_transform (u: f64, v: f64, alt: f64)->Option<Transform> {
    Some( Transform{ u: Some(u), v: Some(v), alt: Some(alt), ..Transform::default() })
}

fn update_rec (seq: u64, t: f64, id: &str, transform: Option<Transform>, props: &[(&str,&str)])->AcmiRecord {
    AcmiRecord {
        seq,
        time: SimTime::new(t),
        data: AcmiData::Update {
            id: id.to_string(),
            transform,
            props: props.iter().map( |(k,v)| (k.to_string(), v.to_string())).collect(),
        }
    }
}

fn remove_rec (seq: u64, t: f64, id: &str)->AcmiRecord {
    AcmiRecord{ seq, time: SimTime::new(t), data: AcmiData::Remove{ id: id.to_string() } }
}

#[test]
fn test_exists_iff_applied () {
    let mut store = new_store();
    assert!( store.get("42").is_none());

    store.apply( update_rec( 0, 0.0, "42", pos_transform(10.0,20.0,5000.0), &[("Type","Air+FixedWing")]));
    assert!( store.get("42").is_some());
    assert_eq!( store.get("42").unwrap().kind, EntityKind::FixedWing);

    store.apply( remove_rec( 1, 1.0, "42"));
    assert!( store.get("42").is_none());
    assert_eq!( store.counters().removed, 1);
}

#[test]
fn test_idempotent_reapply () {
    let mut store = new_store();
    let rec = update_rec( 0, 1.0, "42", pos_transform(10.0,20.0,5000.0), &[("Pilot","Falcon42")]);

    store.apply( rec.clone());
    let applied = store.counters().applied;

    store.apply( rec); // same timestamp - not newer, must be a no-op
    assert_eq!( store.counters().applied, applied);
    assert_eq!( store.counters().out_of_order, 1);
    assert_eq!( store.get("42").unwrap().pos, NativePos::new(10.0,20.0,5000.0));
}

#[test]
fn test_out_of_order_rejection () {
    let mut store = new_store();
    store.apply( update_rec( 0, 10.0, "42", pos_transform(100.0,100.0,1000.0), &[]));
    store.apply( update_rec( 1, 5.0, "42", pos_transform(999.0,999.0,9000.0), &[]));

    let e = store.get("42").unwrap();
    assert_eq!( e.pos, NativePos::new(100.0,100.0,1000.0)); // the t=10 state
    assert_eq!( e.last_seen.secs(), 10.0);
    assert_eq!( store.counters().out_of_order, 1);
}

#[test]
fn test_staleness_transitions () {
    println!("--- Active at t=4, Stale at t=6, purged past the removal timeout");
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "42", pos_transform(10.0,20.0,5000.0), &[]));

    store.advance( SimTime::new(4.0));
    assert_eq!( store.get("42").unwrap().status, EntityStatus::Active);

    store.advance( SimTime::new(6.0));
    assert_eq!( store.get("42").unwrap().status, EntityStatus::Stale);

    store.advance( SimTime::new(29.0));
    assert!( store.get("42").is_some()); // still shown, still stale

    store.advance( SimTime::new(31.0));
    assert!( store.get("42").is_none());
    assert_eq!( store.counters().timed_out, 1);
}

#[test]
fn test_stale_recovers_on_fresh_update () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "42", pos_transform(10.0,20.0,5000.0), &[]));
    store.advance( SimTime::new(6.0));
    assert_eq!( store.get("42").unwrap().status, EntityStatus::Stale);

    store.apply( update_rec( 1, 7.0, "42", pos_transform(11.0,20.0,5000.0), &[]));
    store.advance( SimTime::new(7.5));
    assert_eq!( store.get("42").unwrap().status, EntityStatus::Active);
}

#[test]
fn test_extrapolation_scenario () {
    println!("--- finite differenced velocity and linear dead reckoning");
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "42", pos_transform(10.0,20.0,5000.0), &[("Type","Air+FixedWing")]));
    store.apply( update_rec( 1, 1.0, "42", pos_transform(15.0,20.0,5000.0), &[]));

    let e = store.get("42").unwrap();
    let vel = e.velocity.expect("velocity not estimated");
    assert!( (vel.vu - 5.0).abs() < 1e-9);
    assert!( vel.vv.abs() < 1e-9);

    let p = store.extrapolate( "42", SimTime::new(2.0)).unwrap();
    println!("extrapolated to {}", p);
    assert!( (p.u - 20.0).abs() < 1e-9);
    assert!( (p.v - 20.0).abs() < 1e-9);
    assert!( (p.alt - 5000.0).abs() < 1e-9);
}

#[test]
fn test_extrapolation_freezes_at_horizon () {
    let mut store = new_store(); // horizon 4s
    store.apply( update_rec( 0, 0.0, "42", pos_transform(0.0,0.0,1000.0), &[]));
    store.apply( update_rec( 1, 1.0, "42", pos_transform(10.0,0.0,1000.0), &[]));

    let p1 = store.extrapolate( "42", SimTime::new(5.0)).unwrap();   // at the cap
    let p2 = store.extrapolate( "42", SimTime::new(500.0)).unwrap(); // way past it
    assert_eq!( p1, p2); // frozen, not diverging
    assert!( (p1.u - 50.0).abs() < 1e-9); // 10 m/s for the capped 4s beyond t=1
}

#[test]
fn test_unknown_type_retained_and_merged () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "7", pos_transform(1.0,2.0,3.0), &[]));
    assert_eq!( store.get("7").unwrap().kind, EntityKind::Unknown); // retained, not dropped

    // late arriving type information merges in place
    store.apply( update_rec( 1, 1.0, "7", None, &[("Type","Sea+Watercraft")]));
    assert_eq!( store.get("7").unwrap().kind, EntityKind::SurfaceVessel);
    assert_eq!( store.counters().id_conflicts, 0);
}

#[test]
fn test_id_conflict_trusts_newest () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "7", None, &[("Type","Air+FixedWing")]));
    store.apply( update_rec( 1, 1.0, "7", None, &[("Type","Ground+Vehicle")]));

    assert_eq!( store.get("7").unwrap().kind, EntityKind::GroundUnit);
    assert_eq!( store.counters().id_conflicts, 1);
}

#[test]
fn test_reused_id_is_new_logical_entity () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "42", pos_transform(0.0,0.0,0.0), &[("Pilot","First")]));
    store.apply( update_rec( 1, 1.0, "42", pos_transform(10.0,0.0,0.0), &[]));
    store.apply( remove_rec( 2, 2.0, "42"));

    store.apply( update_rec( 3, 9.0, "42", pos_transform(500.0,500.0,0.0), &[]));
    let e = store.get("42").unwrap();
    assert_eq!( e.first_seen.secs(), 9.0);  // fresh creation time
    assert!( e.pilot.is_none());            // nothing carried over
    assert!( e.velocity.is_none());
    assert_eq!( e.trace.len(), 1);
}

#[test]
fn test_delta_updates_never_clear_fields () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "9341",
        Some( Transform{ u: Some(701491.0), v: Some(679328.0), alt: Some(4572.0),
                         heading: Some(-155.7), ..Transform::default() }),
        &[("Pilot","Falcon42"),("CAS","188"),("Color","Cyan")]));

    // altitude-only delta, no CAS, no pilot
    store.apply( update_rec( 1, 1.0, "9341",
        Some( Transform{ alt: Some(4600.0), ..Transform::default() }),
        &[("CAS","")]));

    let e = store.get("9341").unwrap();
    assert_eq!( e.pos.alt, 4600.0);
    assert_eq!( e.pos.u, 701491.0);              // planar position kept
    assert_eq!( e.pilot.as_deref(), Some("Falcon42"));
    assert_eq!( e.cas, Some(188.0));             // empty numeric is "no update"
    assert_eq!( e.heading.unwrap().degrees(), 360.0 - 155.7);
}

#[test]
fn test_bullseye_diverted_from_entity_set () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "3000102",
        pos_transform(400000.0, 500000.0, 0.0),
        &[("Type","Navaid+Static+Bullseye")]));

    assert!( store.get("3000102").is_none()); // no telemetry lifecycle
    assert_eq!( store.bullseye(), Some( NativePos::new(400000.0,500000.0,0.0)));

    // subsequent typeless updates for the diverted id stay diverted
    store.apply( update_rec( 1, 1.0, "3000102", pos_transform(410000.0, 500000.0, 0.0), &[]));
    assert!( store.get("3000102").is_none());
    assert_eq!( store.bullseye().unwrap().u, 410000.0);
}

#[test]
fn test_global_reference_time () {
    let mut store = new_store();
    store.apply( AcmiRecord{ seq: 0, time: SimTime::ZERO, data: AcmiData::Global{ props: vec![
        ("ReferenceTime".to_string(), "2024-09-16T19:09:36Z".to_string()),
        ("ReferenceLongitude".to_string(), "120".to_string()),
    ]}});

    let rt = store.reference_time().expect("reference time not parsed");
    assert_eq!( rt.to_rfc3339(), "2024-09-16T19:09:36+00:00");
    assert_eq!( store.global("ReferenceLongitude"), Some("120"));

    // stream time maps onto the absolute timeline
    let t = SimTime::new(10.0).to_utc( rt);
    assert_eq!( t.to_rfc3339(), "2024-09-16T19:09:46+00:00");
}

#[test]
fn test_annotation_import () {
    let mut store = new_store();
    let set = AnnotationSet{ annotations: vec![
        MapAnnotation::Bullseye{ u: 512000.0, v: 512000.0 },
        MapAnnotation::ThreatRing{ label: "SA-5".to_string(), u: 1000.0, v: 2000.0, radius_m: 250000.0 },
    ]};

    let gen0 = store.snapshot().annotation_gen;
    store.import_annotations( set);
    let snapshot = store.snapshot();

    assert!( snapshot.annotation_gen > gen0);
    assert_eq!( snapshot.annotations.len(), 1); // the bullseye went into its own slot
    assert_eq!( snapshot.bullseye, Some( NativePos::new(512000.0,512000.0,0.0)));

    // explicit operator override wins
    store.set_bullseye( NativePos::new(1.0,2.0,0.0));
    assert_eq!( store.bullseye(), Some( NativePos::new(1.0,2.0,0.0)));
}

#[test]
fn test_snapshot_is_detached () {
    let mut store = new_store();
    store.apply( update_rec( 0, 0.0, "1", pos_transform(1.0,1.0,1.0), &[]));

    let snapshot = store.snapshot();
    store.apply( update_rec( 1, 1.0, "1", pos_transform(999.0,999.0,999.0), &[]));
    store.apply( update_rec( 2, 1.0, "2", pos_transform(0.0,0.0,0.0), &[]));

    // the held snapshot does not change under subsequent store mutation
    assert_eq!( snapshot.entities.len(), 1);
    assert_eq!( snapshot.get("1").unwrap().pos, NativePos::new(1.0,1.0,1.0));
}

#[test]
fn test_classification_table () {
    assert_eq!( classify_type("Air+FixedWing"), EntityKind::FixedWing);
    assert_eq!( classify_type("Air+Rotorcraft"), EntityKind::RotaryWing);
    assert_eq!( classify_type("Weapon+Missile"), EntityKind::Missile);
    assert_eq!( classify_type("Ground+Vehicle"), EntityKind::GroundUnit);
    assert_eq!( classify_type("Sea+Watercraft"), EntityKind::SurfaceVessel);
    assert_eq!( classify_type("Misc+Decoy+Chaff"), EntityKind::Unknown);
}
