#![allow(unused)]

/// unit tests for the theater coordinate transform
/// run with "cargo test --test test_theater -- --nocapture"

use radar_track::NativePos;
use radar_track::theater::{RenderPos, TheaterConfig, TheaterTransform};

const EPS: f64 = 1e-9;

fn close (a: f64, b: f64)->bool { (a-b).abs() < EPS }

fn transform (origin_u: f64, origin_v: f64, scale: f64, rotation: f64)->TheaterTransform {
    TheaterTransform::new( &TheaterConfig{
        origin_u, origin_v, scale, rotation,
        ..TheaterConfig::default()
    })
}

#[test]
fn test_identity () {
    let tf = transform( 0.0, 0.0, 1.0, 0.0);
    let p = tf.to_render( &NativePos::new( 1000.0, 2000.0, 3000.0));
    assert!( close( p.x, 1000.0) && close( p.y, 2000.0) && close( p.alt, 3000.0));
}

#[test]
fn test_round_trip_in_bounds () {
    println!("--- native -> render -> native round trips within epsilon");
    let tf = transform( 512000.0, 512000.0, 0.001, 30.0);

    // a grid of points across the theater (1024 km flat world)
    for i in 0..8 {
        for j in 0..8 {
            let p0 = NativePos::new( (i as f64) * 146285.0, (j as f64) * 146285.0, 7620.0);
            assert!( tf.contains_native( &p0));

            let p1 = tf.to_native( &tf.to_render( &p0));
            println!("{} -> {}", p0, p1);
            assert!( (p1.u - p0.u).abs() < 1e-6);
            assert!( (p1.v - p0.v).abs() < 1e-6);
            assert_eq!( p1.alt, p0.alt);
        }
    }
}

#[test]
fn test_out_of_bounds_not_clamped () {
    // off-map contacts are valid (distant threats) - no clamping
    let tf = transform( 0.0, 0.0, 1.0, 0.0);
    let p0 = NativePos::new( -250000.0, 2000000.0, 10000.0);
    assert!( !tf.contains_native( &p0));

    let p = tf.to_render( &p0);
    assert!( close( p.x, -250000.0) && close( p.y, 2000000.0));

    let p1 = tf.to_native( &p);
    assert!( (p1.u - p0.u).abs() < 1e-6 && (p1.v - p0.v).abs() < 1e-6);
}

#[test]
fn test_rotation_quarter_turn () {
    // a 90 degree clockwise display rotation turns native north into render +x
    let tf = transform( 0.0, 0.0, 1.0, 90.0);
    let p = tf.to_render( &NativePos::new( 0.0, 100.0, 0.0));
    assert!( close( p.x, 100.0));
    assert!( close( p.y, 0.0));
}

#[test]
fn test_scale_and_origin () {
    let tf = transform( 100.0, 200.0, 2.0, 0.0);
    let p = tf.to_render( &NativePos::new( 150.0, 300.0, 0.0));
    assert!( close( p.x, 100.0) && close( p.y, 200.0));

    let n = tf.to_native( &RenderPos::new( 100.0, 200.0, 0.0));
    assert!( close( n.u, 150.0) && close( n.v, 300.0));
}

#[test]
fn test_compass_bearing_independent_of_rotation () {
    println!("--- display rotation must not change the reported compass bearing");
    let origin = NativePos::new( 500000.0, 500000.0, 0.0);
    let north_of = NativePos::new( 500000.0, 600000.0, 0.0);
    let east_of = NativePos::new( 600000.0, 500000.0, 0.0);

    for rotation in [0.0, 30.0, 90.0, 237.5] {
        let tf = transform( 0.0, 0.0, 1.0, rotation);
        let r = tf.to_render( &origin);

        let b = tf.compass_bearing( &r, &tf.to_render( &north_of));
        println!("rotation {}: bearing to north {}", rotation, b);
        assert!( b.degrees() < 1e-6 || b.degrees() > 360.0 - 1e-6);

        let b = tf.compass_bearing( &r, &tf.to_render( &east_of));
        assert!( (b.degrees() - 90.0).abs() < 1e-6);
    }
}

#[test]
fn test_range_independent_of_scale () {
    let a = NativePos::new( 0.0, 0.0, 0.0);
    let b = NativePos::new( 3000.0, 4000.0, 0.0);

    for scale in [1.0, 0.25, 0.001] {
        let tf = transform( 0.0, 0.0, scale, 15.0);
        let d = tf.range_meters( &tf.to_render( &a), &tf.to_render( &b));
        assert!( (d - 5000.0).abs() < 1e-6);
    }
}
