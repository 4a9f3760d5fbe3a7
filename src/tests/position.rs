use rstest::*;

use crate::{
    position::WGS84_SEMI_MAJOR_AXIS_M,
    prelude::{Position, Velocity},
};

#[rstest]
#[case(0.0, 0.0, 0.0)]
#[case(43.6, 1.44, 200.0)]
#[case(-33.86, 151.21, 58.0)]
#[case(64.15, -21.94, -30.0)]
#[case(89.9, 45.0, 1000.0)]
fn geodetic_ecef_round_trip(#[case] lat: f64, #[case] lon: f64, #[case] height: f64) {
    let position = Position::from_geodetic(lat, lon, height);
    let (lat_deg, lon_deg, height_m) = position.to_geodetic();

    assert!((lat_deg - lat).abs() < 1.0E-8, "lat {} {}", lat_deg, lat);
    assert!((lon_deg - lon).abs() < 1.0E-8, "lon {} {}", lon_deg, lon);
    assert!((height_m - height).abs() < 1.0E-3, "h {} {}", height_m, height);
}

#[test]
fn equator_prime_meridian() {
    let position = Position::from_geodetic(0.0, 0.0, 0.0);
    assert!((position.x_m - WGS84_SEMI_MAJOR_AXIS_M).abs() < 1.0E-6);
    assert!(position.y_m.abs() < 1.0E-6);
    assert!(position.z_m.abs() < 1.0E-6);

    let above = Position::from_geodetic(0.0, 0.0, 100.0);
    assert!((position.distance(&above) - 100.0).abs() < 1.0E-6);
}

#[test]
fn north_pole() {
    let position = Position::new(0.0, 0.0, 6_356_752.314);
    let (lat, _, height) = position.to_geodetic();
    assert_eq!(lat, 90.0);
    assert!(height.abs() < 1.0E-2);
}

#[test]
fn ned_rotation() {
    // at (0°, 0°), north is +z, east is +y, down is -x
    let v = Velocity::from_ned(0.0, 0.0, 1.0, 2.0, 3.0);
    assert!((v.x_m_s + 3.0).abs() < 1.0E-12);
    assert!((v.y_m_s - 2.0).abs() < 1.0E-12);
    assert!((v.z_m_s - 1.0).abs() < 1.0E-12);

    let v = Velocity::from_ned(43.6, 1.44, 3.0, -4.0, 0.5);
    assert!((v.speed() - (9.0_f64 + 16.0 + 0.25).sqrt()).abs() < 1.0E-9);

    let (n, e, d) = v.to_ned(43.6, 1.44);
    assert!((n - 3.0).abs() < 1.0E-9);
    assert!((e + 4.0).abs() < 1.0E-9);
    assert!((d - 0.5).abs() < 1.0E-9);
}
