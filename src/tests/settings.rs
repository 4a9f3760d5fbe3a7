use rstest::*;

use std::{fs::File, io::Write, path::PathBuf};

use crate::{
    epoch::utc_from_gregorian,
    prelude::{
        Duration, Error, Failure, GnssTime, Label, Protocol, Receiver, Settings, Source, State,
    },
    tests::{init_logger, nmea_sentence},
};

fn temp_nmea_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("kinematic-rx-{}-{}", std::process::id(), name));
    let mut fd = File::create(&path).unwrap();

    for content in [
        "GPGGA,080000.00,4336.0000,N,00126.4000,E,1,09,1.0,150.0,M,50.0,M,,",
        "GPRMC,080000.00,A,4336.0000,N,00126.4000,E,0.0,0.0,150624,,,A",
        "GPGGA,080001.00,4336.0000,N,00126.4000,E,1,09,1.0,150.0,M,50.0,M,,",
        "GPRMC,080001.00,A,4336.0000,N,00126.4000,E,0.0,0.0,150624,,,A",
    ] {
        fd.write_all(nmea_sentence(content).as_bytes()).unwrap();
    }

    path
}

#[test]
fn default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.protocol, Protocol::Ubx);
    assert_eq!(settings.source, Source::Files(vec![]));
    assert_eq!(settings.leap_seconds, 18);
    assert!(settings.uere_m > 0.0);
}

#[test]
fn no_input_files() {
    let settings = Settings {
        protocol: Protocol::Nmea,
        ..Default::default()
    };

    assert!(matches!(settings.open(), Err(Error::NoInput)));
}

#[test]
fn missing_input_file() {
    let settings = Settings {
        protocol: Protocol::Nmea,
        source: Source::Files(vec![std::env::temp_dir().join("kinematic-rx-missing.nmea")]),
        ..Default::default()
    };

    assert!(matches!(settings.open(), Err(Error::Io(_))));
}

#[test]
fn invalid_uere() {
    for uere_m in [0.0, -1.0, f64::NAN] {
        let settings = Settings {
            protocol: Protocol::Nmea,
            uere_m,
            ..Default::default()
        };

        assert!(matches!(settings.open(), Err(Error::Configuration(_))));
    }
}

#[rstest]
#[case(0.0)]
#[case(0.0005)]
#[case(65.536)]
#[case(70.0)]
#[case(-1.0)]
fn invalid_measurement_period(#[case] period_s: f64) {
    let settings = Settings {
        measurement_period: Duration::from_seconds(period_s),
        ..Default::default()
    };

    assert!(matches!(settings.open(), Err(Error::Configuration(_))));
}

#[rstest]
#[case(0.001)]
#[case(1.0)]
#[case(65.535)]
fn valid_measurement_period(#[case] period_s: f64) {
    let settings = Settings {
        measurement_period: Duration::from_seconds(period_s),
        ..Default::default()
    };

    // reaches the source
    assert!(matches!(settings.open(), Err(Error::NoInput)));
}

#[rstest]
#[case(0.0)]
#[case(-2.0)]
fn invalid_timeout(#[case] timeout_s: f64) {
    for protocol in [Protocol::Ubx, Protocol::Nmea] {
        let settings = Settings {
            protocol,
            timeout: Duration::from_seconds(timeout_s),
            ..Default::default()
        };

        assert!(matches!(settings.open(), Err(Error::Configuration(_))));
    }
}

#[test]
fn nmea_file_session() {
    init_logger();

    let path = temp_nmea_file("session.nmea");

    let settings = Settings {
        label: Label::new("ROVER"),
        protocol: Protocol::Nmea,
        source: Source::Files(vec![path.clone()]),
        leap_seconds: 17,
        ..Default::default()
    };

    let mut session = settings.open().unwrap();

    assert_eq!(session.label().as_str(), "ROVER");
    assert_eq!(session.leap_seconds(), 17);
    assert_eq!(session.receiver().describe(), "NMEA-0183 (passive)");

    let mut records = Vec::new();

    while session.advance_epoch() {
        records.push(session.current_epoch().unwrap());
    }

    assert_eq!(session.state(), State::Exhausted);
    assert_eq!(session.last_failure(), Some(&Failure::EndOfData));
    assert_eq!(records.len(), 2);

    // no announcement: initial offset in force
    let utc = utc_from_gregorian(2024, 6, 15, 8, 0, 1, 0).unwrap();
    assert_eq!(records[1].time, GnssTime::from_utc(utc, 17));
    assert_eq!(records[1].leap_seconds, 17);

    let _ = std::fs::remove_file(path);
}

#[test]
fn settings_serdes() {
    let settings = Settings {
        label: Label::new("BASE"),
        protocol: Protocol::Nmea,
        source: Source::Serial {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
        },
        ..Default::default()
    };

    let json = serde_json::to_string(&settings).unwrap();
    let parsed: Settings = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, settings);
}
