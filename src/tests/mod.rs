mod epoch;
mod interface;
mod label;
mod position;
mod settings;


use log::LevelFilter;
use std::{collections::VecDeque, sync::Once};

use crate::prelude::{
    Duration, Failure, GnssTime, Observation, Position, Receiver, Timestamp, Velocity,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Reference location (Toulouse area), ellipsoidal height
pub const REF_LAT_DEG: f64 = 43.6;
pub const REF_LON_DEG: f64 = 1.44;
pub const REF_HEIGHT_M: f64 = 200.0;

/// GPS week used in all scripted observations
pub const REF_WEEK: u32 = 2300;

/// Scripted [Receiver], replaying a predefined sequence.
/// Declares [Failure::EndOfData] once the script is consumed.
#[derive(Debug, Default)]
pub struct Scripted {
    script: VecDeque<Result<Observation, Failure>>,
    pub calls: usize,
}

impl Scripted {
    pub fn new(script: Vec<Result<Observation, Failure>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }
}

impl Receiver for Scripted {
    fn next_observation(&mut self) -> Result<Observation, Failure> {
        self.calls += 1;
        self.script.pop_front().unwrap_or(Err(Failure::EndOfData))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Builds a valid [Observation] tagged in GNSS time, `tow_s` into [REF_WEEK]
pub fn gnss_observation(tow_s: f64) -> Observation {
    Observation {
        timestamp: Timestamp::Gnss(GnssTime::from_week_tow(REF_WEEK, tow_s)),
        leap_seconds: None,
        position: Position::from_geodetic(REF_LAT_DEG, REF_LON_DEG, REF_HEIGHT_M + tow_s),
        velocity: Velocity::new(1.0, 0.0, 0.0),
        cep_m: 1.5,
    }
}

/// Builds a valid [Observation] tagged in UTC, `tow_s` into [REF_WEEK]
pub fn utc_observation(tow_s: f64, leap_seconds: Option<i32>) -> Observation {
    let utc = GnssTime::from_week_tow(REF_WEEK, tow_s).duration();
    Observation {
        timestamp: Timestamp::Utc(utc),
        leap_seconds,
        ..gnss_observation(tow_s)
    }
}

/// Elapsed seconds since the GPS origin, for given time of week in [REF_WEEK]
pub fn ref_seconds(tow_s: f64) -> Duration {
    GnssTime::from_week_tow(REF_WEEK, tow_s).duration()
}

/// Appends the NMEA checksum to given sentence content (without '$')
pub fn nmea_sentence(content: &str) -> String {
    let cs = content.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${}*{:02X}\r\n", content, cs)
}
