use hifitime::prelude::{Duration, Epoch, TimeScale};
use serde::{Deserialize, Serialize};

use crate::{
    error::Failure,
    position::{Position, Velocity},
};

/// Number of seconds in one GNSS week
pub const SECONDS_PER_WEEK: i64 = 604_800;

/// GNSS system time, expressed as the [Duration] elapsed since the
/// GPS time origin (1980-01-06T00:00:00 GPST). Not affected by leap seconds.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GnssTime(Duration);

impl GnssTime {
    /// Builds [GnssTime] from elapsed [Duration] since the GPS origin
    pub fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Builds [GnssTime] from any [Epoch], whatever its [TimeScale]
    pub fn from_epoch(epoch: Epoch) -> Self {
        Self(epoch.to_gpst_duration())
    }

    /// Builds [GnssTime] from week counter and time of week (s)
    pub fn from_week_tow(week: u32, tow_s: f64) -> Self {
        Self(Duration::from_seconds(week as f64 * SECONDS_PER_WEEK as f64 + tow_s))
    }

    /// Builds [GnssTime] from civil UTC time (elapsed since the GPS origin,
    /// leap seconds not accounted for), using given leap second offset.
    pub fn from_utc(utc: Duration, leap_seconds: i32) -> Self {
        Self(utc + Duration::from_seconds(leap_seconds as f64))
    }

    /// Elapsed [Duration] since the GPS origin
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Converts to [Epoch] expressed in [TimeScale::GPST]
    pub fn to_epoch(&self) -> Epoch {
        Epoch::from_gpst_duration(self.0)
    }

    /// Converts to civil UTC time (elapsed since the GPS origin)
    /// using given leap second offset.
    pub fn to_utc(&self, leap_seconds: i32) -> Duration {
        self.0 - Duration::from_seconds(leap_seconds as f64)
    }

    /// Returns (week counter, time of week in seconds).
    /// None for instants preceding the GPS origin, which have no week counter.
    pub fn week_tow(&self) -> Option<(u32, f64)> {
        let seconds = self.0.to_seconds();
        if seconds < 0.0 {
            return None;
        }

        let week = (seconds / SECONDS_PER_WEEK as f64).floor();
        let week_counter = u32::try_from(week as u64).ok()?;
        Some((week_counter, seconds - week * SECONDS_PER_WEEK as f64))
    }
}

impl std::fmt::Display for GnssTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_epoch())
    }
}

/// Converts civil UTC date and time to the [Duration] elapsed since the GPS origin,
/// ignoring leap seconds. Invalid dates are reported as [Failure::Malformed].
#[allow(clippy::too_many_arguments)]
pub fn utc_from_gregorian(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanos: u32,
) -> Result<Duration, Failure> {
    // Interpreting the civil fields in a continuous timescale
    // keeps leap seconds out of the conversion.
    let civil = Epoch::maybe_from_gregorian(
        year,
        month,
        day,
        hour,
        minute,
        second,
        nanos,
        TimeScale::GPST,
    )
    .map_err(|e| {
        Failure::Malformed(format!(
            "invalid date {:04}-{:02}-{:02}T{:02}:{:02}:{:02}: {}",
            year, month, day, hour, minute, second, e
        ))
    })?;

    Ok(civil.to_gpst_duration())
}

/// Time tag attached to an [Observation](crate::receiver::Observation).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Timestamp {
    /// Receiver reports GNSS system time directly
    Gnss(GnssTime),
    /// Receiver reports civil UTC time only (elapsed since the GPS origin,
    /// leap seconds not accounted for): the session applies its leap offset.
    Utc(Duration),
}

impl Timestamp {
    /// Resolves this [Timestamp] to [GnssTime] with given leap second offset
    pub fn resolve(&self, leap_seconds: i32) -> GnssTime {
        match self {
            Self::Gnss(t) => *t,
            Self::Utc(utc) => GnssTime::from_utc(*utc, leap_seconds),
        }
    }
}

/// Normalized snapshot of one receiver epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// GNSS system time of this epoch
    pub time: GnssTime,

    /// GNSS time - UTC (s) in force at this epoch
    pub leap_seconds: i32,

    /// ECEF [Position]
    pub position: Position,

    /// ECEF [Velocity]
    pub velocity: Velocity,

    /// Horizontal circular error probable (m)
    pub cep_m: f64,
}

impl std::fmt::Display for EpochRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (leap={}s) {} {} cep={:.3}m",
            self.time, self.leap_seconds, self.position, self.velocity, self.cep_m
        )
    }
}
