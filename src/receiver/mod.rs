//! Receiver variants: one implementation per protocol / hardware family.
mod interface;

pub mod nmea;

#[cfg(any(feature = "ubx23", feature = "ubx27", feature = "ubx31"))]
pub mod ubx;

pub use interface::Interface;

use crate::{
    epoch::Timestamp,
    error::Failure,
    position::{Position, Velocity},
};

/// Decoded content of one receiver epoch, before the session
/// resolves it against its leap second state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Observation {
    /// Time tag, as reported by the receiver
    pub timestamp: Timestamp,

    /// Leap second announcement decoded from the stream, if any
    pub leap_seconds: Option<i32>,

    /// ECEF [Position]
    pub position: Position,

    /// ECEF [Velocity]
    pub velocity: Velocity,

    /// Horizontal circular error probable (m)
    pub cep_m: f64,
}

/// Contract of every concrete GNSS receiver.
///
/// Each call acquires and decodes the next epoch from the receiver's own data
/// source, blocking if needed. Input may be consumed even when the call fails.
/// Once a [Failure] of permanent kind was returned, the receiver is not
/// called anymore.
pub trait Receiver {
    /// Acquire and decode the next [Observation]
    fn next_observation(&mut self) -> Result<Observation, Failure>;

    /// Short description of this receiver and its source
    fn describe(&self) -> String;
}

impl<R: Receiver + ?Sized> Receiver for Box<R> {
    fn next_observation(&mut self) -> Result<Observation, Failure> {
        (**self).next_observation()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Circular error probable (50%) from two independent horizontal 1-sigma errors
/// (Chan's approximation, valid for similar sigmas).
pub(crate) fn cep_from_sigmas(sigma_north_m: f64, sigma_east_m: f64) -> f64 {
    0.589 * (sigma_north_m + sigma_east_m)
}

/// Circular error probable (50%) from a horizontal accuracy estimate,
/// assuming equal north and east sigmas.
pub(crate) fn cep_from_horizontal_accuracy(accuracy_m: f64) -> f64 {
    cep_from_sigmas(accuracy_m, accuracy_m) / std::f64::consts::SQRT_2
}
