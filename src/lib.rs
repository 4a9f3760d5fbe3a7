#![doc(
    html_logo_url = "https://raw.githubusercontent.com/nav-solutions/.github/master/logos/logo2.jpg"
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * KINEMATIC-RX is part of the nav-solutions framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al,
 * (cf. https://github.com/nav-solutions/kinematic-rx/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/nav-solutions/kinematic-rx
 */

//! GNSS receiver abstraction for kinematic positioning.
//!
//! A [Session](crate::session::Session) drives one [Receiver](crate::receiver::Receiver)
//! and exposes, after each `advance_epoch()`, one synchronized time, position,
//! velocity and uncertainty snapshot, whatever the receiver protocol.

pub mod epoch;
pub mod error;
pub mod label;
pub mod position;
pub mod receiver;
pub mod session;
pub mod settings;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::epoch::{EpochRecord, GnssTime, Timestamp};
    pub use crate::error::{Error, Failure, FailureKind};
    pub use crate::label::Label;
    pub use crate::position::{Position, Velocity};
    pub use crate::receiver::{nmea::NmeaReceiver, Interface, Observation, Receiver};
    pub use crate::session::{Session, State, DEFAULT_LEAP_SECONDS};
    pub use crate::settings::{Protocol, Settings, Source};

    #[cfg(any(feature = "ubx23", feature = "ubx27", feature = "ubx31"))]
    pub use crate::receiver::ubx::UbxReceiver;

    // re-export
    pub use hifitime::{Duration, Epoch, TimeScale};
}
