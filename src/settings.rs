use std::path::PathBuf;

use hifitime::prelude::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    label::Label,
    receiver::{nmea::NmeaReceiver, Interface, Receiver},
    session::{Session, DEFAULT_LEAP_SECONDS},
};

#[cfg(any(feature = "ubx23", feature = "ubx27", feature = "ubx31"))]
use crate::receiver::ubx::UbxReceiver;

/// Receiver protocol family
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// U-Blox binary protocol
    #[default]
    Ubx,
    /// NMEA-0183 sentences
    Nmea,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ubx => write!(f, "UBX"),
            Self::Nmea => write!(f, "NMEA"),
        }
    }
}

/// Data source a receiver is bound to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// Recorded files, consumed in order (passive mode)
    Files(Vec<PathBuf>),
    /// Serial port (active mode, GNSS module)
    Serial { port: String, baud: u32 },
    /// TCP server address
    Tcp(String),
}

impl Default for Source {
    fn default() -> Self {
        Self::Files(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Session [Label]
    pub label: Label,

    /// Receiver [Protocol]
    pub protocol: Protocol,

    /// Data [Source]
    pub source: Source,

    /// Initial leap second offset (s), until the receiver announces one
    pub leap_seconds: i32,

    /// Read timeout of active sources
    pub timeout: Duration,

    /// User equivalent range error (m), converts DOPs to meters
    pub uere_m: f64,

    /// Measurement period requested to active U-Blox modules
    pub measurement_period: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label: Label::new("KRX"),
            protocol: Protocol::default(),
            source: Source::default(),
            leap_seconds: DEFAULT_LEAP_SECONDS,
            timeout: Duration::from_milliseconds(2_000.0),
            uere_m: crate::receiver::nmea::DEFAULT_UERE_M,
            measurement_period: Duration::from_seconds(1.0),
        }
    }
}

impl Settings {
    /// Read timeout of active sources, which must be positive
    fn std_timeout(&self) -> Result<std::time::Duration, Error> {
        match u64::try_from(self.timeout.total_nanoseconds()) {
            Ok(nanos) if nanos > 0 => Ok(std::time::Duration::from_nanos(nanos)),
            _ => Err(Error::Configuration(format!(
                "invalid timeout: {}",
                self.timeout
            ))),
        }
    }

    /// Measurement period requested to active U-Blox modules (ms)
    fn measure_rate_ms(&self) -> Result<u16, Error> {
        let millis = self.measurement_period.total_nanoseconds() / 1_000_000;

        match u16::try_from(millis) {
            Ok(rate) if rate > 0 => Ok(rate),
            _ => Err(Error::Configuration(format!(
                "measurement period must lie within 1ms and {}ms: {}",
                u16::MAX,
                self.measurement_period
            ))),
        }
    }

    /// Opens the data [Source]
    pub fn interface(&self) -> Result<Interface, Error> {
        match &self.source {
            Source::Files(paths) => Interface::open_files(paths),
            Source::Serial { port, baud } => {
                Interface::open_serial_port(port, *baud, self.std_timeout()?)
            },
            Source::Tcp(address) => Interface::connect_tcp(address, self.std_timeout()?),
        }
    }

    #[cfg(any(feature = "ubx23", feature = "ubx27", feature = "ubx31"))]
    fn ubx_receiver(&self, interface: Interface) -> Result<Box<dyn Receiver + Send>, Error> {
        let is_serial = interface.is_serial_port();
        let mut receiver = UbxReceiver::new(interface);

        if let Source::Serial { baud, .. } = &self.source {
            if is_serial {
                receiver.configure(*baud, self.measure_rate_ms()?)?;
            }
        }

        Ok(Box::new(receiver))
    }

    #[cfg(not(any(feature = "ubx23", feature = "ubx27", feature = "ubx31")))]
    fn ubx_receiver(&self, _: Interface) -> Result<Box<dyn Receiver + Send>, Error> {
        Err(Error::Configuration(
            "UBX support not compiled in: activate one of the ubx features".to_string(),
        ))
    }

    /// Opens the [Source] and binds the selected [Protocol] to it.
    /// Fails when the source cannot be reached or the receiver rejects
    /// its configuration: no [Session] exists in that case.
    pub fn open(&self) -> Result<Session<Box<dyn Receiver + Send>>, Error> {
        if !self.uere_m.is_finite() || self.uere_m <= 0.0 {
            return Err(Error::Configuration(format!(
                "invalid UERE: {}",
                self.uere_m
            )));
        }

        self.std_timeout()?;

        if self.protocol == Protocol::Ubx {
            self.measure_rate_ms()?;
        }

        let interface = self.interface()?;
        debug!("{} - {:?} opened", self.label, interface);

        let receiver: Box<dyn Receiver + Send> = match self.protocol {
            Protocol::Nmea => Box::new(NmeaReceiver::new(interface, self.uere_m)),
            Protocol::Ubx => self.ubx_receiver(interface)?,
        };

        Ok(Session::new(receiver, self.label.clone()).with_leap_seconds(self.leap_seconds))
    }
}
