//! U-Blox receivers, streaming the UBX binary protocol.
use log::{debug, error, trace};

use ublox::{
    Parser, UbxPacket, UbxPacketMeta,
    cfg_msg::{CfgMsgAllPorts, CfgMsgAllPortsBuilder},
    cfg_prt::{
        CfgPrtUart, CfgPrtUartBuilder, DataBits, InProtoMask, OutProtoMask, Parity, StopBits,
        UartMode, UartPortId,
    },
    cfg_rate::{AlignmentToReferenceTime, CfgRate, CfgRateBuilder},
    nav_pvt::common::{NavPvtFlags, NavPvtValidFlags},
    GnssFixType,
};

#[cfg(feature = "ubx23")]
use ublox::{nav_pvt::proto23::NavPvt, packetref_proto23::PacketRef, proto23::Proto23 as Proto};

#[cfg(all(feature = "ubx27", not(feature = "ubx23")))]
use ublox::{nav_pvt::proto27_31::NavPvt, packetref_proto27::PacketRef, proto27::Proto27 as Proto};

#[cfg(all(feature = "ubx31", not(any(feature = "ubx23", feature = "ubx27"))))]
use ublox::{nav_pvt::proto27_31::NavPvt, packetref_proto31::PacketRef, proto31::Proto31 as Proto};

use std::{collections::VecDeque, io::Write};

use hifitime::prelude::Duration;

use crate::{
    epoch::{utc_from_gregorian, GnssTime, Timestamp, SECONDS_PER_WEEK},
    error::{Error, Failure},
    position::{Position, Velocity},
    receiver::{cep_from_horizontal_accuracy, Interface, Observation, Receiver},
};

/// Wraps a [PacketRef] into the [UbxPacket] of the selected protocol revision.
#[cfg(feature = "ubx23")]
macro_rules! ubx_packet {
    ($packet:pat) => {
        UbxPacket::Proto23($packet)
    };
}

#[cfg(all(feature = "ubx27", not(feature = "ubx23")))]
macro_rules! ubx_packet {
    ($packet:pat) => {
        UbxPacket::Proto27($packet)
    };
}

#[cfg(all(feature = "ubx31", not(any(feature = "ubx23", feature = "ubx27"))))]
macro_rules! ubx_packet {
    ($packet:pat) => {
        UbxPacket::Proto31($packet)
    };
}

/// Size of a single read
const READ_SIZE: usize = 8192;

/// Number of reads we tolerate while waiting for an acknowledgment
const ACK_MAX_READS: usize = 32;

/// Minimal number of satellites for a usable navigation solution
const MIN_SATELLITES: u8 = 4;

/// Content of one UBX-NAV-PVT frame we rely on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct NavPvtFields {
    pub itow_ms: u32,
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: i32,
    pub date_time_valid: bool,
    pub fully_resolved: bool,
    pub fix_type: GnssFixType,
    /// Solution within DOP and accuracy masks
    pub fix_ok: bool,
    pub num_satellites: u8,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub height_m: f64,
    pub vel_north_m_s: f64,
    pub vel_east_m_s: f64,
    pub vel_down_m_s: f64,
    pub horizontal_accuracy_m: f64,
}

impl NavPvtFields {
    /// Converts this frame to an [Observation].
    /// When UTC is fully resolved, the leap second offset is derived from
    /// the GPS time of week and announced.
    pub fn to_observation(&self) -> Result<Observation, Failure> {
        if !self.date_time_valid || self.num_satellites < MIN_SATELLITES {
            return Err(Failure::NoFix);
        }

        // dead reckoning only and time only fixes carry no usable position
        let position_fix = matches!(
            self.fix_type,
            GnssFixType::Fix2D | GnssFixType::Fix3D | GnssFixType::GPSPlusDeadReckoning
        );

        if !position_fix || !self.fix_ok {
            return Err(Failure::NoFix);
        }

        let utc = utc_from_gregorian(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            0,
        )? + Duration::from_total_nanoseconds(self.nanos as i128);

        let (timestamp, leap_seconds) = if self.fully_resolved {
            let utc_tow_s = utc.to_seconds().rem_euclid(SECONDS_PER_WEEK as f64);
            let gps_tow_s = self.itow_ms as f64 / 1000.0;

            let mut leap = (gps_tow_s - utc_tow_s).round() as i64;

            // week boundary between both time tags
            if leap > SECONDS_PER_WEEK / 2 {
                leap -= SECONDS_PER_WEEK;
            } else if leap < -SECONDS_PER_WEEK / 2 {
                leap += SECONDS_PER_WEEK;
            }

            let leap = leap as i32;
            (Timestamp::Gnss(GnssTime::from_utc(utc, leap)), Some(leap))
        } else {
            (Timestamp::Utc(utc), None)
        };

        Ok(Observation {
            timestamp,
            leap_seconds,
            position: Position::from_geodetic(self.lat_deg, self.lon_deg, self.height_m),
            velocity: Velocity::from_ned(
                self.lat_deg,
                self.lon_deg,
                self.vel_north_m_s,
                self.vel_east_m_s,
                self.vel_down_m_s,
            ),
            cep_m: cep_from_horizontal_accuracy(self.horizontal_accuracy_m),
        })
    }
}

/// Extracts [NavPvtFields] from a NAV-PVT packet reference
macro_rules! nav_pvt_fields {
    ($pvt:expr) => {{
        let valid = $pvt.valid();
        NavPvtFields {
            itow_ms: $pvt.itow(),
            year: $pvt.year() as i32,
            month: $pvt.month(),
            day: $pvt.day(),
            hour: $pvt.hour(),
            minute: $pvt.min(),
            second: $pvt.sec(),
            nanos: $pvt.nanosec(),
            date_time_valid: valid.intersects(NavPvtValidFlags::VALID_DATE)
                && valid.intersects(NavPvtValidFlags::VALID_TIME),
            fully_resolved: valid.intersects(NavPvtValidFlags::FULLY_RESOLVED),
            fix_type: $pvt.fix_type(),
            fix_ok: $pvt.flags().intersects(NavPvtFlags::GPS_FIX_OK),
            num_satellites: $pvt.num_satellites(),
            lat_deg: $pvt.latitude(),
            lon_deg: $pvt.longitude(),
            height_m: $pvt.height_above_ellipsoid(),
            vel_north_m_s: $pvt.vel_north(),
            vel_east_m_s: $pvt.vel_east(),
            vel_down_m_s: $pvt.vel_down(),
            horizontal_accuracy_m: $pvt.horizontal_accuracy(),
        }
    }};
}

/// U-Blox receiver. One epoch per UBX-NAV-PVT frame.
pub struct UbxReceiver {
    interface: Interface,
    parser: Parser<Vec<u8>, Proto>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<Observation, Failure>>,
}

impl std::fmt::Debug for UbxReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UbxReceiver")
            .field("interface", &self.interface)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl UbxReceiver {
    /// Binds a new [UbxReceiver] to this [Interface], without configuring it.
    pub fn new(interface: Interface) -> Self {
        Self {
            interface,
            parser: Parser::<_, Proto>::new(vec![]),
            buffer: vec![0; READ_SIZE],
            pending: VecDeque::with_capacity(8),
        }
    }

    /// Configures an active U-Blox module:
    /// UBX output on both UART ports, NAV-PVT stream,
    /// and measurement rate aligned to GPST.
    pub fn configure(&mut self, baud_rate: u32, measure_rate_ms: u16) -> Result<(), Error> {
        for portid in [UartPortId::Uart1, UartPortId::Uart2] {
            self.write_all(
                &CfgPrtUartBuilder {
                    portid,
                    flags: 0,
                    tx_ready: 0,
                    reserved5: 0,
                    reserved0: 0,
                    baud_rate,
                    in_proto_mask: InProtoMask::all(),
                    out_proto_mask: OutProtoMask::UBLOX,
                    mode: UartMode::new(DataBits::Eight, Parity::None, StopBits::One),
                }
                .into_packet_bytes(),
            )?;

            self.wait_for_ack::<CfgPrtUart>("UBX-CFG-PRT")?;
        }

        // By setting 1 in the array below, we enable the NavPvt message for Uart1, Uart2 and USB
        // The other positions are for I2C, SPI, etc. Consult your device manual.
        self.write_all(
            &CfgMsgAllPortsBuilder::set_rate_for::<NavPvt>([1, 1, 1, 1, 1, 1]).into_packet_bytes(),
        )?;

        self.wait_for_ack::<CfgMsgAllPorts>("UBX-NAV-PVT")?;
        debug!("UBX-NAV-PVT enabled");

        self.write_all(
            &CfgRateBuilder {
                measure_rate_ms,
                nav_rate: 1,
                time_ref: AlignmentToReferenceTime::Gps,
            }
            .into_packet_bytes(),
        )?;

        self.wait_for_ack::<CfgRate>("UBX-CFG-RATE")?;
        debug!("UBX-CFG-RATE: {}ms", measure_rate_ms);

        Ok(())
    }

    pub fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.interface.write_all(data)
    }

    /// Waits for the acknowledgment of `T`. Frames received in between are
    /// interpreted as usual, so no epoch is lost.
    fn wait_for_ack<T: UbxPacketMeta>(&mut self, name: &'static str) -> Result<(), Error> {
        for _ in 0..ACK_MAX_READS {
            let size = match self.interface.read_interface(&mut self.buffer) {
                Ok(size) => size,
                Err(failure) if failure.is_permanent() => {
                    error!("{} - {}", name, failure);
                    return Err(Error::Acknowledgement(name));
                },
                Err(_) => continue,
            };

            let mut found = false;
            let mut it = self.parser.consume_ubx(&self.buffer[..size]);

            while let Some(packet) = it.next() {
                match packet {
                    Ok(ubx_packet!(PacketRef::AckAck(ack))) => {
                        if ack.is_ack_for::<T>() {
                            found = true;
                        }
                    },
                    Ok(ubx_packet!(PacketRef::AckNak(nak))) => {
                        if nak.is_nak_for::<T>() {
                            error!("{} rejected", name);
                            return Err(Error::Acknowledgement(name));
                        }
                    },
                    Ok(ubx_packet!(PacketRef::NavPvt(pvt))) => {
                        self.pending.push_back(nav_pvt_fields!(pvt).to_observation());
                    },
                    Ok(_) => {},
                    Err(e) => {
                        error!("UBX parsing error: {}", e);
                    },
                }
            }

            if found {
                return Ok(());
            }
        }

        Err(Error::Acknowledgement(name))
    }

    /// Consumes one read worth of data, queuing every decoded NAV-PVT frame
    /// and parsing error in stream order.
    fn consume(&mut self, size: usize) {
        let mut it = self.parser.consume_ubx(&self.buffer[..size]);

        while let Some(packet) = it.next() {
            match packet {
                Ok(ubx_packet!(PacketRef::NavPvt(pvt))) => {
                    let fields = nav_pvt_fields!(pvt);
                    trace!("NAV-PVT {:?}", fields);
                    self.pending.push_back(fields.to_observation());
                },
                Ok(_) => {},
                Err(e) => {
                    self.pending
                        .push_back(Err(Failure::Malformed(format!("UBX: {}", e))));
                },
            }
        }
    }
}

impl Receiver for UbxReceiver {
    fn next_observation(&mut self) -> Result<Observation, Failure> {
        loop {
            if let Some(pending) = self.pending.pop_front() {
                return pending;
            }

            let size = self.interface.read_interface(&mut self.buffer)?;
            self.consume(size);
        }
    }

    fn describe(&self) -> String {
        if self.interface.is_read_only() {
            "U-Blox (passive)".to_string()
        } else {
            "U-Blox".to_string()
        }
    }
}
