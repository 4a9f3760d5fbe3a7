//! NMEA-0183 receivers, streaming text sentences.
//!
//! Supported sentences (any talker):
//! - GGA: time, position, fix quality, HDOP, altitude
//! - RMC: time, date, ground speed and course
//! - GST: latitude / longitude error statistics
//! - PUBX,04 (U-Blox proprietary): date and leap seconds
//!
//! Sentences sharing one UTC time of day form one epoch. The epoch is
//! released once a sentence with a different time arrives, or the source ends.
use log::{debug, trace};

use hifitime::prelude::Duration;

use crate::{
    epoch::{utc_from_gregorian, Timestamp},
    error::Failure,
    position::{Position, Velocity},
    receiver::{cep_from_horizontal_accuracy, cep_from_sigmas, Interface, Observation, Receiver},
};

/// Knots to meters per second
const KNOTS_TO_M_S: f64 = 1852.0 / 3600.0;

/// Size of a single read
const READ_SIZE: usize = 1024;

/// Sentences longer than this are not NMEA
const MAX_SENTENCE_LEN: usize = 256;

/// Default user equivalent range error (m, 1 sigma)
pub const DEFAULT_UERE_M: f64 = 5.0;

/// UTC time of day
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

/// UTC date
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub(crate) struct Gga {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub quality: u8,
    pub num_satellites: u8,
    pub hdop: Option<f64>,
    /// Altitude above mean sea level (m)
    pub altitude_m: f64,
    /// Geoid separation (m)
    pub geoid_m: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Rmc {
    pub active: bool,
    pub date: Option<Date>,
    pub speed_m_s: Option<f64>,
    pub course_deg: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Gst {
    pub sigma_lat_m: f64,
    pub sigma_lon_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sentence {
    Gga(TimeOfDay, Option<Gga>),
    Rmc(TimeOfDay, Rmc),
    Gst(TimeOfDay, Gst),
    /// PUBX,04: date and confirmed leap seconds
    PubxTime(TimeOfDay, Option<Date>, Option<i32>),
    /// Valid sentence we do not interpret
    Other(String),
}

impl Sentence {
    fn time_of_day(&self) -> Option<TimeOfDay> {
        match self {
            Self::Gga(t, _) | Self::Rmc(t, _) | Self::Gst(t, _) | Self::PubxTime(t, _, _) => {
                Some(*t)
            },
            Self::Other(_) => None,
        }
    }
}

fn malformed(sentence: &str, reason: &str) -> Failure {
    Failure::Malformed(format!("\"{}\": {}", sentence, reason))
}

/// XOR of all characters between '$' and '*'
pub(crate) fn checksum(content: &str) -> u8 {
    content.bytes().fold(0, |acc, b| acc ^ b)
}

fn parse_time_of_day(field: &str) -> Option<TimeOfDay> {
    if field.len() < 6 || !field.is_ascii() {
        return None;
    }

    let hour = field[0..2].parse::<u8>().ok()?;
    let minute = field[2..4].parse::<u8>().ok()?;
    let seconds = field[4..].parse::<f64>().ok()?;

    if hour > 23 || minute > 59 || !(0.0..61.0).contains(&seconds) {
        return None;
    }

    let second = seconds.trunc() as u8;
    let nanos = ((seconds - seconds.trunc()) * 1.0E9).round() as u32;

    Some(TimeOfDay {
        hour,
        minute,
        second,
        nanos: nanos.min(999_999_999),
    })
}

/// ddmmyy
fn parse_date(field: &str) -> Option<Date> {
    if field.len() != 6 || !field.is_ascii() {
        return None;
    }

    let day = field[0..2].parse::<u8>().ok()?;
    let month = field[2..4].parse::<u8>().ok()?;
    let yy = field[4..6].parse::<i32>().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    // GNSS time starts in 1980
    let year = if yy >= 80 { 1900 + yy } else { 2000 + yy };

    Some(Date { year, month, day })
}

/// (d)ddmm.mmmm + hemisphere, to decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str, negative: char) -> Option<f64> {
    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;

    if minutes >= 60.0 {
        return None;
    }

    let decimal = degrees + minutes / 60.0;

    match hemisphere.chars().next() {
        Some(c) if c == negative => Some(-decimal),
        Some(_) => Some(decimal),
        None => None,
    }
}

fn parse_optional_f64(field: &str) -> Result<Option<f64>, ()> {
    if field.is_empty() {
        Ok(None)
    } else {
        field.parse::<f64>().map(Some).map_err(|_| ())
    }
}

/// Parses one sentence, verifying its checksum when present.
pub(crate) fn parse_sentence(line: &str) -> Result<Sentence, Failure> {
    let line = line.trim();

    let body = line
        .strip_prefix('$')
        .ok_or_else(|| malformed(line, "missing start delimiter"))?;

    let content = match body.split_once('*') {
        Some((content, cs)) => {
            let found = u8::from_str_radix(cs.trim(), 16)
                .map_err(|_| malformed(line, "invalid checksum field"))?;

            let expected = checksum(content);
            if expected != found {
                return Err(Failure::Checksum { expected, found });
            }
            content
        },
        None => body,
    };

    let fields = content.split(',').collect::<Vec<_>>();
    let address = fields[0];

    if address == "PUBX" {
        return parse_pubx(line, &fields);
    }

    if address.len() != 5 || !address.is_ascii() {
        return Ok(Sentence::Other(address.to_string()));
    }

    match &address[2..] {
        "GGA" => parse_gga(line, &fields),
        "RMC" => parse_rmc(line, &fields),
        "GST" => parse_gst(line, &fields),
        other => Ok(Sentence::Other(other.to_string())),
    }
}

fn parse_gga(line: &str, fields: &[&str]) -> Result<Sentence, Failure> {
    if fields.len() < 15 {
        return Err(malformed(line, "incomplete GGA"));
    }

    let time = parse_time_of_day(fields[1]).ok_or_else(|| malformed(line, "invalid time"))?;

    let quality = if fields[6].is_empty() {
        0
    } else {
        fields[6]
            .parse::<u8>()
            .map_err(|_| malformed(line, "invalid fix quality"))?
    };

    if quality == 0 || fields[2].is_empty() || fields[4].is_empty() {
        return Ok(Sentence::Gga(time, None));
    }

    let lat_deg =
        parse_coordinate(fields[2], fields[3], 'S').ok_or_else(|| malformed(line, "invalid latitude"))?;

    let lon_deg =
        parse_coordinate(fields[4], fields[5], 'W').ok_or_else(|| malformed(line, "invalid longitude"))?;

    let num_satellites = fields[7].parse::<u8>().unwrap_or_default();

    let hdop = parse_optional_f64(fields[8]).map_err(|_| malformed(line, "invalid HDOP"))?;

    let altitude_m = parse_optional_f64(fields[9])
        .map_err(|_| malformed(line, "invalid altitude"))?
        .unwrap_or_default();

    let geoid_m = parse_optional_f64(fields[11])
        .map_err(|_| malformed(line, "invalid geoid separation"))?
        .unwrap_or_default();

    Ok(Sentence::Gga(
        time,
        Some(Gga {
            lat_deg,
            lon_deg,
            quality,
            num_satellites,
            hdop,
            altitude_m,
            geoid_m,
        }),
    ))
}

fn parse_rmc(line: &str, fields: &[&str]) -> Result<Sentence, Failure> {
    if fields.len() < 10 {
        return Err(malformed(line, "incomplete RMC"));
    }

    let time = parse_time_of_day(fields[1]).ok_or_else(|| malformed(line, "invalid time"))?;

    let date = if fields[9].is_empty() {
        None
    } else {
        Some(parse_date(fields[9]).ok_or_else(|| malformed(line, "invalid date"))?)
    };

    let speed_m_s = parse_optional_f64(fields[7])
        .map_err(|_| malformed(line, "invalid speed"))?
        .map(|knots| knots * KNOTS_TO_M_S);

    let course_deg = parse_optional_f64(fields[8]).map_err(|_| malformed(line, "invalid course"))?;

    Ok(Sentence::Rmc(
        time,
        Rmc {
            active: fields[2] == "A",
            date,
            speed_m_s,
            course_deg,
        },
    ))
}

fn parse_gst(line: &str, fields: &[&str]) -> Result<Sentence, Failure> {
    if fields.len() < 9 {
        return Err(malformed(line, "incomplete GST"));
    }

    let time = parse_time_of_day(fields[1]).ok_or_else(|| malformed(line, "invalid time"))?;

    let sigma_lat_m = fields[6]
        .parse::<f64>()
        .map_err(|_| malformed(line, "invalid latitude error"))?;

    let sigma_lon_m = fields[7]
        .parse::<f64>()
        .map_err(|_| malformed(line, "invalid longitude error"))?;

    Ok(Sentence::Gst(
        time,
        Gst {
            sigma_lat_m,
            sigma_lon_m,
        },
    ))
}

fn parse_pubx(line: &str, fields: &[&str]) -> Result<Sentence, Failure> {
    if fields.get(1) != Some(&"04") {
        return Ok(Sentence::Other(format!("PUBX,{}", fields.get(1).unwrap_or(&""))));
    }

    if fields.len() < 7 {
        return Err(malformed(line, "incomplete PUBX,04"));
    }

    let time = parse_time_of_day(fields[2]).ok_or_else(|| malformed(line, "invalid time"))?;
    let date = parse_date(fields[3]);

    // "18D" is the firmware default, not a confirmed value
    let leap = fields[6];
    let leap_seconds = if leap.ends_with('D') {
        None
    } else {
        Some(
            leap.parse::<i32>()
                .map_err(|_| malformed(line, "invalid leap seconds"))?,
        )
    };

    Ok(Sentence::PubxTime(time, date, leap_seconds))
}

/// Sentences gathered for one time of day
#[derive(Debug, Clone)]
struct PendingEpoch {
    time: TimeOfDay,
    gga: Option<Option<Gga>>,
    rmc: Option<Rmc>,
    gst: Option<Gst>,
    date: Option<Date>,
    leap_seconds: Option<i32>,
}

impl PendingEpoch {
    fn new(time: TimeOfDay) -> Self {
        Self {
            time,
            gga: None,
            rmc: None,
            gst: None,
            date: None,
            leap_seconds: None,
        }
    }

    fn latch(&mut self, sentence: Sentence) {
        match sentence {
            Sentence::Gga(_, gga) => self.gga = Some(gga),
            Sentence::Rmc(_, rmc) => {
                if rmc.date.is_some() {
                    self.date = rmc.date;
                }
                self.rmc = Some(rmc);
            },
            Sentence::Gst(_, gst) => self.gst = Some(gst),
            Sentence::PubxTime(_, date, leap_seconds) => {
                if date.is_some() {
                    self.date = date;
                }
                if leap_seconds.is_some() {
                    self.leap_seconds = leap_seconds;
                }
            },
            Sentence::Other(_) => {},
        }
    }
}

/// NMEA-0183 receiver.
///
/// GGA carries no date: epochs reuse the latest date received through RMC or
/// PUBX,04, incremented by one day when the time of day wraps around midnight.
/// Only a single rollover is tracked, so a stream running more than one day
/// without any dated sentence reports wrong dates.
#[derive(Debug)]
pub struct NmeaReceiver {
    interface: Interface,
    buffer: Vec<u8>,
    line: Vec<u8>,
    uere_m: f64,
    /// Latest date, with the time of day it was valid for
    date: Option<(Date, TimeOfDay)>,
    pending: Option<PendingEpoch>,
}

impl NmeaReceiver {
    /// Binds a new [NmeaReceiver] to this [Interface].
    /// `uere_m` is the ranging error used to convert HDOP to meters,
    /// when the receiver does not stream GST.
    pub fn new(interface: Interface, uere_m: f64) -> Self {
        Self {
            interface,
            uere_m,
            date: None,
            pending: None,
            line: Vec::with_capacity(MAX_SENTENCE_LEN),
            buffer: Vec::with_capacity(READ_SIZE),
        }
    }

    /// Returns the next complete line. Partial content is returned when
    /// the source ends without a final line feed.
    fn next_line(&mut self) -> Result<String, Failure> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                return Ok(String::from_utf8_lossy(&line).trim().to_string());
            }

            if self.buffer.len() > MAX_SENTENCE_LEN {
                let garbage = self.buffer.len();
                self.buffer.clear();
                return Err(Failure::Malformed(format!(
                    "{} bytes without line termination",
                    garbage
                )));
            }

            self.line.resize(READ_SIZE, 0);

            match self.interface.read_interface(&mut self.line) {
                Ok(size) => self.buffer.extend_from_slice(&self.line[..size]),
                Err(failure) if failure.is_permanent() && !self.buffer.is_empty() => {
                    let line = std::mem::take(&mut self.buffer);
                    return Ok(String::from_utf8_lossy(&line).trim().to_string());
                },
                Err(failure) => return Err(failure),
            }
        }
    }

    /// Converts a completed [PendingEpoch] to an [Observation]
    fn release(&mut self, epoch: PendingEpoch) -> Result<Observation, Failure> {
        let (date, days) = match epoch.date {
            Some(date) => {
                self.date = Some((date, epoch.time));
                (date, 0)
            },
            None => match self.date {
                // midnight crossed since the date was received
                Some((date, latched)) if epoch.time < latched => (date, 1),
                Some((date, _)) => (date, 0),
                None => {
                    debug!("{:?} - date unknown", epoch.time);
                    return Err(Failure::NoFix);
                },
            },
        };

        let gga = match epoch.gga {
            Some(Some(gga)) => gga,
            _ => return Err(Failure::NoFix),
        };

        let utc = utc_from_gregorian(
            date.year,
            date.month,
            date.day,
            epoch.time.hour,
            epoch.time.minute,
            epoch.time.second,
            0,
        )? + Duration::from_total_nanoseconds(epoch.time.nanos as i128)
            + Duration::from_days(days as f64);

        let position =
            Position::from_geodetic(gga.lat_deg, gga.lon_deg, gga.altitude_m + gga.geoid_m);

        let velocity = match epoch.rmc {
            Some(Rmc {
                active: true,
                speed_m_s: Some(speed),
                course_deg,
                ..
            }) => {
                let (sin, cos) = course_deg.unwrap_or_default().to_radians().sin_cos();
                Velocity::from_ned(gga.lat_deg, gga.lon_deg, speed * cos, speed * sin, 0.0)
            },
            _ => Velocity::default(),
        };

        let cep_m = match epoch.gst {
            Some(gst) => cep_from_sigmas(gst.sigma_lat_m, gst.sigma_lon_m),
            None => cep_from_horizontal_accuracy(gga.hdop.unwrap_or(1.0) * self.uere_m),
        };

        Ok(Observation {
            timestamp: Timestamp::Utc(utc),
            leap_seconds: epoch.leap_seconds,
            position,
            velocity,
            cep_m,
        })
    }
}

impl Receiver for NmeaReceiver {
    fn next_observation(&mut self) -> Result<Observation, Failure> {
        loop {
            let line = match self.next_line() {
                Ok(line) => line,
                Err(failure) if failure.is_permanent() => {
                    // flush last epoch
                    if let Some(pending) = self.pending.take() {
                        return self.release(pending);
                    }
                    return Err(failure);
                },
                Err(failure) => return Err(failure),
            };

            if line.is_empty() {
                continue;
            }

            let sentence = parse_sentence(&line)?;
            trace!("{:?}", sentence);

            let time = match sentence.time_of_day() {
                Some(time) => time,
                None => continue,
            };

            match self.pending.as_mut() {
                Some(pending) if pending.time == time => {
                    pending.latch(sentence);
                },
                _ => {
                    let mut next = PendingEpoch::new(time);
                    next.latch(sentence);

                    if let Some(completed) = self.pending.replace(next) {
                        return self.release(completed);
                    }
                },
            }
        }
    }

    fn describe(&self) -> String {
        if self.interface.is_read_only() {
            "NMEA-0183 (passive)".to_string()
        } else {
            "NMEA-0183".to_string()
        }
    }
}
