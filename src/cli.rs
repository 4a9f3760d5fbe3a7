use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};
use std::path::PathBuf;

use kinematic_rx::prelude::{Duration, Label, Protocol, Settings, Source};

fn parse_duration(value: &str) -> Result<Duration, String> {
    value
        .trim()
        .parse::<Duration>()
        .map_err(|e| format!("invalid duration: {}", e))
}

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("kinematic-rx")
                    .author("Guillaume W. Bres, <guillaume.bressaix@gmail.com>")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("GNSS receiver epoch streamer, for kinematic positioning")
                    .color(ColorChoice::Always)
                    .arg_required_else_help(true)
                    .next_help_heading("Serial port (Active device, GNSS module)")
                    .arg(
                        Arg::new("port")
                            .short('p')
                            .long("port")
                            .value_name("PORT")
                            .required_unless_present_any(["file", "tcp"])
                            .conflicts_with_all(["file", "tcp"])
                            .help("Define serial port. Example /dev/ttyUSB0 on Linux")
                    )
                    .arg(
                        Arg::new("baudrate")
                            .short('b')
                            .long("baud")
                            .required(false)
                            .value_name("Baudrate (u32)")
                            .value_parser(value_parser!(u32))
                            .help("Define serial port baud rate. Communications will not work if your receiver streams at a different data-rate. By default we use 115_200"),
                    )
                    .next_help_heading("Network interface")
                    .arg(
                        Arg::new("tcp")
                            .long("tcp")
                            .value_name("HOST:PORT")
                            .required_unless_present_any(["file", "port"])
                            .conflicts_with("file")
                            .help("Stream from a TCP server. Example 192.168.1.10:2101")
                    )
                    .next_help_heading("File interface (Passive mode)")
                    .arg(
                        Arg::new("file")
                            .long("file")
                            .short('f')
                            .value_name("FILENAME")
                            .action(ArgAction::Append)
                            .value_parser(value_parser!(PathBuf))
                            .required_unless_present_any(["port", "tcp"])
                            .help("Load a single file. Use as many as needed.
Each file descriptor is consumed one after the other. You might have to load them according
to their sampling chronology to make sure. Gzip file are supported but they must be terminated with '.gz'")
                    )
                    .next_help_heading("Receiver")
                    .arg(
                        Arg::new("nmea")
                            .long("nmea")
                            .action(ArgAction::SetTrue)
                            .help("Receiver streams NMEA-0183 sentences. Default is U-Blox UBX."),
                    )
                    .arg(
                        Arg::new("name")
                            .long("name")
                            .short('n')
                            .required(false)
                            .action(ArgAction::Set)
                            .help("Define a custom name (serial number, marker..), limited to 20 characters.
When not defined, the default value is \"KRX\".")
                    )
                    .arg(
                        Arg::new("leap")
                            .long("leap")
                            .value_parser(value_parser!(i32))
                            .action(ArgAction::Set)
                            .help("Initial GPST - UTC leap seconds, until the receiver announces them. Default is 18.")
                    )
                    .arg(
                        Arg::new("uere")
                            .long("uere")
                            .value_parser(value_parser!(f64))
                            .action(ArgAction::Set)
                            .help("User equivalent range error (meters), to convert HDOP to meters
when the receiver does not stream error statistics. Default is 5m.")
                    )
                    .arg(
                        Arg::new("period")
                            .long("period")
                            .action(ArgAction::Set)
                            .value_parser(parse_duration)
                            .help("Measurement period of active U-Blox modules. Default is 1s.")
                    )
                    .arg(
                        Arg::new("timeout")
                            .long("timeout")
                            .action(ArgAction::Set)
                            .value_parser(parse_duration)
                            .help("Read timeout of active interfaces. Default is 2s.")
                    )
                    .next_help_heading("Output")
                    .arg(
                        Arg::new("json")
                            .long("json")
                            .action(ArgAction::SetTrue)
                            .help("Print each epoch as a JSON line on stdout, instead of logging it.")
                    )
                    .get_matches()
            },
        }
    }

    /// True if epochs should be printed as JSON
    pub fn json(&self) -> bool {
        self.matches.get_flag("json")
    }

    fn source(&self) -> Source {
        if let Some(port) = self.matches.get_one::<String>("port") {
            Source::Serial {
                port: port.to_string(),
                baud: self
                    .matches
                    .get_one::<u32>("baudrate")
                    .copied()
                    .unwrap_or(115_200),
            }
        } else if let Some(address) = self.matches.get_one::<String>("tcp") {
            Source::Tcp(address.to_string())
        } else if let Some(files) = self.matches.get_many::<PathBuf>("file") {
            Source::Files(files.cloned().collect())
        } else {
            Source::Files(Vec::new())
        }
    }

    pub fn settings(&self) -> Settings {
        let default = Settings::default();

        Settings {
            source: self.source(),
            protocol: if self.matches.get_flag("nmea") {
                Protocol::Nmea
            } else {
                Protocol::Ubx
            },
            label: match self.matches.get_one::<String>("name") {
                Some(name) => Label::new(name),
                None => default.label,
            },
            leap_seconds: self
                .matches
                .get_one::<i32>("leap")
                .copied()
                .unwrap_or(default.leap_seconds),
            uere_m: self
                .matches
                .get_one::<f64>("uere")
                .copied()
                .unwrap_or(default.uere_m),
            measurement_period: self
                .matches
                .get_one::<Duration>("period")
                .copied()
                .unwrap_or(default.measurement_period),
            timeout: self
                .matches
                .get_one::<Duration>("timeout")
                .copied()
                .unwrap_or(default.timeout),
        }
    }
}
