use flate2::read::MultiGzDecoder;
use log::{debug, error};
use serialport::SerialPort;

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufReader, ErrorKind, Read, Write},
    net::TcpStream,
    path::Path,
    time::Duration,
};

use crate::error::{Error, Failure};

/// [Interface] to the receiver stream
pub enum Interface {
    /// [Interface::ReadOnly] is dedicated to read only input, mainly File inputs.
    /// Handles are consumed one after the other.
    ReadOnly(VecDeque<Box<dyn Read + Send>>),

    /// [Interface::Port] is used to connect to a physical port,
    /// and actively operate a GNSS module.
    Port(Box<dyn SerialPort>),

    /// [Interface::Tcp] streams from a network server.
    Tcp(TcpStream),
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly(stack) => write!(f, "ReadOnly({} handles)", stack.len()),
            Self::Port(port) => write!(f, "Port({:?})", port.name()),
            Self::Tcp(stream) => write!(f, "Tcp({:?})", stream.peer_addr().ok()),
        }
    }
}

impl Interface {
    /// Creates a new [SerialPort] interface
    pub fn from_serial_port(port: Box<dyn SerialPort>) -> Self {
        Self::Port(port)
    }

    /// Opens a serial port with given read timeout.
    pub fn open_serial_port(port: &str, baud: u32, timeout: Duration) -> Result<Self, Error> {
        let port = serialport::new(port, baud).timeout(timeout).open()?;
        Ok(Self::from_serial_port(port))
    }

    /// Connects to a TCP server with given read timeout.
    pub fn connect_tcp(address: &str, timeout: Duration) -> Result<Self, Error> {
        let stream = TcpStream::connect(address)?;
        stream.set_read_timeout(Some(timeout))?;
        Ok(Self::Tcp(stream))
    }

    /// Creates a new Read-Only interface from any reader
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::ReadOnly(VecDeque::from([Box::new(reader) as Box<dyn Read + Send>]))
    }

    /// Creates a new Read-Only interface
    pub fn from_file_handle(handle: File) -> Self {
        Self::from_reader(BufReader::new(handle))
    }

    /// Creates a new Read-Only interface from a gzip compressed file
    pub fn from_gzip_file_handle(handle: File) -> Self {
        Self::from_reader(MultiGzDecoder::new(BufReader::new(handle)))
    }

    /// Opens all files, in order, as a single Read-Only interface.
    /// Files terminated by ".gz" are decompressed on the fly.
    pub fn open_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(Error::NoInput);
        }

        let mut interface = Self::ReadOnly(VecDeque::with_capacity(paths.len()));

        for path in paths.iter() {
            let path = path.as_ref();
            let fd = File::open(path)?;

            if path.extension().is_some_and(|ext| ext == "gz") {
                interface.stack_gzip_file_handle(fd);
            } else {
                interface.stack_file_handle(fd);
            }

            debug!("stacked {}", path.display());
        }

        Ok(interface)
    }

    /// Stacks a new file handle, consumed after all previous ones.
    /// Has no effect on active interfaces.
    pub fn stack_file_handle(&mut self, handle: File) {
        if let Self::ReadOnly(stack) = self {
            stack.push_back(Box::new(BufReader::new(handle)));
        }
    }

    /// Stacks a new gzip compressed file handle.
    /// Has no effect on active interfaces.
    pub fn stack_gzip_file_handle(&mut self, handle: File) {
        if let Self::ReadOnly(stack) = self {
            stack.push_back(Box::new(MultiGzDecoder::new(BufReader::new(handle))));
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly(_))
    }

    pub fn is_serial_port(&self) -> bool {
        matches!(self, Self::Port(_))
    }

    /// Reads the [Interface], converting every outcome into the
    /// receiver failure taxonomy:
    /// - timeouts are "no data received", which is transient
    ///   for real-time perpetual hardware
    /// - end of the last file, or closed connection, is permanent
    pub fn read_interface(&mut self, output: &mut [u8]) -> Result<usize, Failure> {
        match self.read(output) {
            Ok(0) => match self {
                Self::ReadOnly(_) => Err(Failure::EndOfData),
                Self::Tcp(_) => Err(Failure::Disconnected("connection closed".to_string())),
                Self::Port(_) => Err(Failure::Timeout),
            },
            Ok(size) => Ok(size),
            Err(e) => match e.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock => Err(Failure::Timeout),
                ErrorKind::Interrupted => Err(Failure::Unavailable(e.to_string())),
                ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof
                    if self.is_read_only() =>
                {
                    // corrupted content (gzip stream..): drop this handle
                    error!("i/o error: {}", e);
                    if let Self::ReadOnly(stack) = self {
                        stack.pop_front();
                    }
                    Err(Failure::Malformed(e.to_string()))
                },
                ErrorKind::BrokenPipe
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::NotConnected
                | ErrorKind::NotFound => Err(Failure::Disconnected(e.to_string())),
                _ => {
                    if self.is_read_only() {
                        Err(Failure::Disconnected(e.to_string()))
                    } else {
                        Err(Failure::Unavailable(e.to_string()))
                    }
                },
            },
        }
    }
}

impl Read for Interface {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::ReadOnly(stack) => {
                while let Some(handle) = stack.front_mut() {
                    let size = handle.read(buf)?;
                    if size > 0 {
                        return Ok(size);
                    }
                    stack.pop_front();
                }
                Ok(0)
            },
            Self::Port(port) => port.read(buf),
            Self::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for Interface {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::ReadOnly(_) => Ok(buf.len()),
            Self::Port(port) => port.write(buf),
            Self::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::ReadOnly(_) => Ok(()),
            Self::Port(port) => port.flush(),
            Self::Tcp(stream) => stream.flush(),
        }
    }
}
