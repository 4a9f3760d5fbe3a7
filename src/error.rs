use thiserror::Error;

/// Construction-time [Error]: the receiver could not be bound to its source,
/// no session exists.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// Passive mode requires at least one input file.
    #[error("no input: requires a serial port, a network address or at least one file")]
    NoInput,

    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The receiver never acknowledged a configuration frame.
    #[error("{0} was not acknowledged")]
    Acknowledgement(&'static str),
}

/// Recoverability of a [Failure].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Calling again may produce a new epoch.
    Transient,
    /// The source will never produce another epoch.
    Permanent,
}

/// Reason why an epoch could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("checksum mismatch (expected {expected:02X}, got {found:02X})")]
    Checksum { expected: u8, found: u8 },

    /// Nothing received within the read timeout.
    #[error("timed out waiting for data")]
    Timeout,

    #[error("source temporarily unavailable: {0}")]
    Unavailable(String),

    /// Frame decoded correctly but does not carry a usable solution.
    #[error("no valid fix")]
    NoFix,

    /// Decoded time precedes the last accepted epoch.
    #[error("non monotonic time: {received} precedes {committed}")]
    NonMonotonic { committed: String, received: String },

    #[error("end of data")]
    EndOfData,

    #[error("source disconnected: {0}")]
    Disconnected(String),
}

impl Failure {
    /// Classifies this [Failure].
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EndOfData | Self::Disconnected(_) => FailureKind::Permanent,
            _ => FailureKind::Transient,
        }
    }

    /// True when no further epoch can ever be produced.
    pub fn is_permanent(&self) -> bool {
        self.kind() == FailureKind::Permanent
    }
}
