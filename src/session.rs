use log::{debug, info, warn};

use crate::{
    epoch::EpochRecord,
    error::Failure,
    label::Label,
    receiver::{Observation, Receiver},
};

/// GPS - UTC offset in force since 2017-01-01 (s)
pub const DEFAULT_LEAP_SECONDS: i32 = 18;

/// Lifecycle of a [Session]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// No epoch was ever accepted
    #[default]
    Uninitialized,
    /// At least one epoch was accepted
    Valid,
    /// Receiver will never produce another epoch. Terminal.
    Exhausted,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Valid => write!(f, "valid"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// [Session] binds one [Receiver] to its identity, and keeps the
/// latest committed [EpochRecord] together with the leap second state.
///
/// `advance_epoch` is the only way to mutate the epoch state: the record is
/// replaced as a whole, or not at all.
#[derive(Debug)]
pub struct Session<R: Receiver> {
    receiver: R,
    label: Label,
    state: State,
    leap_seconds: i32,
    record: Option<EpochRecord>,
    failure: Option<Failure>,
    accepted: u64,
}

impl<R: Receiver> Session<R> {
    /// Binds a new [Session] to this [Receiver].
    /// The session is [State::Uninitialized] until the first successful
    /// [Self::advance_epoch].
    pub fn new(receiver: R, label: impl Into<Label>) -> Self {
        Self {
            receiver,
            label: label.into(),
            state: State::Uninitialized,
            leap_seconds: DEFAULT_LEAP_SECONDS,
            record: None,
            failure: None,
            accepted: 0,
        }
    }

    /// Returns [Session] with initial leap second offset,
    /// used until the receiver announces one.
    pub fn with_leap_seconds(mut self, leap_seconds: i32) -> Self {
        self.leap_seconds = leap_seconds;
        self
    }

    /// Tries to acquire the next epoch.
    ///
    /// ## Returns
    /// - true when a new [EpochRecord] was committed. The error state is cleared.
    /// - false otherwise. The previous record is preserved and the error state
    ///   is set; see [Self::last_failure] for its cause. Once [State::Exhausted]
    ///   is reached, the receiver is not solicited anymore.
    pub fn advance_epoch(&mut self) -> bool {
        if self.state == State::Exhausted {
            return false;
        }

        let resolved = self
            .receiver
            .next_observation()
            .and_then(|observation| self.resolve(observation));

        match resolved {
            Ok(record) => {
                if record.leap_seconds != self.leap_seconds {
                    info!(
                        "{} - {} - leap seconds update: {}s -> {}s",
                        record.time, self.label, self.leap_seconds, record.leap_seconds
                    );
                }

                debug!("{} - {}", self.label, record);

                self.leap_seconds = record.leap_seconds;
                self.record = Some(record);
                self.failure = None;
                self.state = State::Valid;
                self.accepted += 1;
                true
            },
            Err(failure) => {
                if failure.is_permanent() {
                    info!("{} - {} (exhausted)", self.label, failure);
                    self.state = State::Exhausted;
                } else {
                    warn!("{} - {}", self.label, failure);
                }
                self.failure = Some(failure);
                false
            },
        }
    }

    /// Resolves an [Observation] against current leap second state
    /// and verifies it may follow the current record.
    fn resolve(&self, observation: Observation) -> Result<EpochRecord, Failure> {
        let leap_seconds = observation.leap_seconds.unwrap_or(self.leap_seconds);
        let time = observation.timestamp.resolve(leap_seconds);

        if let Some(current) = &self.record {
            if time < current.time {
                return Err(Failure::NonMonotonic {
                    committed: current.time.to_string(),
                    received: time.to_string(),
                });
            }
        }

        let position = observation.position;
        let velocity = observation.velocity;

        let finite = [
            position.x_m,
            position.y_m,
            position.z_m,
            velocity.x_m_s,
            velocity.y_m_s,
            velocity.z_m_s,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite || !observation.cep_m.is_finite() || observation.cep_m < 0.0 {
            return Err(Failure::Malformed(
                "non finite solution or negative uncertainty".to_string(),
            ));
        }

        Ok(EpochRecord {
            time,
            leap_seconds,
            position,
            velocity,
            cep_m: observation.cep_m,
        })
    }

    /// Returns the last committed [EpochRecord].
    /// None means uninitialized: no epoch was ever accepted (since last reset).
    pub fn current_epoch(&self) -> Option<EpochRecord> {
        self.record
    }

    /// Returns the [Label] of this [Session]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// True when the latest [Self::advance_epoch] failed.
    pub fn has_error(&self) -> bool {
        self.failure.is_some()
    }

    /// Cause of the latest failure, if any
    pub fn last_failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Leap second offset currently in force (s)
    pub fn leap_seconds(&self) -> i32 {
        self.leap_seconds
    }

    /// Number of epochs committed since deployment (or last reset)
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Read-only access to the underlying [Receiver]
    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Returns to [State::Uninitialized]: drops current record and error state.
    /// Leap second state is preserved. Has no effect on an exhausted session.
    pub fn reset(&mut self) {
        if self.state == State::Exhausted {
            return;
        }

        self.record = None;
        self.failure = None;
        self.accepted = 0;
        self.state = State::Uninitialized;
    }

    /// Releases the [Receiver]
    pub fn into_receiver(self) -> R {
        self.receiver
    }
}
