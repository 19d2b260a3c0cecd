//! Alert delivery states recorded per (user, trade) pair.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::id::{TxHash, UserId};

/// Persistent state of one alert delivery.
///
/// `Sending` is the claim taken before the channel is called; every other
/// state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    Sending,
    Dispatched,
    Suppressed,
    Failed,
}

impl DispatchState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Dispatched => "dispatched",
            Self::Suppressed => "suppressed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Sending)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sending" => Ok(Self::Sending),
            "dispatched" => Ok(Self::Dispatched),
            "suppressed" => Ok(Self::Suppressed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown dispatch state '{other}'")),
        }
    }
}

/// A row of the dispatch log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub owner: UserId,
    pub tx_hash: TxHash,
    pub state: DispatchState,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Result of trying to claim a (user, trade) pair for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// No prior record existed; the caller now owns delivery.
    Acquired,
    /// A record already exists in the given state; do not send.
    Existing(DispatchState),
}

/// Terminal outcome of evaluating one trade for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Dispatched,
    Suppressed(SuppressReason),
    Failed(String),
    /// Already handled in a previous run.
    Duplicate(DispatchState),
}

/// Why an alert was not delivered without being an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    Filtered(String),
    NoBinding,
    BindingInactive,
    EndpointRejected,
    StaleTrade,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filtered(reason) => write!(f, "filtered: {reason}"),
            Self::NoBinding => f.write_str("no channel binding"),
            Self::BindingInactive => f.write_str("channel binding inactive"),
            Self::EndpointRejected => f.write_str("endpoint rejected delivery"),
            Self::StaleTrade => f.write_str("trade older than alert window"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_storage_name() {
        for state in [
            DispatchState::Sending,
            DispatchState::Dispatched,
            DispatchState::Suppressed,
            DispatchState::Failed,
        ] {
            assert_eq!(state.as_str().parse::<DispatchState>().unwrap(), state);
        }
        assert!("bogus".parse::<DispatchState>().is_err());
    }

    #[test]
    fn only_sending_is_non_terminal() {
        assert!(!DispatchState::Sending.is_terminal());
        assert!(DispatchState::Dispatched.is_terminal());
        assert!(DispatchState::Failed.is_terminal());
    }
}
