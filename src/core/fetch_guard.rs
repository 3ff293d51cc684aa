// Single-flight guard for event downloads: a selection made while a request
// is in flight is refused and the caller puts the displayed selection back

use tracing::{debug, warn};

use crate::core::error::{Result, WfbError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching { requested: u64 },
}

#[derive(Debug, Default)]
pub struct FetchGuard {
    state: FetchState,
    displayed: Option<u64>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Event currently on screen, the one a refused selection reverts to.
    pub fn displayed(&self) -> Option<u64> {
        self.displayed
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, FetchState::Fetching { .. })
    }

    pub fn begin(&mut self, event_id: u64) -> Result<()> {
        match self.state {
            FetchState::Fetching { requested } => {
                debug!("fetch for {} refused, {} still in flight", event_id, requested);
                Err(WfbError::FetchInProgress { pending: requested })
            }
            FetchState::Idle => {
                self.state = FetchState::Fetching { requested: event_id };
                Ok(())
            }
        }
    }

    /// Record a response. Returns the id now displayed.
    pub fn complete(&mut self, received: u64) -> Option<u64> {
        match self.state {
            FetchState::Fetching { requested } => {
                if received != requested {
                    warn!("received event {} but requested {}", received, requested);
                }
                self.state = FetchState::Idle;
                self.displayed = Some(received);
            }
            FetchState::Idle => {
                warn!("response for event {} arrived with no fetch in flight", received);
            }
        }
        self.displayed
    }

    pub fn fail(&mut self) {
        if let FetchState::Fetching { requested } = self.state {
            debug!("fetch for {} failed", requested);
        }
        self.state = FetchState::Idle;
    }
}
