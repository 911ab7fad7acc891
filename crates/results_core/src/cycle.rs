use std::fmt;

/// Where one fetch cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    AwaitingSessionPage,
    SubmittingForm,
    ParsingResults,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    /// Lookup GET issued.
    Start,
    /// Lookup page answered with a success status.
    SessionEstablished,
    /// Form POST answered with a success status.
    FormAccepted,
    /// Records and session token extracted; an empty list still counts.
    ResultsParsed,
    /// Transport failure or non-success status.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event {event:?} is not valid in state {state}")]
pub struct TransitionError {
    pub state: CycleState,
    pub event: CycleEvent,
}

impl CycleState {
    /// Pure transition function. Cycles are strictly sequential; `Fail` is
    /// accepted from any in-flight state.
    pub fn advance(self, event: CycleEvent) -> Result<CycleState, TransitionError> {
        use CycleEvent as E;
        use CycleState as S;

        let next = match (self, event) {
            (S::Idle | S::Done | S::Failed, E::Start) => S::AwaitingSessionPage,
            (S::AwaitingSessionPage, E::SessionEstablished) => S::SubmittingForm,
            (S::SubmittingForm, E::FormAccepted) => S::ParsingResults,
            (S::ParsingResults, E::ResultsParsed) => S::Done,
            (state, E::Fail) if state.is_in_flight() => S::Failed,
            (state, event) => return Err(TransitionError { state, event }),
        };
        Ok(next)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            CycleState::AwaitingSessionPage | CycleState::SubmittingForm | CycleState::ParsingResults
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Done | CycleState::Failed)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleState::Idle => "idle",
            CycleState::AwaitingSessionPage => "awaiting session page",
            CycleState::SubmittingForm => "submitting form",
            CycleState::ParsingResults => "parsing results",
            CycleState::Done => "done",
            CycleState::Failed => "failed",
        };
        f.write_str(label)
    }
}
