use results_core::{CycleEvent, CycleState, TransitionError};

#[test]
fn happy_path_reaches_done() {
    let events = [
        CycleEvent::Start,
        CycleEvent::SessionEstablished,
        CycleEvent::FormAccepted,
        CycleEvent::ResultsParsed,
    ];
    let mut state = CycleState::Idle;
    let mut visited = vec![state];
    for event in events {
        state = state.advance(event).unwrap();
        visited.push(state);
    }
    assert_eq!(
        visited,
        vec![
            CycleState::Idle,
            CycleState::AwaitingSessionPage,
            CycleState::SubmittingForm,
            CycleState::ParsingResults,
            CycleState::Done,
        ]
    );
    assert!(state.is_terminal());
}

#[test]
fn failure_is_reachable_from_every_in_flight_state() {
    for state in [
        CycleState::AwaitingSessionPage,
        CycleState::SubmittingForm,
        CycleState::ParsingResults,
    ] {
        assert_eq!(state.advance(CycleEvent::Fail), Ok(CycleState::Failed));
    }
}

#[test]
fn failure_is_rejected_outside_a_cycle() {
    assert_eq!(
        CycleState::Idle.advance(CycleEvent::Fail),
        Err(TransitionError {
            state: CycleState::Idle,
            event: CycleEvent::Fail
        })
    );
    assert!(CycleState::Done.advance(CycleEvent::Fail).is_err());
}

#[test]
fn steps_cannot_be_skipped() {
    assert!(CycleState::Idle.advance(CycleEvent::FormAccepted).is_err());
    assert!(CycleState::AwaitingSessionPage
        .advance(CycleEvent::ResultsParsed)
        .is_err());
}

#[test]
fn terminal_states_can_start_a_new_cycle() {
    assert_eq!(
        CycleState::Failed.advance(CycleEvent::Start),
        Ok(CycleState::AwaitingSessionPage)
    );
    assert_eq!(
        CycleState::Done.advance(CycleEvent::Start),
        Ok(CycleState::AwaitingSessionPage)
    );
}
