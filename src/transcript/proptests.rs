//! Property-based tests for the transcript state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_subject() -> impl Strategy<Value = Subject> {
    prop::sample::select(vec!["f1", "f2", "f3"]).prop_map(|id| Subject::new(id, format!("{id}.txt")))
}

fn arb_epoch() -> impl Strategy<Value = u64> {
    0u64..5
}

fn arb_entries() -> impl Strategy<Value = Vec<HistoryEntry>> {
    proptest::collection::vec(
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(q, a)| HistoryEntry::new(q, a)),
        0..4,
    )
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_subject().prop_map(|subject| Event::SelectSubject { subject, notice: None }),
        Just(Event::ClearSubject),
        prop::sample::select(vec!["f1", "f2", "f3"]).prop_map(|id| Event::SubjectDeleted {
            subject_id: id.to_string()
        }),
        "[a-z ]{0,8}".prop_map(|text| Event::SubmitQuestion { text }),
        "[a-z]{1,8}".prop_map(|text| Event::SystemNotice { text }),
        (arb_epoch(), arb_entries()).prop_map(|(epoch, entries)| Event::HistoryLoaded { epoch, entries }),
        (arb_epoch(), "[a-z]{1,8}").prop_map(|(epoch, message)| Event::HistoryFailed { epoch, message }),
        (arb_epoch(), "[a-z]{1,8}").prop_map(|(epoch, answer)| Event::AnswerReceived { epoch, answer }),
        (arb_epoch(), "[a-z]{1,8}").prop_map(|(epoch, message)| Event::AskFailed { epoch, message }),
    ]
}

fn run(events: Vec<Event>) -> Vec<(Transcript, Event, Result<TransitionResult, TransitionError>)> {
    let mut state = Transcript::new();
    let mut trace = Vec::new();
    for event in events {
        let result = transition(&state, event.clone());
        let before = state.clone();
        if let Ok(r) = &result {
            state = r.new_state.clone();
        }
        trace.push((before, event, result));
    }
    trace
}

proptest! {
    #[test]
    fn prop_rejections_are_distinguishable_from_no_ops(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, event, result) in run(events) {
            if let Err(TransitionError::Busy) = result {
                prop_assert!(before.is_busy(), "busy rejection outside Sending: {:?}", event);
            }
            if let Err(TransitionError::NoSubject) = result {
                prop_assert!(before.subject.is_none());
            }
        }
    }

    #[test]
    fn prop_subject_and_phase_agree(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (_, _, result) in run(events) {
            if let Ok(r) = result {
                let state = &r.new_state;
                prop_assert_eq!(state.subject.is_none(), state.phase == Phase::NoSubject);
            }
        }
    }

    #[test]
    fn prop_history_is_a_prefix(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (_, _, result) in run(events) {
            if let Ok(r) = result {
                let turns = &r.new_state.turns;
                if let Some(first_live) = turns.iter().position(|t| matches!(t.kind(), TurnKind::User | TurnKind::Bot)) {
                    prop_assert!(
                        turns[first_live..].iter().all(|t| t.kind() != TurnKind::HistoryPair),
                        "history after live turn: {:?}", turns
                    );
                }
            }
        }
    }

    #[test]
    fn prop_turns_only_grow_within_an_epoch(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, _, result) in run(events) {
            if let Ok(r) = result {
                let after = &r.new_state;
                if after.epoch == before.epoch && before.phase != Phase::Hydrating {
                    prop_assert!(after.turns.len() >= before.turns.len());
                    prop_assert_eq!(&after.turns[..before.turns.len()], &before.turns[..]);
                }
                prop_assert!(after.epoch >= before.epoch);
            }
        }
    }

    #[test]
    fn prop_at_most_one_ask_per_flight(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, _, result) in run(events) {
            if let Ok(r) = result {
                let asks = r.effects.iter().filter(|e| matches!(e, Effect::Ask { .. })).count();
                prop_assert!(asks <= 1);
                if asks == 1 {
                    prop_assert_eq!(before.phase, Phase::Live);
                    prop_assert!(r.new_state.is_busy());
                }
            }
        }
    }

    #[test]
    fn prop_completed_ask_adds_exactly_one_bot_turn(
        subject in arb_subject(),
        question in "[a-z]{1,8}",
        succeed in any::<bool>(),
    ) {
        let hydrating = transition(&Transcript::new(), Event::SelectSubject { subject, notice: None }).unwrap().new_state;
        let live = transition(&hydrating, Event::HistoryLoaded { epoch: hydrating.epoch, entries: vec![] })
            .unwrap()
            .new_state;
        let sending = transition(&live, Event::SubmitQuestion { text: question }).unwrap().new_state;
        let event = if succeed {
            Event::AnswerReceived { epoch: sending.epoch, answer: "ok".to_string() }
        } else {
            Event::AskFailed { epoch: sending.epoch, message: "down".to_string() }
        };
        let done = transition(&sending, event).unwrap().new_state;

        prop_assert_eq!(done.turns.len(), live.turns.len() + 2);
        prop_assert_eq!(done.turns[done.turns.len() - 2].kind(), TurnKind::User);
        prop_assert_eq!(done.turns[done.turns.len() - 1].kind(), TurnKind::Bot);
        prop_assert!(!done.is_busy());
    }

    #[test]
    fn prop_stale_completions_never_change_state(
        events in proptest::collection::vec(arb_event(), 0..40)
    ) {
        for (before, event, result) in run(events) {
            if let Some(epoch) = event.completion_epoch() {
                if epoch != before.epoch {
                    prop_assert_eq!(result.unwrap_err(), TransitionError::Stale(epoch));
                }
            }
        }
    }
}
