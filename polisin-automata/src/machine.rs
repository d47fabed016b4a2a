//! Finite-state runner.
//!
//! A [`StateMachine`] pairs a shared, read-only [`Automaton`] with a cursor.
//! Many runners may drive the same automaton at once.

use crate::action::{Action, ActionSink};
use crate::error::AutomataError;
use crate::graph::{Automaton, State, StateId};
use std::fmt;
use std::sync::Arc;

/// Cursor over one automaton.
#[derive(Debug, Clone)]
pub struct StateMachine {
    automaton: Arc<Automaton>,
    current: StateId,
}

impl StateMachine {
    /// Creates a runner positioned at the automaton's initial state.
    pub fn new(automaton: Arc<Automaton>) -> Self {
        let current = automaton.initial();
        Self { automaton, current }
    }

    pub fn name(&self) -> &str {
        self.automaton.name()
    }

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn current_state(&self) -> &State {
        self.automaton.state(self.current)
    }

    pub fn initial_state(&self) -> &State {
        self.automaton.state(self.automaton.initial())
    }

    pub fn is_at_accept(&self) -> bool {
        self.current_state().is_accept()
    }

    pub fn is_at_error(&self) -> bool {
        self.current_state().is_error()
    }

    /// Returns true if a terminal transition of the current state takes `input`.
    pub fn is_valid_input(&self, input: &str) -> bool {
        self.current_state().contains_transition_for(input)
    }

    pub fn has_epsilon_now(&self) -> bool {
        self.current_state().has_epsilon()
    }

    pub fn has_calls_now(&self) -> bool {
        self.current_state().has_calls()
    }

    pub fn has_alternate_now(&self) -> bool {
        self.current_state().has_alternate()
    }

    /// Applies one input symbol.
    ///
    /// Preference order: matching terminal transition, then epsilon (after
    /// which the same input is retried), then alternate. Returns whether the
    /// input was consumed. Epsilon moves taken before a rejection are kept.
    pub fn apply(&mut self, input: &str, sink: &mut dyn ActionSink) -> bool {
        let mut epsilon_moves = 0;
        loop {
            let state = self.current_state();
            if let Some(t) = state.find_transition(input) {
                let (to, action) = (t.to(), t.action());
                self.take(to, action, sink);
                return true;
            }
            if let Some(t) = state.epsilon() {
                if epsilon_moves >= self.automaton.len() {
                    tracing::warn!(
                        machine = self.name(),
                        state = state.name(),
                        "epsilon cycle while applying '{}'",
                        input
                    );
                    return false;
                }
                epsilon_moves += 1;
                let (to, action) = (t.to(), t.action());
                self.take(to, action, sink);
                continue;
            }
            if let Some(t) = state.alternate() {
                let (to, action) = (t.to(), t.action());
                self.take(to, action, sink);
                return true;
            }
            return false;
        }
    }

    /// Takes the current state's epsilon transition, if any.
    ///
    /// Returns whether the machine is at an accept state afterwards.
    pub fn step_epsilon(&mut self, sink: &mut dyn ActionSink) -> bool {
        if let Some(t) = self.current_state().epsilon() {
            let (to, action) = (t.to(), t.action());
            self.take(to, action, sink);
        }
        self.is_at_accept()
    }

    /// Follows epsilon transitions until an accept state or a state without
    /// one is reached.
    ///
    /// An epsilon cycle that never meets an accept state leaves the cursor
    /// where it was. Returns whether the machine ends at an accept state.
    pub fn drive_epsilon_closure(&mut self, sink: &mut dyn ActionSink) -> bool {
        let mut path = Vec::new();
        let mut at = self.current;
        loop {
            let state = self.automaton.state(at);
            if state.is_accept() {
                break;
            }
            let Some(t) = state.epsilon() else {
                break;
            };
            if path.len() >= self.automaton.len() {
                tracing::warn!(
                    machine = self.name(),
                    state = self.current_state().name(),
                    "epsilon closure does not settle"
                );
                return self.is_at_accept();
            }
            path.push((t.to(), t.action()));
            at = t.to();
        }
        for (to, action) in path {
            self.take(to, action, sink);
        }
        self.is_at_accept()
    }

    /// Moves the caller past a completed call to `callee`, running the call's
    /// return action.
    ///
    /// Returns whether the machine is at an accept state afterwards.
    pub fn take_call_return(&mut self, callee: &str, sink: &mut dyn ActionSink) -> bool {
        if let Some(call) = self.current_state().find_call(callee) {
            let (to, action) = (call.to(), call.after());
            self.take(to, action, sink);
        }
        self.is_at_accept()
    }

    /// Returns the cursor to the initial state.
    pub fn restart(&mut self) {
        self.current = self.automaton.initial();
    }

    /// Moves the cursor to the named state without running any action.
    pub fn force_go_to(&mut self, name: &str) -> Result<(), AutomataError> {
        let id = self
            .automaton
            .state_id(name)
            .ok_or_else(|| AutomataError::UnknownState {
                machine: self.name().to_string(),
                state: name.to_string(),
            })?;
        self.current = id;
        Ok(())
    }

    pub(crate) fn jump(&mut self, id: StateId) {
        self.current = id;
    }

    /// Applies every input, then settles with the epsilon closure.
    ///
    /// Returns whether the machine ends at an accept state.
    pub fn execute<'a>(
        &mut self,
        inputs: impl IntoIterator<Item = &'a str>,
        sink: &mut dyn ActionSink,
    ) -> bool {
        for input in inputs {
            self.apply(input, sink);
        }
        self.drive_epsilon_closure(sink)
    }

    fn take(&mut self, to: StateId, action: Option<Action>, sink: &mut dyn ActionSink) {
        if let Some(action) = action {
            sink.perform(action, self.automaton.name());
        }
        self.current = to;
    }
}

impl fmt::Display for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateMachine:{}; cs:{}", self.name(), self.current_state().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Recorder(Vec<(Action, String)>);

    impl ActionSink for Recorder {
        fn perform(&mut self, action: Action, machine: &str) {
            self.0.push((action, machine.to_string()));
        }
    }

    /// `Initial --1--> s1 --ε--> s2 (accept)`, with `Initial` falling back to
    /// an error state.
    fn sample() -> Arc<Automaton> {
        let mut a = Automaton::new("B");
        let init = a.initial();
        let s1 = a.add_state("s1");
        let s2 = a.add_state("s2");
        let err = a.add_state("Error");
        a.set_accept(s2);
        a.set_error(err);
        a.add_transition(init, s1, "1", Some(Action::AppendLeaf));
        a.set_epsilon(s1, s2, None);
        a.set_alternate(init, err, None);
        a.set_alternate(err, err, None);
        Arc::new(a)
    }

    #[test]
    fn test_apply_terminal_runs_action() {
        let mut sm = StateMachine::new(sample());
        let mut log = Recorder::default();
        assert!(sm.apply("1", &mut log));
        assert_eq!(sm.current_state().name(), "s1");
        assert_eq!(log.0, vec![(Action::AppendLeaf, "B".to_string())]);
    }

    #[test]
    fn test_apply_alternate_consumes_anything() {
        let mut sm = StateMachine::new(sample());
        assert!(sm.apply("zzz", &mut ()));
        assert!(sm.is_at_error());
        assert!(sm.apply("again", &mut ()));
        assert!(sm.is_at_error());
    }

    #[test]
    fn test_apply_epsilon_then_reject_keeps_epsilon_move() {
        let mut sm = StateMachine::new(sample());
        sm.apply("1", &mut ());
        assert!(!sm.apply("0", &mut ()));
        assert_eq!(sm.current_state().name(), "s2");
        assert!(sm.is_at_accept());
    }

    #[test]
    fn test_current_state_queries() {
        let mut sm = StateMachine::new(sample());
        assert!(sm.is_valid_input("1"));
        assert!(!sm.is_valid_input("0"));
        assert!(sm.has_alternate_now());
        assert!(!sm.has_epsilon_now());
        assert!(!sm.has_calls_now());

        sm.apply("1", &mut ());
        assert!(!sm.is_valid_input("1"));
        assert!(!sm.has_alternate_now());
        assert!(sm.has_epsilon_now());
    }

    #[test]
    fn test_execute_settles_epsilon() {
        let mut sm = StateMachine::new(sample());
        assert!(sm.execute(["1"], &mut ()));
        sm.restart();
        assert!(!sm.execute(["0"], &mut ()));
    }

    #[test]
    fn test_force_go_to() {
        let mut sm = StateMachine::new(sample());
        sm.force_go_to("s2").unwrap();
        assert!(sm.is_at_accept());
        let err = sm.force_go_to("nowhere").unwrap_err();
        assert!(matches!(err, AutomataError::UnknownState { .. }));
        assert_eq!(sm.current_state().name(), "s2");
    }

    #[test]
    fn test_take_call_return() {
        let mut a = Automaton::new("A");
        let init = a.initial();
        let ret = a.add_state("ret");
        a.set_accept(ret);
        a.add_call(init, ret, "B", Some(Action::Descend), Some(Action::Ascend));
        let mut sm = StateMachine::new(Arc::new(a));
        let mut log = Recorder::default();

        assert!(sm.take_call_return("B", &mut log));
        assert_eq!(log.0, vec![(Action::Ascend, "A".to_string())]);
    }

    #[test]
    fn test_epsilon_cycle_does_not_hang() {
        let mut a = Automaton::new("C");
        let init = a.initial();
        let s1 = a.add_state("s1");
        a.set_epsilon(init, s1, None);
        a.set_epsilon(s1, init, None);
        let mut sm = StateMachine::new(Arc::new(a));

        assert!(!sm.apply("x", &mut ()));
        sm.restart();
        assert!(!sm.drive_epsilon_closure(&mut ()));
        assert_eq!(sm.current(), sm.automaton().initial());
    }

    #[test]
    fn test_display() {
        let sm = StateMachine::new(sample());
        assert_eq!(sm.to_string(), "StateMachine:B; cs:Initial");
    }

    const ALPHABET: [&str; 3] = ["a", "b", "c"];

    fn arb_automaton() -> impl Strategy<Value = Arc<Automaton>> {
        (1usize..8)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec((0..n, 0..n, 0..ALPHABET.len()), 0..16),
                    prop::collection::vec(prop::option::of(0..n), n),
                    prop::collection::vec(prop::option::weighted(0.2, 0..n), n),
                    prop::collection::vec(0u8..3, n),
                )
            })
            .prop_map(|(edges, epsilons, alternates, kinds)| {
                let mut a = Automaton::new("P");
                let ids: Vec<StateId> = (0..kinds.len())
                    .map(|i| {
                        if i == 0 {
                            a.initial()
                        } else {
                            a.add_state(format!("s{i}"))
                        }
                    })
                    .collect();
                for (i, kind) in kinds.iter().enumerate() {
                    match kind {
                        1 => a.set_accept(ids[i]),
                        2 => a.set_error(ids[i]),
                        _ => {}
                    }
                }
                for (from, to, sym) in edges {
                    a.add_transition(ids[from], ids[to], ALPHABET[sym], None);
                }
                for (i, eps) in epsilons.into_iter().enumerate() {
                    if let Some(to) = eps {
                        a.set_epsilon(ids[i], ids[to], None);
                    }
                }
                for (i, alt) in alternates.into_iter().enumerate() {
                    if let Some(to) = alt {
                        a.set_alternate(ids[i], ids[to], None);
                    }
                }
                Arc::new(a)
            })
    }

    fn arb_inputs() -> impl Strategy<Value = Vec<&'static str>> {
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 0..12)
    }

    proptest! {
        #[test]
        fn prop_restart_returns_to_initial(automaton in arb_automaton(), inputs in arb_inputs()) {
            let mut sm = StateMachine::new(automaton);
            for input in inputs {
                sm.apply(input, &mut ());
            }
            sm.restart();
            prop_assert_eq!(sm.current(), sm.automaton().initial());
        }

        #[test]
        fn prop_epsilon_closure_is_idempotent(
            automaton in arb_automaton(),
            inputs in arb_inputs(),
        ) {
            let mut sm = StateMachine::new(automaton);
            for input in inputs {
                sm.apply(input, &mut ());
            }
            let first = sm.drive_epsilon_closure(&mut ());
            let settled = sm.current();
            let second = sm.drive_epsilon_closure(&mut ());
            prop_assert_eq!(first, second);
            prop_assert_eq!(settled, sm.current());
        }

        #[test]
        fn prop_unmatched_input_is_not_consumed(
            automaton in arb_automaton(),
            inputs in arb_inputs(),
        ) {
            let mut sm = StateMachine::new(automaton);
            for input in inputs {
                sm.apply(input, &mut ());
            }
            let before = sm.current();
            let state = sm.current_state();
            let blocked = !state.has_epsilon() && !state.has_alternate();
            if blocked && !state.contains_transition_for("d") {
                prop_assert!(!sm.apply("d", &mut ()));
                prop_assert_eq!(sm.current(), before);
            }
        }
    }
}
