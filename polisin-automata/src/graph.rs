//! Automaton graph types.
//!
//! An [`Automaton`] owns its states in an arena; transitions refer to states
//! by [`StateId`] and to other automata by name. Graphs are only ever grown
//! (states and transitions are added, never removed), so ids stay valid for
//! the automaton's whole lifetime.
//!
//! ```text
//! Initial --s--> State1_s --call B--> State2_B --ε--> Final
//!    \                                               (accept)
//!     `--(anything else)--> Error
//! ```

use crate::action::Action;
use std::collections::HashMap;
use std::fmt;

/// Reserved condition marking a transition that consumes no input.
pub const EPSILON: &str = "&epsilon";

/// Name given to the state auto-created by [`Automaton::new`].
pub const INITIAL_STATE: &str = "Initial";

/// Index of a state inside its owning automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Role of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateKind {
    #[default]
    Normal,
    Accept,
    Error,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Normal => f.write_str("Normal"),
            StateKind::Accept => f.write_str("Accept"),
            StateKind::Error => f.write_str("Error"),
        }
    }
}

/// A move between two states of the same automaton.
///
/// Terminal transitions carry one or more conditions, epsilon transitions
/// carry exactly [`EPSILON`], and alternate transitions carry none.
#[derive(Debug, Clone)]
pub struct Transition {
    from: StateId,
    to: StateId,
    conditions: Vec<String>,
    action: Option<Action>,
}

impl Transition {
    pub fn new(
        from: StateId,
        to: StateId,
        conditions: Vec<String>,
        action: Option<Action>,
    ) -> Self {
        Self {
            from,
            to,
            conditions,
            action,
        }
    }

    pub fn epsilon(from: StateId, to: StateId, action: Option<Action>) -> Self {
        Self::new(from, to, vec![EPSILON.to_string()], action)
    }

    pub fn alternate(from: StateId, to: StateId, action: Option<Action>) -> Self {
        Self::new(from, to, Vec::new(), action)
    }

    pub fn from(&self) -> StateId {
        self.from
    }

    pub fn to(&self) -> StateId {
        self.to
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn set_action(&mut self, action: Option<Action>) {
        self.action = action;
    }

    /// Returns true if `input` is one of the triggering conditions.
    pub fn accepts(&self, input: &str) -> bool {
        self.conditions.iter().any(|c| c == input)
    }

    pub fn is_epsilon(&self) -> bool {
        self.accepts(EPSILON)
    }

    pub fn is_machine_call(&self) -> bool {
        false
    }
}

/// Conditions compare as a set; the action is not part of a transition's
/// identity.
impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.conditions.iter().all(|c| other.conditions.contains(c))
            && other.conditions.iter().all(|c| self.conditions.contains(c))
    }
}

impl Eq for Transition {}

/// A transition that invokes another automaton.
///
/// The single condition is the callee's name. `before` runs when the call is
/// taken; the inherited transition action runs when the callee returns and
/// the caller moves past the call site.
#[derive(Debug, Clone)]
pub struct MachineCall {
    transition: Transition,
    before: Option<Action>,
}

impl MachineCall {
    pub fn new(
        from: StateId,
        to: StateId,
        callee: impl Into<String>,
        before: Option<Action>,
        after: Option<Action>,
    ) -> Self {
        Self {
            transition: Transition::new(from, to, vec![callee.into()], after),
            before,
        }
    }

    /// Name of the called automaton.
    pub fn callee(&self) -> &str {
        &self.transition.conditions[0]
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn from(&self) -> StateId {
        self.transition.from
    }

    /// Return state in the caller.
    pub fn to(&self) -> StateId {
        self.transition.to
    }

    pub fn before(&self) -> Option<Action> {
        self.before
    }

    pub fn after(&self) -> Option<Action> {
        self.transition.action
    }

    pub fn set_actions(&mut self, before: Option<Action>, after: Option<Action>) {
        self.before = before;
        self.transition.action = after;
    }

    pub fn is_machine_call(&self) -> bool {
        true
    }
}

impl PartialEq for MachineCall {
    fn eq(&self, other: &Self) -> bool {
        self.transition == other.transition
    }
}

impl Eq for MachineCall {}

/// A state and its outgoing moves.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    kind: StateKind,
    transitions: Vec<Transition>,
    calls: Vec<MachineCall>,
    epsilon: Option<Transition>,
    alternate: Option<Transition>,
}

impl State {
    fn new(name: String) -> Self {
        Self {
            name,
            kind: StateKind::Normal,
            transitions: Vec::new(),
            calls: Vec::new(),
            epsilon: None,
            alternate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn is_accept(&self) -> bool {
        self.kind == StateKind::Accept
    }

    pub fn is_error(&self) -> bool {
        self.kind == StateKind::Error
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn calls(&self) -> &[MachineCall] {
        &self.calls
    }

    pub fn epsilon(&self) -> Option<&Transition> {
        self.epsilon.as_ref()
    }

    pub fn alternate(&self) -> Option<&Transition> {
        self.alternate.as_ref()
    }

    pub fn has_epsilon(&self) -> bool {
        self.epsilon.is_some()
    }

    pub fn has_alternate(&self) -> bool {
        self.alternate.is_some()
    }

    pub fn has_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// First terminal transition triggered by `input`.
    pub fn find_transition(&self, input: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.accepts(input))
    }

    /// First machine call to `callee`.
    pub fn find_call(&self, callee: &str) -> Option<&MachineCall> {
        self.calls.iter().find(|c| c.callee() == callee)
    }

    pub fn contains_transition_for(&self, input: &str) -> bool {
        self.find_transition(input).is_some()
    }

    pub fn contains_call_to(&self, callee: &str) -> bool {
        self.find_call(callee).is_some()
    }

    /// Target of the terminal transition or machine call labelled `symbol`.
    pub fn next_state(&self, symbol: &str) -> Option<StateId> {
        self.find_transition(symbol)
            .map(Transition::to)
            .or_else(|| self.find_call(symbol).map(MachineCall::to))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}

/// One finite automaton: an arena of states with a designated initial state.
#[derive(Debug, Clone)]
pub struct Automaton {
    name: String,
    states: Vec<State>,
    index: HashMap<String, StateId>,
    initial: StateId,
}

impl Automaton {
    /// Creates an automaton whose initial state is named `Initial`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_initial(name, INITIAL_STATE)
    }

    /// Creates an automaton with a custom initial state name.
    pub fn with_initial(name: impl Into<String>, initial: impl Into<String>) -> Self {
        let mut automaton = Self {
            name: name.into(),
            states: Vec::new(),
            index: HashMap::new(),
            initial: StateId(0),
        };
        automaton.initial = automaton.add_state(initial);
        automaton
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// Returns the state with the given id.
    ///
    /// Panics if the id was not issued by this automaton.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Adds a state, or returns the existing one with the same name.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        let name = name.into();
        if let Some(id) = self.index.get(&name) {
            return *id;
        }
        let id = StateId(self.states.len());
        self.index.insert(name.clone(), id);
        self.states.push(State::new(name));
        id
    }

    pub fn set_kind(&mut self, id: StateId, kind: StateKind) {
        self.states[id.0].kind = kind;
    }

    pub fn set_accept(&mut self, id: StateId) {
        self.set_kind(id, StateKind::Accept);
    }

    pub fn set_error(&mut self, id: StateId) {
        self.set_kind(id, StateKind::Error);
    }

    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        condition: impl Into<String>,
        action: Option<Action>,
    ) {
        self.add_transition_on(from, to, vec![condition.into()], action);
    }

    /// Adds a terminal transition triggered by any of `conditions`.
    pub fn add_transition_on(
        &mut self,
        from: StateId,
        to: StateId,
        conditions: Vec<String>,
        action: Option<Action>,
    ) {
        self.states[from.0]
            .transitions
            .push(Transition::new(from, to, conditions, action));
    }

    pub fn add_call(
        &mut self,
        from: StateId,
        to: StateId,
        callee: impl Into<String>,
        before: Option<Action>,
        after: Option<Action>,
    ) {
        self.states[from.0]
            .calls
            .push(MachineCall::new(from, to, callee, before, after));
    }

    /// Sets the state's epsilon transition, replacing any previous one.
    pub fn set_epsilon(&mut self, from: StateId, to: StateId, action: Option<Action>) {
        self.states[from.0].epsilon = Some(Transition::epsilon(from, to, action));
    }

    /// Sets the state's alternate transition, replacing any previous one.
    pub fn set_alternate(&mut self, from: StateId, to: StateId, action: Option<Action>) {
        self.states[from.0].alternate = Some(Transition::alternate(from, to, action));
    }

    /// Assigns the tree-building actions to every terminal transition and call.
    pub fn install_tree_actions(&mut self) {
        for state in &mut self.states {
            for transition in &mut state.transitions {
                transition.set_action(Some(Action::AppendLeaf));
            }
            for call in &mut state.calls {
                call.set_actions(Some(Action::Descend), Some(Action::Ascend));
            }
        }
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "machine {} (initial: {})",
            self.name,
            self.state(self.initial).name()
        )?;
        for state in &self.states {
            writeln!(f, "  {}", state)?;
            let name = |id: StateId| self.state(id).name();
            for t in &state.transitions {
                writeln!(
                    f,
                    "    {} -> {}; Conds: {}",
                    state.name,
                    name(t.to),
                    t.conditions.join(",")
                )?;
            }
            for c in &state.calls {
                writeln!(f, "    {} -> {}; Call: {}", state.name, name(c.to()), c.callee())?;
            }
            if let Some(t) = &state.epsilon {
                writeln!(f, "    {} -> {}; Conds: {}", state.name, name(t.to), EPSILON)?;
            }
            if let Some(t) = &state.alternate {
                writeln!(f, "    {} -> {}; Alternate", state.name, name(t.to))?;
            }
        }
        Ok(())
    }
}
