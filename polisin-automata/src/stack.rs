//! Stack machine - composes named automata into a pushdown automaton.
//!
//! The automata live in a [`MachineSet`], which is validated once and then
//! shared read-only. Every [`StackMachine`] is an independent parse session
//! holding its own cursors and call stack over that set.

use crate::action::ActionSink;
use crate::error::AutomataError;
use crate::graph::{Automaton, StateId};
use crate::machine::StateMachine;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Validated collection of automata with a designated start machine.
#[derive(Debug, Clone)]
pub struct MachineSet {
    machines: Vec<Arc<Automaton>>,
    index: HashMap<String, usize>,
    start: usize,
}

impl MachineSet {
    /// Builds a set whose first automaton is the start machine.
    pub fn new(machines: Vec<Automaton>) -> Result<Self, AutomataError> {
        let start = machines
            .first()
            .map(|m| m.name().to_string())
            .ok_or(AutomataError::NoMachines)?;
        Self::with_start(machines, &start)
    }

    /// Builds a set with an explicitly named start machine.
    pub fn with_start(machines: Vec<Automaton>, start: &str) -> Result<Self, AutomataError> {
        if machines.is_empty() {
            return Err(AutomataError::NoMachines);
        }

        let mut index = HashMap::with_capacity(machines.len());
        for (i, machine) in machines.iter().enumerate() {
            if index.insert(machine.name().to_string(), i).is_some() {
                return Err(AutomataError::DuplicateMachine {
                    machine: machine.name().to_string(),
                });
            }
        }

        let start = *index
            .get(start)
            .ok_or_else(|| AutomataError::UnknownMachine {
                machine: start.to_string(),
            })?;

        let set = Self {
            machines: machines.into_iter().map(Arc::new).collect(),
            index,
            start,
        };
        set.validate()?;
        Ok(set)
    }

    /// Checks call targets and terminal/call condition collisions.
    fn validate(&self) -> Result<(), AutomataError> {
        for machine in &self.machines {
            for (_, state) in machine.states() {
                for call in state.calls() {
                    if !self.index.contains_key(call.callee()) {
                        return Err(AutomataError::DanglingCall {
                            machine: machine.name().to_string(),
                            state: state.name().to_string(),
                            callee: call.callee().to_string(),
                        });
                    }
                    if state.contains_transition_for(call.callee()) {
                        return Err(AutomataError::ConditionCollision {
                            machine: machine.name().to_string(),
                            state: state.name().to_string(),
                            symbol: call.callee().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Assigns the tree-building actions to every automaton in the set.
    pub fn with_tree_actions(mut self) -> Self {
        for machine in &mut self.machines {
            Arc::make_mut(machine).install_tree_actions();
        }
        self
    }

    pub fn start(&self) -> &Arc<Automaton> {
        &self.machines[self.start]
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Automaton>> {
        self.index.get(name).map(|&i| &self.machines[i])
    }

    /// Automata in insertion order.
    pub fn machines(&self) -> impl Iterator<Item = &Arc<Automaton>> {
        self.machines.iter()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Total number of states across all automata.
    pub fn state_count(&self) -> usize {
        self.machines.iter().map(|m| m.len()).sum()
    }
}

/// Safety bounds for one stack machine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLimits {
    /// Local transition attempts per input symbol.
    pub max_local_attempts: usize,
    /// Maximum number of simultaneously open machine calls.
    pub max_call_depth: usize,
    /// Maximum settle iterations in [`StackMachine::finish`].
    pub max_settle_steps: usize,
}

impl Default for StackLimits {
    fn default() -> Self {
        Self {
            max_local_attempts: 10,
            max_call_depth: 256,
            max_settle_steps: 1024,
        }
    }
}

/// Suspended caller: which machine to resume and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    machine: usize,
    return_state: StateId,
}

/// Pushdown automaton session over a [`MachineSet`].
#[derive(Debug, Clone)]
pub struct StackMachine {
    set: Arc<MachineSet>,
    cursors: Vec<StateMachine>,
    active: usize,
    stack: Vec<Frame>,
    limits: StackLimits,
}

impl StackMachine {
    pub fn new(set: Arc<MachineSet>) -> Self {
        Self::with_limits(set, StackLimits::default())
    }

    pub fn with_limits(set: Arc<MachineSet>, limits: StackLimits) -> Self {
        let cursors = set
            .machines
            .iter()
            .map(|m| StateMachine::new(Arc::clone(m)))
            .collect();
        let active = set.start;
        Self {
            set,
            cursors,
            active,
            stack: Vec::new(),
            limits,
        }
    }

    pub fn machine_set(&self) -> &Arc<MachineSet> {
        &self.set
    }

    pub fn limits(&self) -> StackLimits {
        self.limits
    }

    /// The automaton currently in control.
    pub fn active_machine(&self) -> &StateMachine {
        &self.cursors[self.active]
    }

    /// Number of open machine calls.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Suspended callers from outermost to innermost, as
    /// `(machine, return state)` names.
    pub fn call_stack(&self) -> Vec<(&str, &str)> {
        self.stack
            .iter()
            .map(|f| {
                let machine = &self.set.machines[f.machine];
                (machine.name(), machine.state(f.return_state).name())
            })
            .collect()
    }

    pub fn is_at_error(&self) -> bool {
        self.active_machine().is_at_error()
    }

    /// True when no call is open and the start machine is at an accept state.
    pub fn is_accepted(&self) -> bool {
        self.stack.is_empty() && self.active_machine().is_at_accept()
    }

    /// Consumes one input symbol.
    ///
    /// Preference order: machine call, local transition, epsilon, alternate.
    /// If the symbol is not consumed, the session is restored to where it was
    /// before the attempt, including sink effects.
    pub fn input(&mut self, symbol: &str, sink: &mut dyn ActionSink) -> bool {
        let saved_active = self.active;
        let saved_state = self.cursors[self.active].current();
        let saved_stack = self.stack.clone();
        let mark = sink.mark();

        let mut consumed = false;
        let mut attempts = 0;
        let mut calls = 0;
        while !consumed
            && attempts <= self.limits.max_local_attempts
            && calls <= self.limits.max_call_depth
            && !self.is_at_error()
        {
            if self.try_call(Some(symbol), sink) {
                calls += 1;
            } else {
                consumed = self.cursors[self.active].apply(symbol, sink);
                attempts += 1;
            }
            self.try_return(sink);
        }

        if !consumed {
            tracing::trace!(
                symbol,
                machine = self.set.machines[saved_active].name(),
                "symbol rejected, rolling back"
            );
            self.active = saved_active;
            self.cursors[saved_active].jump(saved_state);
            self.stack = saved_stack;
            sink.rewind(mark);
        }

        consumed
    }

    /// Settles trailing epsilon moves, epsilon-satisfied calls and returns
    /// after the last input symbol.
    pub fn finish(&mut self, sink: &mut dyn ActionSink) {
        for _ in 0..self.limits.max_settle_steps {
            if !self.settle_pending() {
                return;
            }
            self.cursors[self.active].step_epsilon(sink);
            self.try_return(sink);
            self.try_call(None, sink);
        }
        if self.settle_pending() {
            tracing::warn!(
                machine = self.active_machine().name(),
                depth = self.depth(),
                "stack machine did not settle within {} steps",
                self.limits.max_settle_steps
            );
        }
    }

    /// Returns to the start machine's initial state with an empty stack.
    pub fn restart(&mut self) {
        for cursor in &mut self.cursors {
            cursor.restart();
        }
        self.active = self.set.start;
        self.stack.clear();
    }

    /// Feeds every input, settles, and reports acceptance.
    pub fn execute<'a>(
        &mut self,
        inputs: impl IntoIterator<Item = &'a str>,
        sink: &mut dyn ActionSink,
    ) -> bool {
        for input in inputs {
            self.input(input, sink);
        }
        self.finish(sink);
        self.is_accepted()
    }

    fn settle_pending(&self) -> bool {
        let active = self.active_machine();
        active.has_epsilon_now()
            || (active.has_calls_now()
                && self
                    .choose_call(self.active, active.current(), None)
                    .is_some())
            || (!self.stack.is_empty() && active.is_at_accept())
    }

    /// Index of the first call out of `state` whose callee can start with
    /// `input`. First match wins.
    fn choose_call(&self, machine: usize, state: StateId, input: Option<&str>) -> Option<usize> {
        let mut seen = HashSet::new();
        self.set.machines[machine]
            .state(state)
            .calls()
            .iter()
            .position(|call| match self.set.index.get(call.callee()) {
                Some(&callee) => {
                    let initial = self.set.machines[callee].initial();
                    self.can_start(callee, initial, input, &mut seen)
                }
                None => false,
            })
    }

    /// Lookahead: can the automaton, from `state`, consume `input` or accept
    /// through terminals, nested calls and epsilon moves?
    fn can_start(
        &self,
        machine: usize,
        state: StateId,
        input: Option<&str>,
        seen: &mut HashSet<(usize, StateId)>,
    ) -> bool {
        if !seen.insert((machine, state)) {
            return false;
        }
        let s = self.set.machines[machine].state(state);
        if s.is_accept() {
            return true;
        }
        if input.is_some_and(|i| s.contains_transition_for(i)) {
            return true;
        }
        for call in s.calls() {
            if let Some(&callee) = self.set.index.get(call.callee()) {
                let initial = self.set.machines[callee].initial();
                if self.can_start(callee, initial, input, seen) {
                    return true;
                }
            }
        }
        match s.epsilon() {
            Some(eps) => self.can_start(machine, eps.to(), input, seen),
            None => false,
        }
    }

    /// Takes an eligible call out of the active state, if any.
    fn try_call(&mut self, input: Option<&str>, sink: &mut dyn ActionSink) -> bool {
        let current = self.cursors[self.active].current();
        let Some(idx) = self.choose_call(self.active, current, input) else {
            return false;
        };
        if self.stack.len() >= self.limits.max_call_depth {
            tracing::warn!(
                machine = self.active_machine().name(),
                "call depth limit {} reached",
                self.limits.max_call_depth
            );
            return false;
        }

        let call = &self.set.machines[self.active].state(current).calls()[idx];
        let Some(&callee) = self.set.index.get(call.callee()) else {
            return false;
        };
        tracing::trace!(
            caller = self.set.machines[self.active].name(),
            callee = call.callee(),
            depth = self.stack.len() + 1,
            "machine call"
        );

        self.stack.push(Frame {
            machine: self.active,
            return_state: current,
        });
        self.active = callee;
        if let Some(action) = call.before() {
            sink.perform(action, self.set.machines[callee].name());
        }
        self.cursors[callee].restart();
        true
    }

    /// Pops back to the caller if the active machine has accepted.
    fn try_return(&mut self, sink: &mut dyn ActionSink) -> bool {
        if !self.cursors[self.active].is_at_accept() {
            return false;
        }
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        let callee = self.set.machines[self.active].name();
        tracing::trace!(
            callee,
            caller = self.set.machines[frame.machine].name(),
            depth = self.stack.len(),
            "machine return"
        );

        self.active = frame.machine;
        let caller = &mut self.cursors[frame.machine];
        caller.jump(frame.return_state);
        caller.take_call_return(callee, sink);
        true
    }
}
