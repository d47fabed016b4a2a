//! # polisin-automata
//!
//! Automata engine for polisin.
//!
//! This crate provides:
//! - The automaton graph: states, transitions, machine calls
//! - A finite-state runner with a fixed transition preference order
//! - A stack machine composing named automata into a pushdown automaton
//! - Tree-building actions dispatched to a caller-supplied sink

pub mod action;
pub mod error;
pub mod graph;
pub mod machine;
pub mod stack;

pub use action::{Action, ActionSink};
pub use error::AutomataError;
pub use graph::{Automaton, MachineCall, State, StateId, StateKind, Transition, EPSILON};
pub use machine::StateMachine;
pub use stack::{Frame, MachineSet, StackLimits, StackMachine};
