//! Modules.

use std::fmt;
use std::marker::PhantomData;

use crate::{Interface, SimError, Value};

/// Evaluation phase of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Computes combinational outputs. May run any number of times per tick.
    Comb,
    /// Commits the next state. Runs exactly once per tick, on settled inputs.
    Tick,
}

/// Module with input interface `I` and output interface `O`.
///
/// Within a tick, `comb` must be a pure function of its arguments and the current state; `tick` moves to the next
/// state. Both receive the same, settled arguments in the last `comb` call and in `tick`.
pub trait Module<I: Interface, O: Interface>: fmt::Debug {
    /// Returns the module name.
    fn name(&self) -> &str;

    /// Computes the output forward value and the input backward value.
    fn comb(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> Result<(O::Fwd, I::Bwd), SimError>;

    /// Commits the next state.
    fn tick(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> Result<(), SimError>;

    /// Runs the given phase. Returns the combinational outputs in [`Phase::Comb`].
    fn eval(&mut self, phase: Phase, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> Result<Option<(O::Fwd, I::Bwd)>, SimError> {
        match phase {
            Phase::Comb => self.comb(i_fwd, o_bwd).map(Some),
            Phase::Tick => self.tick(i_fwd, o_bwd).map(|_| None),
        }
    }
}

/// Finite state machine (Mealy machine).
///
/// `f` receives the input forward value, the output backward value and the current state, and returns the output
/// forward value, the input backward value and the next state.
pub struct Fsm<I: Interface, O: Interface, S: Value, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> {
    /// Module name.
    module_name: String,
    /// FSM function.
    f: F,
    /// Current value of registers in the FSM.
    state: S,
    _marker: PhantomData<(I, O)>,
}

/// Boxed FSM function.
pub type FsmFn<I, O, S> = dyn Fn(
    &<I as Interface>::Fwd,
    &<O as Interface>::Bwd,
    &S,
) -> (<O as Interface>::Fwd, <I as Interface>::Bwd, S);

/// FSM with a boxed function, so that it can be named as a field type.
pub type DynFsm<I, O, S> = Fsm<I, O, S, Box<FsmFn<I, O, S>>>;

impl<I: Interface, O: Interface, S: Value, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> Fsm<I, O, S, F> {
    /// Creates a new FSM.
    pub fn new(module_name: &str, init: S, f: F) -> Self {
        Self { module_name: module_name.to_string(), f, state: init, _marker: PhantomData }
    }

    /// Returns the current state.
    pub fn state(&self) -> &S { &self.state }
}

impl<I: Interface, O: Interface, S: Value> DynFsm<I, O, S> {
    /// Creates a new FSM, boxing its function.
    pub fn boxed<F: 'static + Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)>(
        module_name: &str, init: S, f: F,
    ) -> Self {
        let f: Box<FsmFn<I, O, S>> = Box::new(f);
        Fsm::new(module_name, init, f)
    }
}

impl<I: Interface, O: Interface, S: Value, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> fmt::Debug
    for Fsm<I, O, S, F>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm").field("module_name", &self.module_name).field("state", &self.state).finish()
    }
}

impl<I: Interface, O: Interface, S: Value, F: Fn(&I::Fwd, &O::Bwd, &S) -> (O::Fwd, I::Bwd, S)> Module<I, O>
    for Fsm<I, O, S, F>
{
    fn name(&self) -> &str { &self.module_name }

    fn comb(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> Result<(O::Fwd, I::Bwd), SimError> {
        let (o_fwd, i_bwd, _) = (self.f)(i_fwd, o_bwd, &self.state);
        Ok((o_fwd, i_bwd))
    }

    fn tick(&mut self, i_fwd: &I::Fwd, o_bwd: &O::Bwd) -> Result<(), SimError> {
        let (_, _, state_next) = (self.f)(i_fwd, o_bwd, &self.state);
        self.state = state_next;
        Ok(())
    }
}
