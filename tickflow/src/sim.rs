//! Simulation.

use tracing::{debug_span, trace};

use crate::{Module, SimError};

/// Maximum number of evaluation passes a composite module may take to settle within a tick.
pub const SETTLE_LIMIT: usize = 256;

/// Fixpoint iteration over the combinational logic of a composite module.
///
/// A composite drives every internal link with [`Settle::drive`] and repeats its evaluation while
/// [`Settle::again`] returns `true`, i.e. until a whole pass leaves every link unchanged.
///
/// ```ignore
/// let mut settle = Settle::new();
/// while settle.again(self.name())? {
///     self.sweep(Phase::Comb, &mut settle, i_fwd, o_bwd)?;
/// }
/// ```
#[derive(Debug)]
pub struct Settle {
    passes: usize,
    changed: bool,
}

impl Default for Settle {
    fn default() -> Self { Self::new() }
}

impl Settle {
    /// Creates a new fixpoint iteration. The first call to [`Settle::again`] always returns `true`.
    pub fn new() -> Self { Self { passes: 0, changed: true } }

    /// Returns whether another pass is needed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Unsettled`] once [`SETTLE_LIMIT`] passes did not reach a fixpoint.
    pub fn again(&mut self, scope: &str) -> Result<bool, SimError> {
        if !self.changed {
            trace!(scope, passes = self.passes, "settled");
            return Ok(false);
        }
        if self.passes == SETTLE_LIMIT {
            return Err(SimError::Unsettled { scope: scope.to_string(), passes: self.passes });
        }
        self.passes += 1;
        self.changed = false;
        Ok(true)
    }

    /// Drives a wire, recording whether its value changed.
    pub fn drive<T: PartialEq>(&mut self, wire: &mut T, value: T) {
        if *wire != value {
            *wire = value;
            self.changed = true;
        }
    }

    /// Returns the number of passes performed so far.
    pub fn passes(&self) -> usize { self.passes }
}

/// Simulator of a closed design.
#[derive(Debug)]
pub struct Simulator<M: Module<(), ()>> {
    top: M,
    cycle: u64,
}

impl<M: Module<(), ()>> Simulator<M> {
    /// Creates a new simulator at cycle 0.
    pub fn new(top: M) -> Self { Self { top, cycle: 0 } }

    /// Returns the number of simulated cycles.
    pub fn cycle(&self) -> u64 { self.cycle }

    /// Returns the top module.
    pub fn top(&self) -> &M { &self.top }

    /// Returns the top module.
    pub fn top_mut(&mut self) -> &mut M { &mut self.top }

    /// Consumes the simulator, returning the top module.
    pub fn into_top(self) -> M { self.top }

    /// Simulates one cycle: settles the combinational logic, then commits every register.
    pub fn step(&mut self) -> Result<(), SimError> {
        let _span = debug_span!("cycle", cycle = self.cycle).entered();
        self.top.comb(&(), &())?;
        self.top.tick(&(), &())?;
        self.cycle += 1;
        Ok(())
    }

    /// Simulates the given number of cycles.
    pub fn run(&mut self, cycles: u64) -> Result<(), SimError> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Simulates until `done` holds for the top module, checking before every cycle. Returns the number of cycles
    /// simulated.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Deadline`] if `done` does not hold within `limit` cycles.
    pub fn run_until<P: FnMut(&M) -> bool>(&mut self, limit: u64, mut done: P) -> Result<u64, SimError> {
        let start = self.cycle;
        while !done(&self.top) {
            if self.cycle - start == limit {
                return Err(SimError::Deadline { cycles: limit });
            }
            self.step()?;
        }
        Ok(self.cycle - start)
    }
}
