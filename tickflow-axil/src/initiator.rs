//! Bus-functional model of an initiator.

use std::collections::VecDeque;

use tickflow::{format_ports, some_or, Module, SimError};
use tickflow_macro::Interface;
use tickflow_std::{Ready, Valid, VrChannel};
use tracing::{trace, warn};

use crate::{Backpressure, Item, Kind};

/// Operation of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Read of the word at `address`.
    Read {
        /// Address.
        address: u64,
    },

    /// Write of the bytes of `data` selected by `byte_mask` at `address`.
    Write {
        /// Address.
        address: u64,
        /// Data.
        data: u64,
        /// Byte mask.
        byte_mask: u8,
    },
}

/// Scripted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    /// Operation.
    pub op: Op,
    /// Ticks the address phase waits once the command is next in line.
    pub delay: u64,
    /// Ticks the data phase of a write waits once the command is next in line.
    pub data_delay: u64,
}

impl Command {
    /// Creates a read.
    pub fn read(address: u64) -> Self { Self { op: Op::Read { address }, delay: 0, data_delay: 0 } }

    /// Creates a full-width write.
    pub fn write(address: u64, data: u64) -> Self { Self::write_masked(address, data, Item::FULL_MASK) }

    /// Creates a write of the bytes selected by `byte_mask`.
    pub fn write_masked(address: u64, data: u64, byte_mask: u8) -> Self {
        Self { op: Op::Write { address, data, byte_mask }, delay: 0, data_delay: 0 }
    }

    /// Delays the address phase.
    pub fn after(self, delay: u64) -> Self { Self { delay, ..self } }

    /// Delays the data phase.
    pub fn data_after(self, data_delay: u64) -> Self { Self { data_delay, ..self } }

    /// Returns the kind.
    pub fn kind(&self) -> Kind {
        match self.op {
            Op::Read { .. } => Kind::Read,
            Op::Write { .. } => Kind::Write,
        }
    }

    /// Returns the address.
    pub fn address(&self) -> u64 {
        match self.op {
            Op::Read { address } | Op::Write { address, .. } => address,
        }
    }
}

/// Completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Command.
    pub command: Command,
    /// Response.
    pub response: Item,
    /// Tick on which the request was accepted.
    pub issued_at: u64,
    /// Tick on which the response was accepted.
    pub completed_at: u64,
}

/// Initiator's input interface.
#[derive(Debug, Interface)]
pub struct InitiatorI {
    /// Write response.
    pub b: VrChannel<Item>,
    /// Read response.
    pub r: VrChannel<Item>,
}

/// Initiator's output interface.
#[derive(Debug, Interface)]
pub struct InitiatorO {
    /// Write address.
    pub aw: VrChannel<Item>,
    /// Write data.
    pub w: VrChannel<Item>,
    /// Read address.
    pub ar: VrChannel<Item>,
}

/// Issues the commands of one kind in order.
#[derive(Debug)]
struct Issuer {
    script: VecDeque<Command>,
    since: u64,
    address_done: bool,
    data_done: bool,
    outstanding: VecDeque<(Command, u64)>,
    max_outstanding: usize,
}

impl Issuer {
    fn new() -> Self {
        Self {
            script: VecDeque::new(),
            since: 0,
            address_done: false,
            data_done: false,
            outstanding: VecDeque::new(),
            max_outstanding: 0,
        }
    }

    /// Returns the address and data phases offered.
    fn offer(&self) -> (Valid<Item>, Valid<Item>) {
        let command = some_or!(self.script.front(), return (Valid::invalid(), Valid::invalid()));

        match command.op {
            Op::Read { address } => {
                (Valid::new(!self.address_done && self.since >= command.delay, Item::read(address)), Valid::invalid())
            }
            Op::Write { address, data, byte_mask } => (
                Valid::new(!self.address_done && self.since >= command.delay, Item::write_address(address)),
                Valid::new(!self.data_done && self.since >= command.data_delay, Item::write_data(data, byte_mask)),
            ),
        }
    }

    fn advance(&mut self, address: bool, data: bool, now: u64) -> Option<Command> {
        let command = *self.script.front()?;
        self.address_done |= address;
        self.data_done |= data;

        let done = match command.kind() {
            Kind::Read => self.address_done,
            Kind::Write => self.address_done && self.data_done,
        };
        if !done {
            self.since += 1;
            return None;
        }

        self.script.pop_front();
        self.since = 0;
        self.address_done = false;
        self.data_done = false;
        self.outstanding.push_back((command, now));
        self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
        Some(command)
    }

    fn is_idle(&self) -> bool { self.script.is_empty() && self.outstanding.is_empty() }
}

/// Bus-functional model of an initiator: issues scripted reads and writes and logs their completions.
///
/// Reads and writes are issued independently, each kind in script order. An initiator does not limit its own
/// outstanding requests; [`Initiator::max_outstanding`] reports how many were observed.
#[derive(Debug)]
pub struct Initiator {
    name: String,
    now: u64,
    backpressure: Backpressure,
    read: Issuer,
    write: Issuer,
    completions: Vec<Completion>,
    unexpected: usize,
}

impl Initiator {
    /// Creates a new initiator that always accepts responses.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            now: 0,
            backpressure: Backpressure::Never,
            read: Issuer::new(),
            write: Issuer::new(),
            completions: Vec::new(),
            unexpected: 0,
        }
    }

    /// Sets the backpressure on the response channels.
    pub fn set_backpressure(&mut self, backpressure: Backpressure) { self.backpressure = backpressure; }

    /// Appends a command to the script of its kind.
    pub fn push(&mut self, command: Command) { self.issuer_mut(command.kind()).script.push_back(command); }

    /// Returns the completions, in completion order.
    pub fn completions(&self) -> &[Completion] { &self.completions }

    /// Returns the maximum number of requests of one kind observed in flight.
    pub fn max_outstanding(&self) -> usize { self.read.max_outstanding.max(self.write.max_outstanding) }

    /// Returns the number of responses received without a request in flight.
    pub fn unexpected(&self) -> usize { self.unexpected }

    /// Returns whether every command has completed.
    pub fn is_idle(&self) -> bool { self.read.is_idle() && self.write.is_idle() }

    fn issuer_mut(&mut self, kind: Kind) -> &mut Issuer {
        match kind {
            Kind::Read => &mut self.read,
            Kind::Write => &mut self.write,
        }
    }

    fn complete(&mut self, kind: Kind, response: &Item) {
        let now = self.now;
        match self.issuer_mut(kind).outstanding.pop_front() {
            Some((command, issued_at)) => {
                trace!(initiator = %self.name, response = %format_ports(response), issued_at, "completed");
                self.completions.push(Completion { command, response: response.clone(), issued_at, completed_at: now });
            }
            None => {
                warn!(initiator = %self.name, response = %format_ports(response), "response without a request");
                self.unexpected += 1;
            }
        }
    }
}

impl Module<InitiatorI, InitiatorO> for Initiator {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, _: &InitiatorIFwd, _: &InitiatorOBwd) -> Result<(InitiatorOFwd, InitiatorIBwd), SimError> {
        let (aw, w) = self.write.offer();
        let (ar, _) = self.read.offer();
        let ready = Ready::new(self.backpressure.ready(self.now));
        Ok((InitiatorOFwd { aw, w, ar }, InitiatorIBwd { b: ready, r: ready }))
    }

    fn tick(&mut self, i_fwd: &InitiatorIFwd, o_bwd: &InitiatorOBwd) -> Result<(), SimError> {
        let (o_fwd, i_bwd) = self.comb(i_fwd, o_bwd)?;

        if i_fwd.b.fire(&i_bwd.b) {
            self.complete(Kind::Write, &i_fwd.b.inner);
        }
        if i_fwd.r.fire(&i_bwd.r) {
            self.complete(Kind::Read, &i_fwd.r.inner);
        }

        let now = self.now;
        if let Some(command) = self.write.advance(o_fwd.aw.fire(&o_bwd.aw), o_fwd.w.fire(&o_bwd.w), now) {
            trace!(initiator = %self.name, ?command, "issued");
        }
        if let Some(command) = self.read.advance(o_fwd.ar.fire(&o_bwd.ar), false, now) {
            trace!(initiator = %self.name, ?command, "issued");
        }

        self.now += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resp;

    fn step(initiator: &mut Initiator, i_fwd: &InitiatorIFwd, ready: bool) -> InitiatorOFwd {
        let o_bwd = InitiatorOBwd { aw: Ready::new(ready), w: Ready::new(ready), ar: Ready::new(ready) };
        let (o_fwd, _) = initiator.comb(i_fwd, &o_bwd).unwrap();
        initiator.tick(i_fwd, &o_bwd).unwrap();
        o_fwd
    }

    fn quiet() -> InitiatorIFwd { InitiatorIFwd { b: Valid::invalid(), r: Valid::invalid() } }

    #[test]
    fn phases_wait_for_their_delays() {
        let mut initiator = Initiator::new("initiator");
        initiator.push(Command::write(0x10, 0xab).after(1).data_after(2));

        let o_fwd = step(&mut initiator, &quiet(), false);
        assert!(!o_fwd.aw.valid && !o_fwd.w.valid);
        let o_fwd = step(&mut initiator, &quiet(), false);
        assert!(o_fwd.aw.valid && !o_fwd.w.valid);
        let o_fwd = step(&mut initiator, &quiet(), true);
        assert_eq!(o_fwd.aw.as_option().map(|aw| aw.address), Some(0x10));
        assert_eq!(o_fwd.w.as_option().map(|w| (w.data, w.byte_mask)), Some((0xab, 0xff)));

        assert!(!initiator.is_idle());
        assert_eq!(initiator.max_outstanding(), 1);
        let response =
            InitiatorIFwd { b: Valid::valid(Item::response(Kind::Write, Resp::Okay, 0)), r: Valid::invalid() };
        step(&mut initiator, &response, true);

        let completion = &initiator.completions()[0];
        assert_eq!((completion.issued_at, completion.completed_at), (2, 3));
        assert!(initiator.is_idle());
    }

    #[test]
    fn kinds_are_issued_independently() {
        let mut initiator = Initiator::new("initiator");
        initiator.push(Command::write(0x10, 1).after(5));
        initiator.push(Command::read(0x20));

        let o_fwd = step(&mut initiator, &quiet(), true);
        assert!(o_fwd.ar.valid);
        assert!(!o_fwd.aw.valid);
    }

    #[test]
    fn counts_unexpected_responses() {
        let mut initiator = Initiator::new("initiator");
        let response =
            InitiatorIFwd { b: Valid::invalid(), r: Valid::valid(Item::response(Kind::Read, Resp::Okay, 0)) };
        step(&mut initiator, &response, true);
        assert_eq!(initiator.unexpected(), 1);
        assert!(initiator.completions().is_empty());
    }
}
