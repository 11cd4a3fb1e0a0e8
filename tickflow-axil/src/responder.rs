//! Bus-functional model of a responder.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tickflow::{format_ports, Module, SimError};
use tickflow_macro::Interface;
use tickflow_std::{Ready, Valid, VrChannel};
use tracing::trace;

use crate::{ConfigError, Item, Kind, Resp};

/// When a consumer asserts `ready`, as a function of the current tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// Always ready.
    #[default]
    Never,
    /// Ready from the given tick on.
    Until(u64),
    /// Ready on one tick out of every `n`.
    OneIn(u64),
    /// Ready on tick `t` if `pattern[t % pattern.len()]` holds.
    Pattern(Vec<bool>),
}

impl Backpressure {
    /// Returns whether the consumer is ready on the given tick.
    pub fn ready(&self, now: u64) -> bool {
        match self {
            Self::Never => true,
            Self::Until(tick) => now >= *tick,
            Self::OneIn(n) => *n != 0 && now % n == n - 1,
            Self::Pattern(pattern) => !pattern.is_empty() && pattern[(now % pattern.len() as u64) as usize],
        }
    }

    /// Returns whether the consumer is ever ready.
    pub fn is_live(&self) -> bool {
        match self {
            Self::Never | Self::Until(_) => true,
            Self::OneIn(n) => *n != 0,
            Self::Pattern(pattern) => pattern.contains(&true),
        }
    }
}

/// Behavior of a responder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderModel {
    /// Ticks between accepting a request and offering its response, in addition to the one registered tick.
    pub latency: u64,
    /// Backpressure on the request channels.
    pub backpressure: Backpressure,
    /// Whether writes with a partial byte mask are answered with [`Resp::SlaveError`].
    pub require_full_width: bool,
}

impl ResponderModel {
    /// Sets the latency.
    pub fn with_latency(self, latency: u64) -> Self { Self { latency, ..self } }

    /// Sets the backpressure.
    pub fn with_backpressure(self, backpressure: Backpressure) -> Self { Self { backpressure, ..self } }

    /// Requires full-width writes.
    pub fn full_width_only(self) -> Self { Self { require_full_width: true, ..self } }

    /// Checks the model of responder `responder`.
    pub fn validate(&self, responder: usize) -> Result<(), ConfigError> {
        if !self.backpressure.is_live() {
            return Err(ConfigError::NeverReady { responder });
        }
        Ok(())
    }
}

/// Request channel of a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Write address.
    Aw,
    /// Write data.
    W,
    /// Read address.
    Ar,
}

const CHANNELS: [Channel; 3] = [Channel::Aw, Channel::W, Channel::Ar];

/// Acceptance of a request on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Channel.
    pub channel: Channel,
    /// Tick on which the item was first offered.
    pub offered_at: u64,
    /// Tick on which the item was accepted.
    pub accepted_at: u64,
    /// Item first offered.
    pub offered: Item,
    /// Item accepted.
    pub accepted: Item,
}

/// Responder's input interface.
#[derive(Debug, Interface)]
pub struct ResponderI {
    /// Write address.
    pub aw: VrChannel<Item>,
    /// Write data.
    pub w: VrChannel<Item>,
    /// Read address.
    pub ar: VrChannel<Item>,
}

/// Responder's output interface.
#[derive(Debug, Interface)]
pub struct ResponderO {
    /// Write response.
    pub b: VrChannel<Item>,
    /// Read response.
    pub r: VrChannel<Item>,
}

/// Bus-functional model of a responder: a store of 64-bit words answering in order.
#[derive(Debug)]
pub struct Responder {
    name: String,
    model: ResponderModel,
    now: u64,
    memory: BTreeMap<u64, u64>,

    address: Option<Item>,
    data: Option<Item>,
    offers: [Option<(u64, Item)>; 3],
    writes: VecDeque<(u64, Item)>,
    reads: VecDeque<(u64, Item)>,
    accepted: Vec<Accepted>,
}

fn word(address: u64) -> u64 { address >> 3 }

fn mask_bytes(byte_mask: u8) -> u64 {
    (0..8u32).filter(|b| (byte_mask >> b) & 1 == 1).fold(0, |mask, b| mask | (0xff << (8 * b)))
}

impl Responder {
    /// Creates a new responder.
    pub fn new(name: &str, model: ResponderModel) -> Self {
        Self {
            name: name.to_string(),
            model,
            now: 0,
            memory: BTreeMap::new(),
            address: None,
            data: None,
            offers: [None, None, None],
            writes: VecDeque::new(),
            reads: VecDeque::new(),
            accepted: Vec::new(),
        }
    }

    /// Returns the model.
    pub fn model(&self) -> &ResponderModel { &self.model }

    /// Reads the word containing the address.
    pub fn peek(&self, address: u64) -> u64 { self.memory.get(&word(address)).copied().unwrap_or(0) }

    /// Writes the word containing the address.
    pub fn poke(&mut self, address: u64, value: u64) { self.memory.insert(word(address), value); }

    /// Returns every acceptance, in order.
    pub fn accepted(&self) -> &[Accepted] { &self.accepted }

    /// Returns whether no request is pending and no response is waiting.
    pub fn is_idle(&self) -> bool {
        self.address.is_none() && self.data.is_none() && self.writes.is_empty() && self.reads.is_empty()
    }

    fn ready(&self) -> ResponderIBwd {
        let ready = self.model.backpressure.ready(self.now);
        ResponderIBwd {
            aw: Ready::new(ready && self.address.is_none()),
            w: Ready::new(ready && self.data.is_none()),
            ar: Ready::new(ready),
        }
    }

    fn due(&self, queue: &VecDeque<(u64, Item)>) -> Valid<Item> {
        match queue.front() {
            Some((due, response)) if *due <= self.now => Valid::valid(response.clone()),
            _ => Valid::invalid(),
        }
    }

    fn write(&mut self, address: &Item, data: &Item) -> Resp {
        if self.model.require_full_width && !data.is_full_width() {
            return Resp::SlaveError;
        }
        let mask = mask_bytes(data.byte_mask);
        let value = (self.peek(address.address) & !mask) | (data.data & mask);
        self.poke(address.address, value);
        Resp::Okay
    }

    fn record(&mut self, channel: Channel, lane: &Valid<Item>, ready: &Ready) {
        if !lane.valid {
            return;
        }
        let slot = &mut self.offers[channel as usize];
        let (offered_at, offered) = slot.get_or_insert_with(|| (self.now, lane.inner.clone())).clone();
        if lane.fire(ready) {
            *slot = None;
            self.accepted.push(Accepted {
                channel,
                offered_at,
                accepted_at: self.now,
                offered,
                accepted: lane.inner.clone(),
            });
        }
    }
}

impl Module<ResponderI, ResponderO> for Responder {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, _: &ResponderIFwd, _: &ResponderOBwd) -> Result<(ResponderOFwd, ResponderIBwd), SimError> {
        Ok((ResponderOFwd { b: self.due(&self.writes), r: self.due(&self.reads) }, self.ready()))
    }

    fn tick(&mut self, i_fwd: &ResponderIFwd, o_bwd: &ResponderOBwd) -> Result<(), SimError> {
        let (o_fwd, i_bwd) = self.comb(i_fwd, o_bwd)?;

        if o_fwd.b.fire(&o_bwd.b) {
            self.writes.pop_front();
        }
        if o_fwd.r.fire(&o_bwd.r) {
            self.reads.pop_front();
        }

        for (channel, (lane, ready)) in
            CHANNELS.into_iter().zip([(&i_fwd.aw, &i_bwd.aw), (&i_fwd.w, &i_bwd.w), (&i_fwd.ar, &i_bwd.ar)])
        {
            self.record(channel, lane, ready);
        }

        let due = self.now + 1 + self.model.latency;
        if i_fwd.aw.fire(&i_bwd.aw) {
            self.address = Some(i_fwd.aw.inner.clone());
        }
        if i_fwd.w.fire(&i_bwd.w) {
            self.data = Some(i_fwd.w.inner.clone());
        }
        if let (Some(address), Some(data)) = (&self.address, &self.data) {
            let (address, data) = (address.clone(), data.clone());
            let resp = self.write(&address, &data);
            trace!(responder = %self.name, request = %format_ports(&address), ?resp, "write");
            self.writes.push_back((due, Item::response(Kind::Write, resp, 0)));
            self.address = None;
            self.data = None;
        }
        if i_fwd.ar.fire(&i_bwd.ar) {
            let request = &i_fwd.ar.inner;
            let data = self.peek(request.address);
            trace!(responder = %self.name, request = %format_ports(request), data, "read");
            self.reads.push_back((due, Item::response(Kind::Read, Resp::Okay, data)));
        }

        self.now += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(aw: Option<Item>, w: Option<Item>, ar: Option<Item>) -> ResponderIFwd {
        let lane = |item: Option<Item>| item.map_or(Valid::invalid(), Valid::valid);
        ResponderIFwd { aw: lane(aw), w: lane(w), ar: lane(ar) }
    }

    fn step(responder: &mut Responder, i_fwd: &ResponderIFwd) -> (ResponderOFwd, ResponderIBwd) {
        let o_bwd = ResponderOBwd { b: Ready::new(true), r: Ready::new(true) };
        let outputs = responder.comb(i_fwd, &o_bwd).unwrap();
        responder.tick(i_fwd, &o_bwd).unwrap();
        outputs
    }

    #[test]
    fn backpressure_models() {
        assert!((0..5).all(|t| Backpressure::Never.ready(t)));
        assert!(!Backpressure::Until(3).ready(2) && Backpressure::Until(3).ready(3));
        assert_eq!((0..6).map(|t| Backpressure::OneIn(3).ready(t)).collect::<Vec<_>>(), [
            false, false, true, false, false, true
        ]);
        assert!(Backpressure::Pattern(vec![false, true]).ready(3));
        assert!(!Backpressure::Pattern(vec![]).is_live());
        assert_eq!(
            ResponderModel::default().with_backpressure(Backpressure::OneIn(0)).validate(2),
            Err(ConfigError::NeverReady { responder: 2 })
        );
    }

    #[test]
    fn masked_write_then_read() {
        let mut responder = Responder::new("responder", ResponderModel::default().with_latency(1));
        responder.poke(0x08, 0x1111_1111_1111_1111);

        let write = inputs(Some(Item::write_address(0x0c)), Some(Item::write_data(0xaaaa_bbbb_cccc_dddd, 0x0f)), None);
        let (_, i_bwd) = step(&mut responder, &write);
        assert!(i_bwd.aw.ready && i_bwd.w.ready);
        assert_eq!(responder.peek(0x08), 0x1111_1111_cccc_dddd);

        // Registered tick plus one tick of latency.
        let (o_fwd, _) = step(&mut responder, &inputs(None, None, Some(Item::read(0x08))));
        assert!(!o_fwd.b.valid);
        let (o_fwd, _) = step(&mut responder, &inputs(None, None, None));
        assert_eq!(o_fwd.b.as_option().map(|b| b.resp), Some(Resp::Okay));
        let (o_fwd, _) = step(&mut responder, &inputs(None, None, None));
        assert_eq!(o_fwd.r.as_option().map(|r| r.data), Some(0x1111_1111_cccc_dddd));
        assert!(responder.is_idle());
    }

    #[test]
    fn partial_write_is_a_slave_error_when_full_width_is_required() {
        let mut responder = Responder::new("responder", ResponderModel::default().full_width_only());
        let write = inputs(Some(Item::write_address(0x00)), Some(Item::write_data(0xff, 0x01)), None);
        step(&mut responder, &write);
        let (o_fwd, _) = step(&mut responder, &inputs(None, None, None));
        assert_eq!(o_fwd.b.as_option().map(|b| b.resp), Some(Resp::SlaveError));
        assert_eq!(responder.peek(0x00), 0);
    }

    #[test]
    fn halves_of_a_write_may_arrive_apart() {
        let mut responder = Responder::new("responder", ResponderModel::default());
        let (_, i_bwd) = step(&mut responder, &inputs(None, Some(Item::write_data(7, 0xff)), None));
        assert!(i_bwd.w.ready);
        let (_, i_bwd) = step(&mut responder, &inputs(None, Some(Item::write_data(8, 0xff)), None));
        assert!(!i_bwd.w.ready, "one write data is held at a time");
        step(&mut responder, &inputs(Some(Item::write_address(0x10)), None, None));
        assert_eq!(responder.peek(0x10), 7);
        assert_eq!(responder.accepted().iter().map(|a| a.channel).collect::<Vec<_>>(), [Channel::W, Channel::Aw]);
    }

    #[test]
    fn records_first_offer() {
        let model = ResponderModel::default().with_backpressure(Backpressure::Until(3));
        let mut responder = Responder::new("responder", model);
        let read = inputs(None, None, Some(Item::read(0x20)));
        for _ in 0..4 {
            step(&mut responder, &read);
        }
        let accepted = &responder.accepted()[0];
        assert_eq!((accepted.channel, accepted.offered_at, accepted.accepted_at), (Channel::Ar, 0, 3));
        assert_eq!(accepted.offered, accepted.accepted);
    }
}
