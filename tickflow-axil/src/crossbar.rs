//! Crossbar of one direction.
//!
//! Request path, per initiator: guard, join of the request lanes, stage, address decoding and a demux to the
//! responders and the error sink. Per destination: arbitration over the initiators, stage. Per responder, the request
//! is then fanned out to its lanes and to a tag queue remembering the tags of the requests in flight at the responder.
//!
//! Response path, per responder: stage, join with the front of its tag queue, and a demux keyed on the tag back to the
//! initiators. The error sink's responses take the same demux. Per initiator: arbitration over the responders and the
//! error sink, stage, and a stage at the output.
//!
//! A destination that withholds `ready` stalls exactly the requests routed to it.

use tickflow::{format_ports, Link, Module, Phase, Settle, SimError};
use tickflow_macro::Interface;
use tickflow_std::{
    broadcaster, combiner, demux, map, vr_array_link, ArbMux, Broadcaster, Combiner, Demux, Fifo, Map, Ready,
    RegisterSlice, UniChannel, Valid, VrChannel,
};
use tracing::{trace, warn};

use crate::{error_sink, guard, ConfigError, ErrorSink, Guard, GuardState, Item, Kind, SwitchConfig, Tag, Target};

/// Crossbar's input interface.
#[derive(Debug, Interface)]
pub struct CrossbarI {
    /// Request lanes of every initiator: `req[i][k]` is lane `k` of initiator `i`.
    pub req: Vec<Vec<VrChannel<Item>>>,
    /// Response of every responder.
    pub resp: Vec<VrChannel<Item>>,
}

/// Crossbar's output interface.
#[derive(Debug, Interface)]
pub struct CrossbarO {
    /// Request lanes of every responder: `req[j][k]` is lane `k` of responder `j`.
    pub req: Vec<Vec<VrChannel<Item>>>,
    /// Response of every initiator.
    pub resp: Vec<VrChannel<Item>>,
    /// Raised for one tick after the error sink accepts a request.
    pub decode_error: UniChannel<bool>,
}

/// Parts of a crossbar, in request-to-response order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Guards,
    Joins,
    Ingress,
    Routes,
    Demuxes,
    Muxes,
    Strips,
    Arbitrated,
    Fanouts,
    Egress,
    Tags,
    Sink,
    Responses,
    Tagged,
    RespRoutes,
    RespDemuxes,
    RespMuxes,
    RespStrips,
    RespArbitrated,
    Delivered,
}

const PARTS: [Part; 20] = [
    Part::Guards,
    Part::Joins,
    Part::Ingress,
    Part::Routes,
    Part::Demuxes,
    Part::Muxes,
    Part::Strips,
    Part::Arbitrated,
    Part::Fanouts,
    Part::Egress,
    Part::Tags,
    Part::Sink,
    Part::Responses,
    Part::Tagged,
    Part::RespRoutes,
    Part::RespDemuxes,
    Part::RespMuxes,
    Part::RespStrips,
    Part::RespArbitrated,
    Part::Delivered,
];

/// Copies the tag of the request (lane 1) onto its response (lane 0).
fn attach_tag(lanes: &[Item]) -> Item {
    let [response, request] = lanes else { panic!("internal error: a tagged response has {} lanes", lanes.len()) };
    Item { address: request.address, kind: request.kind, tag: request.tag, ..response.clone() }
}

/// Drops the grant index stamped by an arbitrated mux. The tag already names the initiator.
fn strip(name: &str) -> Map<(Item, usize), Item> { map(name, |(item, _): &(Item, usize)| item.clone()) }

/// Crossbar of one direction: every initiator reaches every responder over `lanes` request lanes and one response
/// channel.
#[derive(Debug)]
pub struct Crossbar {
    name: String,
    kind: Kind,
    initiators: usize,
    responders: usize,
    lanes: usize,

    // per initiator
    guards: Vec<Guard<Item>>,
    joins: Vec<Combiner<Item>>,
    ingress: Vec<RegisterSlice<Item>>,
    routes: Vec<Map<Item, (Item, usize)>>,
    demuxes: Vec<Demux<Item>>,

    // per responder, and the error sink last
    muxes: Vec<ArbMux<Item>>,
    strips: Vec<Map<(Item, usize), Item>>,
    arbitrated: Vec<RegisterSlice<Item>>,

    // per responder
    fanouts: Vec<Broadcaster<Item>>,
    egress: Vec<Vec<RegisterSlice<Item>>>,
    tags: Vec<Fifo<Item>>,
    responses: Vec<RegisterSlice<Item>>,
    tagged: Vec<Combiner<Item>>,

    sink: ErrorSink,

    // per responder, and the error sink last
    resp_routes: Vec<Map<Item, (Item, usize)>>,
    resp_demuxes: Vec<Demux<Item>>,

    // per initiator
    resp_muxes: Vec<ArbMux<Item>>,
    resp_strips: Vec<Map<(Item, usize), Item>>,
    resp_arbitrated: Vec<RegisterSlice<Item>>,
    delivered: Vec<RegisterSlice<Item>>,

    guarded: Vec<Link<Vec<VrChannel<Item>>>>,
    joined: Link<Vec<VrChannel<Item>>>,
    staged: Link<Vec<VrChannel<Item>>>,
    routed: Link<Vec<VrChannel<(Item, usize)>>>,
    /// `offers[i].fwd[d]`: request of initiator `i` for destination `d`.
    offers: Vec<Link<Vec<VrChannel<Item>>>>,
    muxed: Link<Vec<VrChannel<(Item, usize)>>>,
    granted: Link<Vec<VrChannel<Item>>>,
    arrived: Link<Vec<VrChannel<Item>>>,
    fanned: Vec<Link<Vec<VrChannel<Item>>>>,
    paired: Vec<Link<Vec<VrChannel<Item>>>>,
    replies: Link<Vec<VrChannel<Item>>>,
    returning: Link<Vec<VrChannel<(Item, usize)>>>,
    /// `homes[d].fwd[i]`: response of destination `d` for initiator `i`.
    homes: Vec<Link<Vec<VrChannel<Item>>>>,
    resp_muxed: Link<Vec<VrChannel<(Item, usize)>>>,
    collected: Link<Vec<VrChannel<Item>>>,
    resp_granted: Link<Vec<VrChannel<Item>>>,

    o_fwd: CrossbarOFwd,
    i_bwd: CrossbarIBwd,
}

impl Crossbar {
    /// Creates a new crossbar. `merge` joins the request lanes of an initiator into one item.
    pub fn new(
        name: &str, kind: Kind, lanes: usize, merge: fn(&[Item]) -> Item, config: &SwitchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let n = config.initiators;
        let m = config.responders();
        let stages = config.stages;
        let policy = config.arbitration;

        let routes = (0..n)
            .map(|i| {
                let decoder = config.decoder();
                let links = config.clone();
                map(&format!("{name}_route{i}"), move |request: &Item| {
                    let dest = match decoder.decode(request.address) {
                        Target::Responder(j) if links.link_enabled(i, j) => j,
                        _ => m,
                    };
                    (Item { kind, tag: Tag { initiator: i, kind }, ..request.clone() }, dest)
                })
            })
            .collect();
        let resp_routes = (0..=m)
            .map(|d| {
                map(&format!("{name}_resp_route{d}"), |response: &Item| (response.clone(), response.tag.initiator))
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            kind,
            initiators: n,
            responders: m,
            lanes,

            guards: (0..n).map(|i| guard(&format!("{name}_guard{i}"), lanes)).collect(),
            joins: (0..n).map(|i| combiner(&format!("{name}_join{i}"), merge)).collect(),
            ingress: (0..n)
                .map(|i| RegisterSlice::new(&format!("{name}_ingress{i}"), stages.initiator_request))
                .collect(),
            routes,
            demuxes: (0..n).map(|i| demux(&format!("{name}_demux{i}"), m + 1)).collect(),

            muxes: (0..=m).map(|d| ArbMux::new(&format!("{name}_mux{d}"), n, policy)).collect(),
            strips: (0..=m).map(|d| strip(&format!("{name}_strip{d}"))).collect(),
            arbitrated: (0..=m)
                .map(|d| RegisterSlice::new(&format!("{name}_arbitrated{d}"), stages.arbitration))
                .collect(),

            fanouts: (0..m).map(|j| broadcaster(&format!("{name}_fanout{j}"), lanes + 1)).collect(),
            egress: (0..m)
                .map(|j| {
                    (0..lanes)
                        .map(|k| RegisterSlice::new(&format!("{name}_egress{j}_{k}"), stages.responder_request))
                        .collect()
                })
                .collect(),
            tags: (0..m).map(|j| Fifo::new(&format!("{name}_tags{j}"), n)).collect(),
            responses: (0..m)
                .map(|j| RegisterSlice::new(&format!("{name}_response{j}"), stages.responder_response))
                .collect(),
            tagged: (0..m).map(|j| combiner(&format!("{name}_tagged{j}"), attach_tag)).collect(),

            sink: error_sink(&format!("{name}_sink")),

            resp_routes,
            resp_demuxes: (0..=m).map(|d| demux(&format!("{name}_resp_demux{d}"), n)).collect(),

            resp_muxes: (0..n).map(|i| ArbMux::new(&format!("{name}_resp_mux{i}"), m + 1, policy)).collect(),
            resp_strips: (0..n).map(|i| strip(&format!("{name}_resp_strip{i}"))).collect(),
            resp_arbitrated: (0..n)
                .map(|i| RegisterSlice::new(&format!("{name}_resp_arbitrated{i}"), stages.response_arbitration))
                .collect(),
            delivered: (0..n)
                .map(|i| RegisterSlice::new(&format!("{name}_delivered{i}"), stages.initiator_response))
                .collect(),

            guarded: (0..n).map(|i| vr_array_link(&format!("guarded{i}"), lanes)).collect(),
            joined: vr_array_link("joined", n),
            staged: vr_array_link("staged", n),
            routed: vr_array_link("routed", n),
            offers: (0..n).map(|i| vr_array_link(&format!("offers{i}"), m + 1)).collect(),
            muxed: vr_array_link("muxed", m + 1),
            granted: vr_array_link("granted", m + 1),
            arrived: vr_array_link("arrived", m + 1),
            fanned: (0..m).map(|j| vr_array_link(&format!("fanned{j}"), lanes + 1)).collect(),
            paired: (0..m).map(|j| vr_array_link(&format!("paired{j}"), 2)).collect(),
            replies: vr_array_link("replies", m + 1),
            returning: vr_array_link("returning", m + 1),
            homes: (0..=m).map(|d| vr_array_link(&format!("homes{d}"), n)).collect(),
            resp_muxed: vr_array_link("resp_muxed", n),
            collected: vr_array_link("collected", n),
            resp_granted: vr_array_link("resp_granted", n),

            o_fwd: CrossbarOFwd {
                req: vec![vec![Valid::invalid(); lanes]; m],
                resp: vec![Valid::invalid(); n],
                decode_error: false,
            },
            i_bwd: CrossbarIBwd { req: vec![vec![Ready::default(); lanes]; n], resp: vec![Ready::default(); m] },
        })
    }

    /// Returns the kind of requests carried.
    pub fn kind(&self) -> Kind { self.kind }

    /// Returns the number of initiators.
    pub fn initiators(&self) -> usize { self.initiators }

    /// Returns the number of responders.
    pub fn responders(&self) -> usize { self.responders }

    /// Returns the number of request lanes.
    pub fn lanes(&self) -> usize { self.lanes }

    /// Returns the guard state of an initiator.
    pub fn guard_state(&self, initiator: usize) -> Option<&GuardState> {
        self.guards.get(initiator).map(|guard| guard.state())
    }

    /// Returns the number of requests in flight at a responder.
    pub fn tags_in_flight(&self, responder: usize) -> Option<usize> { self.tags.get(responder).map(Fifo::len) }

    fn eval(
        &mut self, part: Part, phase: Phase, settle: &mut Settle, i_fwd: &CrossbarIFwd, o_bwd: &CrossbarOBwd,
    ) -> Result<(), SimError> {
        match part {
            Part::Guards => {
                for (i, guard) in self.guards.iter_mut().enumerate() {
                    let delivered = self.o_fwd.resp[i].fire(&o_bwd.resp[i]);
                    let input = (i_fwd.req[i].clone(), delivered);
                    if let Some((fwd, (bwd, ()))) = guard.eval(phase, &input, &self.guarded[i].bwd)? {
                        settle.drive(&mut self.guarded[i].fwd, fwd);
                        settle.drive(&mut self.i_bwd.req[i], bwd);
                    }
                }
            }
            Part::Joins => {
                for (i, join) in self.joins.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = join.eval(phase, &self.guarded[i].fwd, &self.joined.bwd[i])? {
                        settle.drive(&mut self.joined.fwd[i], fwd);
                        settle.drive(&mut self.guarded[i].bwd, bwd);
                    }
                }
            }
            Part::Ingress => {
                for (i, slice) in self.ingress.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = slice.eval(phase, &self.joined.fwd[i], &self.staged.bwd[i])? {
                        settle.drive(&mut self.staged.fwd[i], fwd);
                        settle.drive(&mut self.joined.bwd[i], bwd);
                    }
                }
            }
            Part::Routes => {
                for (i, route) in self.routes.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = route.eval(phase, &self.staged.fwd[i], &self.routed.bwd[i])? {
                        settle.drive(&mut self.routed.fwd[i], fwd);
                        settle.drive(&mut self.staged.bwd[i], bwd);
                    }
                }
            }
            Part::Demuxes => {
                for (i, demux) in self.demuxes.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = demux.eval(phase, &self.routed.fwd[i], &self.offers[i].bwd)? {
                        settle.drive(&mut self.offers[i].fwd, fwd);
                        settle.drive(&mut self.routed.bwd[i], bwd);
                    }
                }
            }
            Part::Muxes => {
                for (d, mux) in self.muxes.iter_mut().enumerate() {
                    let offered = self.offers.iter().map(|offer| offer.fwd[d].clone()).collect::<Vec<_>>();
                    if let Some((fwd, bwd)) = mux.eval(phase, &offered, &self.muxed.bwd[d])? {
                        settle.drive(&mut self.muxed.fwd[d], fwd);
                        for (offer, ready) in self.offers.iter_mut().zip(bwd) {
                            settle.drive(&mut offer.bwd[d], ready);
                        }
                    }
                }
            }
            Part::Strips => {
                for (d, strip) in self.strips.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = strip.eval(phase, &self.muxed.fwd[d], &self.granted.bwd[d])? {
                        settle.drive(&mut self.granted.fwd[d], fwd);
                        settle.drive(&mut self.muxed.bwd[d], bwd);
                    }
                }
            }
            Part::Arbitrated => {
                for (d, slice) in self.arbitrated.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = slice.eval(phase, &self.granted.fwd[d], &self.arrived.bwd[d])? {
                        settle.drive(&mut self.arrived.fwd[d], fwd);
                        settle.drive(&mut self.granted.bwd[d], bwd);
                    }
                }
            }
            Part::Fanouts => {
                for (j, fanout) in self.fanouts.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = fanout.eval(phase, &self.arrived.fwd[j], &self.fanned[j].bwd)? {
                        settle.drive(&mut self.fanned[j].fwd, fwd);
                        settle.drive(&mut self.arrived.bwd[j], bwd);
                    }
                }
            }
            Part::Egress => {
                for (j, slices) in self.egress.iter_mut().enumerate() {
                    for (k, slice) in slices.iter_mut().enumerate() {
                        if let Some((fwd, bwd)) = slice.eval(phase, &self.fanned[j].fwd[k], &o_bwd.req[j][k])? {
                            settle.drive(&mut self.o_fwd.req[j][k], fwd);
                            settle.drive(&mut self.fanned[j].bwd[k], bwd);
                        }
                    }
                }
            }
            Part::Tags => {
                let lanes = self.lanes;
                for (j, tags) in self.tags.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = tags.eval(phase, &self.fanned[j].fwd[lanes], &self.paired[j].bwd[1])? {
                        settle.drive(&mut self.paired[j].fwd[1], fwd);
                        settle.drive(&mut self.fanned[j].bwd[lanes], bwd);
                    }
                }
            }
            Part::Sink => {
                let m = self.responders;
                let o_bwd = (self.replies.bwd[m], ());
                if let Some(((fwd, pulse), bwd)) = self.sink.eval(phase, &self.arrived.fwd[m], &o_bwd)? {
                    settle.drive(&mut self.replies.fwd[m], fwd);
                    settle.drive(&mut self.o_fwd.decode_error, pulse);
                    settle.drive(&mut self.arrived.bwd[m], bwd);
                }
            }
            Part::Responses => {
                for (j, slice) in self.responses.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = slice.eval(phase, &i_fwd.resp[j], &self.paired[j].bwd[0])? {
                        settle.drive(&mut self.paired[j].fwd[0], fwd);
                        settle.drive(&mut self.i_bwd.resp[j], bwd);
                    }
                }
            }
            Part::Tagged => {
                for (j, join) in self.tagged.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = join.eval(phase, &self.paired[j].fwd, &self.replies.bwd[j])? {
                        settle.drive(&mut self.replies.fwd[j], fwd);
                        settle.drive(&mut self.paired[j].bwd, bwd);
                    }
                }
            }
            Part::RespRoutes => {
                for (d, route) in self.resp_routes.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = route.eval(phase, &self.replies.fwd[d], &self.returning.bwd[d])? {
                        settle.drive(&mut self.returning.fwd[d], fwd);
                        settle.drive(&mut self.replies.bwd[d], bwd);
                    }
                }
            }
            Part::RespDemuxes => {
                for (d, demux) in self.resp_demuxes.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = demux.eval(phase, &self.returning.fwd[d], &self.homes[d].bwd)? {
                        settle.drive(&mut self.homes[d].fwd, fwd);
                        settle.drive(&mut self.returning.bwd[d], bwd);
                    }
                }
            }
            Part::RespMuxes => {
                for (i, mux) in self.resp_muxes.iter_mut().enumerate() {
                    let offered = self.homes.iter().map(|home| home.fwd[i].clone()).collect::<Vec<_>>();
                    if let Some((fwd, bwd)) = mux.eval(phase, &offered, &self.resp_muxed.bwd[i])? {
                        settle.drive(&mut self.resp_muxed.fwd[i], fwd);
                        for (home, ready) in self.homes.iter_mut().zip(bwd) {
                            settle.drive(&mut home.bwd[i], ready);
                        }
                    }
                }
            }
            Part::RespStrips => {
                for (i, strip) in self.resp_strips.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = strip.eval(phase, &self.resp_muxed.fwd[i], &self.collected.bwd[i])? {
                        settle.drive(&mut self.collected.fwd[i], fwd);
                        settle.drive(&mut self.resp_muxed.bwd[i], bwd);
                    }
                }
            }
            Part::RespArbitrated => {
                for (i, slice) in self.resp_arbitrated.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = slice.eval(phase, &self.collected.fwd[i], &self.resp_granted.bwd[i])? {
                        settle.drive(&mut self.resp_granted.fwd[i], fwd);
                        settle.drive(&mut self.collected.bwd[i], bwd);
                    }
                }
            }
            Part::Delivered => {
                for (i, slice) in self.delivered.iter_mut().enumerate() {
                    if let Some((fwd, bwd)) = slice.eval(phase, &self.resp_granted.fwd[i], &o_bwd.resp[i])? {
                        settle.drive(&mut self.o_fwd.resp[i], fwd);
                        settle.drive(&mut self.resp_granted.bwd[i], bwd);
                    }
                }
            }
        }

        Ok(())
    }

    /// Logs the transfers of the settled tick.
    fn log_transfers(&self, o_bwd: &CrossbarOBwd) {
        let sink = self.responders;
        if self.arrived.fwd[sink].fire(&self.arrived.bwd[sink]) {
            let request = &self.arrived.fwd[sink].inner;
            let (initiator, address) = (request.tag.initiator, request.address);
            warn!(crossbar = %self.name, initiator, address, "no responder is mapped");
        }

        for (j, (fwd, bwd)) in self.arrived.fwd.iter().zip(&self.arrived.bwd).take(sink).enumerate() {
            if fwd.fire(bwd) {
                trace!(crossbar = %self.name, responder = j, request = %format_ports(&fwd.inner), "routed");
            }
        }

        for (i, (fwd, bwd)) in self.o_fwd.resp.iter().zip(&o_bwd.resp).enumerate() {
            if fwd.fire(bwd) {
                trace!(crossbar = %self.name, initiator = i, response = %format_ports(&fwd.inner), "delivered");
            }
        }
    }
}

impl Module<CrossbarI, CrossbarO> for Crossbar {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, i_fwd: &CrossbarIFwd, o_bwd: &CrossbarOBwd) -> Result<(CrossbarOFwd, CrossbarIBwd), SimError> {
        let mut settle = Settle::new();
        while settle.again(&self.name)? {
            for part in PARTS {
                self.eval(part, Phase::Comb, &mut settle, i_fwd, o_bwd)?;
            }
            for part in PARTS.into_iter().rev() {
                self.eval(part, Phase::Comb, &mut settle, i_fwd, o_bwd)?;
            }
        }

        Ok((self.o_fwd.clone(), self.i_bwd.clone()))
    }

    fn tick(&mut self, i_fwd: &CrossbarIFwd, o_bwd: &CrossbarOBwd) -> Result<(), SimError> {
        self.comb(i_fwd, o_bwd)?;
        self.log_transfers(o_bwd);

        let idle = self.guards.iter().map(|guard| guard.state().is_idle()).collect::<Vec<_>>();
        let mut settle = Settle::new();
        for part in PARTS {
            self.eval(part, Phase::Tick, &mut settle, i_fwd, o_bwd)?;
        }
        for (i, (guard, was_idle)) in self.guards.iter().zip(idle).enumerate() {
            if guard.state().is_idle() != was_idle {
                trace!(crossbar = %self.name, initiator = i, state = ?guard.state(), "guard");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tickflow_std::first;

    use super::*;
    use crate::{Resp, Route};

    struct Bench {
        crossbar: Crossbar,
        i_fwd: CrossbarIFwd,
        o_bwd: CrossbarOBwd,
    }

    impl Bench {
        fn new(initiators: usize, routes: Vec<Route>) -> Self {
            let config = SwitchConfig::new(initiators, routes);
            let crossbar = Crossbar::new("read", Kind::Read, 1, first, &config).unwrap();
            let m = config.responders();
            Self {
                crossbar,
                i_fwd: CrossbarIFwd {
                    req: vec![vec![Valid::invalid()]; initiators],
                    resp: vec![Valid::invalid(); m],
                },
                o_bwd: CrossbarOBwd {
                    req: vec![vec![Ready::new(true)]; m],
                    resp: vec![Ready::new(true); initiators],
                    decode_error: (),
                },
            }
        }

        fn step(&mut self) -> (CrossbarOFwd, CrossbarIBwd) {
            let outputs = self.crossbar.comb(&self.i_fwd, &self.o_bwd).unwrap();
            self.crossbar.tick(&self.i_fwd, &self.o_bwd).unwrap();
            outputs
        }
    }

    #[test]
    fn read_travels_there_and_back() {
        let mut bench = Bench::new(2, vec![Route::range(0x00, 0xff)]);
        bench.i_fwd.req[0][0] = Valid::valid(Item::read(0x10));

        let (o_fwd, i_bwd) = bench.step();
        let request = o_fwd.req[0][0].as_option().unwrap();
        assert_eq!(request.tag, Tag { initiator: 0, kind: Kind::Read });
        assert_eq!(request.address, 0x10);
        assert!(i_bwd.req[0][0].ready);
        assert_eq!(bench.crossbar.guard_state(0), Some(&GuardState::InFlight));
        assert_eq!(bench.crossbar.tags_in_flight(0), Some(1));

        bench.i_fwd.req[0][0] = Valid::valid(Item::read(0x20));
        bench.i_fwd.resp[0] = Valid::valid(Item::response(Kind::Read, Resp::Okay, 0x55));
        let (o_fwd, i_bwd) = bench.step();
        assert!(!o_fwd.req[0][0].valid, "second read is held by the guard");
        assert!(!i_bwd.req[0][0].ready);
        assert!(i_bwd.resp[0].ready);
        let response = o_fwd.resp[0].as_option().unwrap();
        assert_eq!((response.data, response.resp, response.address), (0x55, Resp::Okay, 0x10));
        assert!(!o_fwd.resp[1].valid);
        assert!(bench.crossbar.guard_state(0).unwrap().is_idle());
        assert_eq!(bench.crossbar.tags_in_flight(0), Some(0));

        bench.i_fwd.resp[0] = Valid::invalid();
        let (o_fwd, _) = bench.step();
        assert_eq!(o_fwd.req[0][0].as_option().map(|item| item.address), Some(0x20));
    }

    #[test]
    fn stalled_responder_only_stalls_its_initiators() {
        let mut bench = Bench::new(2, vec![Route::range(0x000, 0x0ff), Route::range(0x100, 0x1ff)]);
        bench.o_bwd.req[0][0] = Ready::new(false);
        bench.i_fwd.req[0][0] = Valid::valid(Item::read(0x010));
        bench.i_fwd.req[1][0] = Valid::valid(Item::read(0x110));

        let (o_fwd, i_bwd) = bench.step();
        assert!(o_fwd.req[0][0].valid);
        assert!(!i_bwd.req[0][0].ready);
        let request = o_fwd.req[1][0].as_option().unwrap();
        assert_eq!(request.tag, Tag { initiator: 1, kind: Kind::Read });
        assert!(i_bwd.req[1][0].ready);
        assert_eq!(bench.crossbar.tags_in_flight(0), Some(0));
        assert_eq!(bench.crossbar.tags_in_flight(1), Some(1));
    }

    #[test]
    fn stalled_initiator_only_stalls_its_responses() {
        let mut bench = Bench::new(2, vec![Route::range(0x000, 0x0ff), Route::range(0x100, 0x1ff)]);
        bench.o_bwd.resp[0] = Ready::new(false);
        bench.i_fwd.req[0][0] = Valid::valid(Item::read(0x010));
        bench.i_fwd.req[1][0] = Valid::valid(Item::read(0x110));
        bench.step();

        bench.i_fwd.req = vec![vec![Valid::invalid()]; 2];
        bench.i_fwd.resp = vec![
            Valid::valid(Item::response(Kind::Read, Resp::Okay, 0xaa)),
            Valid::valid(Item::response(Kind::Read, Resp::Okay, 0xbb)),
        ];
        let (o_fwd, i_bwd) = bench.step();
        assert!(o_fwd.resp[0].valid);
        assert!(!i_bwd.resp[0].ready);
        assert_eq!(o_fwd.resp[1].as_option().map(|item| item.data), Some(0xbb));
        assert!(i_bwd.resp[1].ready);
        assert!(bench.crossbar.guard_state(1).unwrap().is_idle());
        assert_eq!(bench.crossbar.guard_state(0), Some(&GuardState::InFlight));
    }

    #[test]
    fn unmapped_read_is_answered_by_the_sink() {
        let mut bench = Bench::new(2, vec![Route::range(0x00, 0xff)]);
        bench.i_fwd.req[1][0] = Valid::valid(Item::read(0x200));

        let (o_fwd, i_bwd) = bench.step();
        assert!(!o_fwd.req[0][0].valid);
        assert!(i_bwd.req[1][0].ready);
        assert!(!o_fwd.decode_error);

        bench.i_fwd.req[1][0] = Valid::invalid();
        let (o_fwd, _) = bench.step();
        assert!(o_fwd.decode_error);
        let response = o_fwd.resp[1].as_option().unwrap();
        assert_eq!(response.resp, Resp::DecodeError);
        assert_eq!(response.tag, Tag { initiator: 1, kind: Kind::Read });

        let (o_fwd, _) = bench.step();
        assert!(!o_fwd.decode_error);
        assert!(bench.crossbar.guard_state(1).unwrap().is_idle());
    }

    #[test]
    fn disabled_link_is_unmapped() {
        let config = SwitchConfig::new(1, vec![Route::range(0x00, 0xff)]).with_links(vec![vec![false]]);
        let mut crossbar = Crossbar::new("read", Kind::Read, 1, first, &config).unwrap();
        let i_fwd = CrossbarIFwd { req: vec![vec![Valid::valid(Item::read(0x10))]], resp: vec![Valid::invalid()] };
        let o_bwd = CrossbarOBwd { req: vec![vec![Ready::new(true)]], resp: vec![Ready::new(true)], decode_error: () };

        let (o_fwd, i_bwd) = crossbar.comb(&i_fwd, &o_bwd).unwrap();
        assert!(!o_fwd.req[0][0].valid);
        assert!(i_bwd.req[0][0].ready);
        crossbar.tick(&i_fwd, &o_bwd).unwrap();

        let (o_fwd, _) = crossbar.comb(&i_fwd, &o_bwd).unwrap();
        assert!(o_fwd.decode_error);
        assert_eq!(o_fwd.resp[0].as_option().map(|item| item.resp), Some(Resp::DecodeError));
    }
}
