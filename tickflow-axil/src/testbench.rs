//! Closed system of initiators, a switch and responders.

use tickflow::{Link, Module, Phase, Settle, SimError};
use tickflow_std::{Ready, Valid};

use crate::{
    ConfigError, Initiator, InitiatorIFwd, InitiatorOBwd, Kind, Responder, ResponderIFwd, ResponderModel,
    ResponderOBwd, Switch, SwitchConfig, SwitchI, SwitchIBwd, SwitchIFwd, SwitchO, SwitchOBwd, SwitchOFwd,
};

/// Testbench: initiator `i` drives port `i` of the switch and responder `j` serves port `j`.
///
/// Runs under a [`tickflow::Simulator`]. Decode error pulses are recorded with the tick they are raised on.
#[derive(Debug)]
pub struct Testbench {
    now: u64,
    initiators: Vec<Initiator>,
    switch: Switch,
    responders: Vec<Responder>,
    upstream: Link<SwitchI>,
    downstream: Link<SwitchO>,
    pulses: Vec<(u64, Kind)>,
}

impl Testbench {
    /// Creates a new testbench with one responder per model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or a model is invalid, or if the number of models differs from the
    /// number of responders.
    pub fn new(config: SwitchConfig, models: Vec<ResponderModel>) -> Result<Self, ConfigError> {
        let n = config.initiators;
        let m = config.responders();
        if models.len() != m {
            return Err(ConfigError::ModelCount { expected: m, found: models.len() });
        }
        for (j, model) in models.iter().enumerate() {
            model.validate(j)?;
        }

        let switch = Switch::new("switch", config)?;
        let upstream = Link::new(
            "upstream",
            SwitchIFwd {
                s_aw: vec![Valid::invalid(); n],
                s_w: vec![Valid::invalid(); n],
                s_ar: vec![Valid::invalid(); n],
                m_b: vec![Valid::invalid(); m],
                m_r: vec![Valid::invalid(); m],
            },
            SwitchIBwd {
                s_aw: vec![Ready::default(); n],
                s_w: vec![Ready::default(); n],
                s_ar: vec![Ready::default(); n],
                m_b: vec![Ready::default(); m],
                m_r: vec![Ready::default(); m],
            },
        );
        let downstream = Link::new(
            "downstream",
            SwitchOFwd {
                m_aw: vec![Valid::invalid(); m],
                m_w: vec![Valid::invalid(); m],
                m_ar: vec![Valid::invalid(); m],
                s_b: vec![Valid::invalid(); n],
                s_r: vec![Valid::invalid(); n],
                write_decode_error: false,
                read_decode_error: false,
            },
            SwitchOBwd {
                m_aw: vec![Ready::default(); m],
                m_w: vec![Ready::default(); m],
                m_ar: vec![Ready::default(); m],
                s_b: vec![Ready::default(); n],
                s_r: vec![Ready::default(); n],
                write_decode_error: (),
                read_decode_error: (),
            },
        );

        Ok(Self {
            now: 0,
            initiators: (0..n).map(|i| Initiator::new(&format!("initiator{i}"))).collect(),
            switch,
            responders: models
                .into_iter()
                .enumerate()
                .map(|(j, model)| Responder::new(&format!("responder{j}"), model))
                .collect(),
            upstream,
            downstream,
            pulses: Vec::new(),
        })
    }

    /// Returns the number of ticks simulated.
    pub fn now(&self) -> u64 { self.now }

    /// Returns an initiator.
    pub fn initiator(&self, i: usize) -> &Initiator { &self.initiators[i] }

    /// Returns an initiator.
    pub fn initiator_mut(&mut self, i: usize) -> &mut Initiator { &mut self.initiators[i] }

    /// Returns every initiator.
    pub fn initiators(&self) -> &[Initiator] { &self.initiators }

    /// Returns a responder.
    pub fn responder(&self, j: usize) -> &Responder { &self.responders[j] }

    /// Returns a responder.
    pub fn responder_mut(&mut self, j: usize) -> &mut Responder { &mut self.responders[j] }

    /// Returns the switch.
    pub fn switch(&self) -> &Switch { &self.switch }

    /// Returns the decode error pulses with the ticks they were raised on.
    pub fn pulses(&self) -> &[(u64, Kind)] { &self.pulses }

    /// Returns whether every initiator has completed its script and every responder is idle.
    pub fn is_idle(&self) -> bool {
        self.initiators.iter().all(Initiator::is_idle) && self.responders.iter().all(Responder::is_idle)
    }

    fn sweep(&mut self, phase: Phase, settle: &mut Settle) -> Result<(), SimError> {
        let (up, down) = (&mut self.upstream, &mut self.downstream);

        for (i, initiator) in self.initiators.iter_mut().enumerate() {
            let i_fwd = InitiatorIFwd { b: down.fwd.s_b[i].clone(), r: down.fwd.s_r[i].clone() };
            let o_bwd = InitiatorOBwd { aw: up.bwd.s_aw[i], w: up.bwd.s_w[i], ar: up.bwd.s_ar[i] };
            if let Some((fwd, bwd)) = initiator.eval(phase, &i_fwd, &o_bwd)? {
                settle.drive(&mut up.fwd.s_aw[i], fwd.aw);
                settle.drive(&mut up.fwd.s_w[i], fwd.w);
                settle.drive(&mut up.fwd.s_ar[i], fwd.ar);
                settle.drive(&mut down.bwd.s_b[i], bwd.b);
                settle.drive(&mut down.bwd.s_r[i], bwd.r);
            }
        }

        if let Some((fwd, bwd)) = self.switch.eval(phase, &up.fwd, &down.bwd)? {
            settle.drive(&mut down.fwd, fwd);
            settle.drive(&mut up.bwd, bwd);
        }

        for (j, responder) in self.responders.iter_mut().enumerate() {
            let i_fwd = ResponderIFwd {
                aw: down.fwd.m_aw[j].clone(),
                w: down.fwd.m_w[j].clone(),
                ar: down.fwd.m_ar[j].clone(),
            };
            let o_bwd = ResponderOBwd { b: up.bwd.m_b[j], r: up.bwd.m_r[j] };
            if let Some((fwd, bwd)) = responder.eval(phase, &i_fwd, &o_bwd)? {
                settle.drive(&mut up.fwd.m_b[j], fwd.b);
                settle.drive(&mut up.fwd.m_r[j], fwd.r);
                settle.drive(&mut down.bwd.m_aw[j], bwd.aw);
                settle.drive(&mut down.bwd.m_w[j], bwd.w);
                settle.drive(&mut down.bwd.m_ar[j], bwd.ar);
            }
        }

        Ok(())
    }
}

impl Module<(), ()> for Testbench {
    fn name(&self) -> &str { "testbench" }

    fn comb(&mut self, _: &(), _: &()) -> Result<((), ()), SimError> {
        let mut settle = Settle::new();
        while settle.again("testbench")? {
            self.sweep(Phase::Comb, &mut settle)?;
        }
        Ok(((), ()))
    }

    fn tick(&mut self, i_fwd: &(), o_bwd: &()) -> Result<(), SimError> {
        self.comb(i_fwd, o_bwd)?;

        if self.downstream.fwd.write_decode_error {
            self.pulses.push((self.now, Kind::Write));
        }
        if self.downstream.fwd.read_decode_error {
            self.pulses.push((self.now, Kind::Read));
        }

        self.sweep(Phase::Tick, &mut Settle::new())?;
        self.now += 1;
        Ok(())
    }
}
