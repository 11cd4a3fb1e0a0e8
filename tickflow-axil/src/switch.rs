//! Switch.

use itertools::izip;
use tickflow::{Module, SimError};
use tickflow_macro::Interface;
use tickflow_std::{first, UniChannel, VrChannel};

use crate::{
    ConfigError, Crossbar, CrossbarIBwd, CrossbarIFwd, CrossbarOBwd, CrossbarOFwd, GuardState, Item, Kind,
    SwitchConfig,
};

/// Switch's input interface.
///
/// `s_*` are the channels of the initiators (indexed by initiator), `m_*` the response channels of the responders
/// (indexed by responder).
#[derive(Debug, Interface)]
pub struct SwitchI {
    /// Write addresses.
    pub s_aw: Vec<VrChannel<Item>>,
    /// Write data.
    pub s_w: Vec<VrChannel<Item>>,
    /// Read addresses.
    pub s_ar: Vec<VrChannel<Item>>,
    /// Write responses.
    pub m_b: Vec<VrChannel<Item>>,
    /// Read responses.
    pub m_r: Vec<VrChannel<Item>>,
}

/// Switch's output interface.
///
/// `m_*` are the request channels of the responders, `s_*` the response channels of the initiators.
#[derive(Debug, Interface)]
pub struct SwitchO {
    /// Write addresses.
    pub m_aw: Vec<VrChannel<Item>>,
    /// Write data.
    pub m_w: Vec<VrChannel<Item>>,
    /// Read addresses.
    pub m_ar: Vec<VrChannel<Item>>,
    /// Write responses.
    pub s_b: Vec<VrChannel<Item>>,
    /// Read responses.
    pub s_r: Vec<VrChannel<Item>>,
    /// Raised for one tick after a write is routed to the error sink.
    pub write_decode_error: UniChannel<bool>,
    /// Raised for one tick after a read is routed to the error sink.
    pub read_decode_error: UniChannel<bool>,
}

/// Joins the address (lane 0) and the data (lane 1) of a write.
fn merge_write(lanes: &[Item]) -> Item {
    let [address, data] = lanes else { panic!("internal error: a write has {} lanes", lanes.len()) };
    Item { data: data.data, byte_mask: data.byte_mask, ..address.clone() }
}

/// Lane `k` of every channel group.
fn lane<T: Clone>(groups: &[Vec<T>], k: usize) -> Vec<T> { groups.iter().map(|lanes| lanes[k].clone()).collect() }

/// Switch: every initiator reaches every responder. Writes and reads travel through independent crossbars.
#[derive(Debug)]
pub struct Switch {
    name: String,
    config: SwitchConfig,
    write: Crossbar,
    read: Crossbar,
}

impl Switch {
    /// Creates a new switch.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(name: &str, config: SwitchConfig) -> Result<Self, ConfigError> {
        let write = Crossbar::new(&format!("{name}_write"), Kind::Write, 2, merge_write, &config)?;
        let read = Crossbar::new(&format!("{name}_read"), Kind::Read, 1, first, &config)?;
        Ok(Self { name: name.to_string(), config, write, read })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SwitchConfig { &self.config }

    /// Returns the crossbar of the given kind.
    pub fn crossbar(&self, kind: Kind) -> &Crossbar {
        match kind {
            Kind::Read => &self.read,
            Kind::Write => &self.write,
        }
    }

    /// Returns the guard state of an initiator.
    pub fn guard_state(&self, initiator: usize, kind: Kind) -> Option<&GuardState> {
        self.crossbar(kind).guard_state(initiator)
    }

    /// Returns the number of requests of the given kind in flight at a responder.
    pub fn tags_in_flight(&self, responder: usize, kind: Kind) -> Option<usize> {
        self.crossbar(kind).tags_in_flight(responder)
    }

    fn split(i_fwd: &SwitchIFwd, o_bwd: &SwitchOBwd) -> [(CrossbarIFwd, CrossbarOBwd); 2] {
        let write = (
            CrossbarIFwd {
                req: izip!(&i_fwd.s_aw, &i_fwd.s_w).map(|(aw, w)| vec![aw.clone(), w.clone()]).collect(),
                resp: i_fwd.m_b.clone(),
            },
            CrossbarOBwd {
                req: izip!(&o_bwd.m_aw, &o_bwd.m_w).map(|(aw, w)| vec![*aw, *w]).collect(),
                resp: o_bwd.s_b.clone(),
                decode_error: (),
            },
        );
        let read = (
            CrossbarIFwd { req: i_fwd.s_ar.iter().map(|ar| vec![ar.clone()]).collect(), resp: i_fwd.m_r.clone() },
            CrossbarOBwd {
                req: o_bwd.m_ar.iter().map(|ar| vec![*ar]).collect(),
                resp: o_bwd.s_r.clone(),
                decode_error: (),
            },
        );
        [write, read]
    }

    fn join(write: (CrossbarOFwd, CrossbarIBwd), read: (CrossbarOFwd, CrossbarIBwd)) -> (SwitchOFwd, SwitchIBwd) {
        let (write_fwd, write_bwd) = write;
        let (read_fwd, read_bwd) = read;
        let o_fwd = SwitchOFwd {
            m_aw: lane(&write_fwd.req, 0),
            m_w: lane(&write_fwd.req, 1),
            m_ar: lane(&read_fwd.req, 0),
            s_b: write_fwd.resp,
            s_r: read_fwd.resp,
            write_decode_error: write_fwd.decode_error,
            read_decode_error: read_fwd.decode_error,
        };
        let i_bwd = SwitchIBwd {
            s_aw: lane(&write_bwd.req, 0),
            s_w: lane(&write_bwd.req, 1),
            s_ar: lane(&read_bwd.req, 0),
            m_b: write_bwd.resp,
            m_r: read_bwd.resp,
        };
        (o_fwd, i_bwd)
    }
}

impl Module<SwitchI, SwitchO> for Switch {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, i_fwd: &SwitchIFwd, o_bwd: &SwitchOBwd) -> Result<(SwitchOFwd, SwitchIBwd), SimError> {
        let [(write_fwd, write_bwd), (read_fwd, read_bwd)] = Self::split(i_fwd, o_bwd);
        let write = self.write.comb(&write_fwd, &write_bwd)?;
        let read = self.read.comb(&read_fwd, &read_bwd)?;
        Ok(Self::join(write, read))
    }

    fn tick(&mut self, i_fwd: &SwitchIFwd, o_bwd: &SwitchOBwd) -> Result<(), SimError> {
        let [(write_fwd, write_bwd), (read_fwd, read_bwd)] = Self::split(i_fwd, o_bwd);
        self.write.tick(&write_fwd, &write_bwd)?;
        self.read.tick(&read_fwd, &read_bwd)
    }
}

#[cfg(test)]
mod tests {
    use tickflow_std::{Ready, Valid};

    use super::*;
    use crate::{Route, Tag};

    fn idle(n: usize, m: usize) -> (SwitchIFwd, SwitchOBwd) {
        let i_fwd = SwitchIFwd {
            s_aw: vec![Valid::invalid(); n],
            s_w: vec![Valid::invalid(); n],
            s_ar: vec![Valid::invalid(); n],
            m_b: vec![Valid::invalid(); m],
            m_r: vec![Valid::invalid(); m],
        };
        let o_bwd = SwitchOBwd {
            m_aw: vec![Ready::new(true); m],
            m_w: vec![Ready::new(true); m],
            m_ar: vec![Ready::new(true); m],
            s_b: vec![Ready::new(true); n],
            s_r: vec![Ready::new(true); n],
            write_decode_error: (),
            read_decode_error: (),
        };
        (i_fwd, o_bwd)
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert_eq!(Switch::new("switch", SwitchConfig::new(1, vec![])).unwrap_err(), ConfigError::NoResponders);
    }

    #[test]
    fn write_waits_for_both_halves() {
        let mut switch = Switch::new("switch", SwitchConfig::new(1, vec![Route::range(0x00, 0xff)])).unwrap();
        let (mut i_fwd, o_bwd) = idle(1, 1);

        i_fwd.s_w[0] = Valid::valid(Item::write_data(0x1234, 0x03));
        let (o_fwd, i_bwd) = switch.comb(&i_fwd, &o_bwd).unwrap();
        assert!(!o_fwd.m_aw[0].valid && !o_fwd.m_w[0].valid);
        assert!(!i_bwd.s_w[0].ready);
        switch.tick(&i_fwd, &o_bwd).unwrap();

        i_fwd.s_aw[0] = Valid::valid(Item::write_address(0x40));
        let (o_fwd, i_bwd) = switch.comb(&i_fwd, &o_bwd).unwrap();
        let aw = o_fwd.m_aw[0].as_option().unwrap();
        let w = o_fwd.m_w[0].as_option().unwrap();
        assert_eq!(aw, w);
        assert_eq!((aw.address, aw.data, aw.byte_mask), (0x40, 0x1234, 0x03));
        assert_eq!(aw.tag, Tag { initiator: 0, kind: Kind::Write });
        assert!(i_bwd.s_aw[0].ready && i_bwd.s_w[0].ready);
        assert!(!o_fwd.m_ar[0].valid);
        switch.tick(&i_fwd, &o_bwd).unwrap();

        assert_eq!(switch.guard_state(0, Kind::Write), Some(&GuardState::InFlight));
        assert!(switch.guard_state(0, Kind::Read).unwrap().is_idle());
        assert_eq!(switch.tags_in_flight(0, Kind::Write), Some(1));
    }
}
