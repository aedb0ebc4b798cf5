use std::collections::BTreeMap;

use log::debug;

use crate::pps::Pps;
use crate::sps::Sps;

/// Active parameter sets keyed by id. A set received with an id already in use replaces the
/// stored one.
#[derive(Debug, Clone, Default)]
pub struct ParameterSets {
    sps: BTreeMap<u32, Sps>,
    pps: BTreeMap<u32, Pps>,
}

impl ParameterSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `sps`, returning the set it replaced.
    pub fn insert_sps(&mut self, sps: Sps) -> Option<Sps> {
        debug!(
            "storing SPS {} (profile {}, level {})",
            sps.seq_parameter_set_id, sps.profile_idc, sps.level_idc
        );
        self.sps.insert(sps.seq_parameter_set_id, sps)
    }

    /// Stores `pps`, returning the set it replaced.
    pub fn insert_pps(&mut self, pps: Pps) -> Option<Pps> {
        debug!(
            "storing PPS {} referring to SPS {}",
            pps.pic_parameter_set_id, pps.seq_parameter_set_id
        );
        self.pps.insert(pps.pic_parameter_set_id, pps)
    }

    pub fn sps(&self, seq_parameter_set_id: u32) -> Option<&Sps> {
        self.sps.get(&seq_parameter_set_id)
    }

    pub fn pps(&self, pic_parameter_set_id: u32) -> Option<&Pps> {
        self.pps.get(&pic_parameter_set_id)
    }

    /// The SPS `pps` refers to, if it has been received.
    pub fn sps_for(&self, pps: &Pps) -> Option<&Sps> {
        self.sps(pps.seq_parameter_set_id)
    }

    /// Stored sets in ascending id order.
    pub fn sps_iter(&self) -> impl Iterator<Item = &Sps> {
        self.sps.values()
    }

    pub fn pps_iter(&self) -> impl Iterator<Item = &Pps> {
        self.pps.values()
    }

    pub fn is_empty(&self) -> bool {
        self.sps.is_empty() && self.pps.is_empty()
    }
}
