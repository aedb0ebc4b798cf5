use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use common::{contains_emulation_prevention, FormatError, NalUnit, NalUnitType};
use log::{debug, warn};
use memmap::Mmap;
use serde::Serialize;

use crate::byte_stream::{ByteStream, ByteStreamConfig};
use crate::errors::DecodingError;
use crate::parameter_sets::ParameterSets;
use crate::pps::Pps;
use crate::sps::Sps;

/// What was seen of one NAL unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitInfo {
    pub nal_unit_type: NalUnitType,
    pub nal_ref_idc: u8,
    pub payload_size: usize,
}

impl From<&NalUnit> for UnitInfo {
    fn from(nal_unit: &NalUnit) -> Self {
        Self {
            nal_unit_type: nal_unit.nal_unit_type(),
            nal_ref_idc: nal_unit.nal_ref_idc(),
            payload_size: nal_unit.payload_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Every unit with a valid header, in stream order.
    pub units: Vec<UnitInfo>,

    /// Units dropped for an invalid header or a parameter set that failed to parse.
    pub rejected_units: usize,
}

impl DecodeSummary {
    pub fn unit_counts(&self) -> BTreeMap<NalUnitType, usize> {
        let mut counts = BTreeMap::new();
        for unit in &self.units {
            *counts.entry(unit.nal_unit_type).or_insert(0) += 1;
        }
        counts
    }
}

pub struct H264Decoder {
    data: Mmap,
    config: ByteStreamConfig,
    parameter_sets: ParameterSets,
}

impl H264Decoder {
    /// Maps `file` into memory. The file must not be empty.
    pub fn from_file(file: File) -> Result<Self, DecodingError> {
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            data: mmap,
            config: ByteStreamConfig::default(),
            parameter_sets: ParameterSets::new(),
        })
    }

    pub fn from_file_path<P: AsRef<Path>>(file_path: P) -> Result<Self, DecodingError> {
        let file = File::open(file_path)?;
        H264Decoder::from_file(file)
    }

    pub fn with_config(mut self, config: ByteStreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parameter_sets(&self) -> &ParameterSets {
        &self.parameter_sets
    }

    /// Splits the mapped byte stream into NAL units and stores every parameter set that parses.
    ///
    /// Units that fail on their own are logged and counted in the summary. Only terminal errors
    /// (see `DecodingError::is_terminal`) are returned.
    pub fn decode(&mut self) -> Result<DecodeSummary, DecodingError> {
        let mut byte_stream = ByteStream::with_config(&self.data[..], self.config.clone());
        let mut summary = DecodeSummary::default();

        loop {
            let nal_unit = match byte_stream.next_nal_unit() {
                Ok(Some(nal_unit)) => nal_unit,
                Ok(None) => break,
                Err(err) if err.is_terminal() => return Err(err),
                Err(err) => {
                    warn!("skipping NAL unit: {err}");
                    summary.rejected_units += 1;
                    continue;
                }
            };

            summary.units.push(UnitInfo::from(&nal_unit));

            if let Err(err) = store_parameter_set(&mut self.parameter_sets, &nal_unit) {
                warn!("rejecting {} unit: {err}", nal_unit.nal_unit_type());
                summary.rejected_units += 1;
            }
        }

        debug!(
            "decoded {} NAL units, {} rejected",
            summary.units.len(),
            summary.rejected_units
        );

        Ok(summary)
    }
}

fn store_parameter_set(
    parameter_sets: &mut ParameterSets,
    nal_unit: &NalUnit,
) -> Result<(), FormatError> {
    let nal_unit_type = nal_unit.nal_unit_type();
    if !matches!(
        nal_unit_type,
        NalUnitType::SequenceParameterSet | NalUnitType::PictureParameterSet
    ) {
        return Ok(());
    }

    if contains_emulation_prevention(nal_unit.payload()) {
        warn!("{nal_unit_type} payload contains emulation prevention bytes, parsing it unescaped");
    }

    match nal_unit_type {
        NalUnitType::SequenceParameterSet => {
            parameter_sets.insert_sps(Sps::parse(nal_unit.payload())?);
        }
        _ => {
            parameter_sets.insert_pps(Pps::parse(nal_unit.payload())?);
        }
    }

    Ok(())
}
