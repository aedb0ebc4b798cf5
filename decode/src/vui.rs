//! Video usability information (Annex E.1.1) and the hypothetical reference decoder parameters
//! nested inside it (Annex E.1.2).

use common::{BitCursor, FormatError};
use serde::Serialize;

/// `aspect_ratio_idc` value signalling an explicit `sar_width`/`sar_height` pair.
pub const EXTENDED_SAR: u8 = 255;

/// Sample aspect ratios for `aspect_ratio_idc` 0 to 16 (Table E-1). Entry 0 is unspecified.
const SAMPLE_ASPECT_RATIOS: [(u16, u16); 17] = [
    (0, 0),
    (1, 1),
    (12, 11),
    (10, 11),
    (16, 11),
    (40, 33),
    (24, 11),
    (20, 11),
    (32, 11),
    (80, 33),
    (18, 11),
    (15, 11),
    (64, 33),
    (160, 99),
    (4, 3),
    (3, 2),
    (2, 1),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HrdParameters {
    pub cpb_cnt_minus1: u32,
    pub bit_rate_scale: u8,
    pub cpb_size_scale: u8,

    /// One entry per `SchedSelIdx`, `cpb_cnt_minus1 + 1` in total. Same for the two arrays below.
    pub bit_rate_value_minus1: Vec<u32>,
    pub cpb_size_value_minus1: Vec<u32>,
    pub cbr_flag: Vec<bool>,

    pub initial_cpb_removal_delay_length_minus1: u8,
    pub cpb_removal_delay_length_minus1: u8,
    pub dpb_output_delay_length_minus1: u8,
    pub time_offset_length: u8,
}

impl HrdParameters {
    pub fn parse(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        let cpb_cnt_minus1 = cursor.read_ue()?;
        let bit_rate_scale = cursor.read_u8(4)?;
        let cpb_size_scale = cursor.read_u8(4)?;

        let mut bit_rate_value_minus1 = vec![];
        let mut cpb_size_value_minus1 = vec![];
        let mut cbr_flag = vec![];

        // every iteration consumes bits, so a bogus count ends in `TruncatedBits`.
        for _ in 0..=cpb_cnt_minus1 {
            bit_rate_value_minus1.push(cursor.read_ue()?);
            cpb_size_value_minus1.push(cursor.read_ue()?);
            cbr_flag.push(cursor.read_bit()?);
        }

        Ok(Self {
            cpb_cnt_minus1,
            bit_rate_scale,
            cpb_size_scale,
            bit_rate_value_minus1,
            cpb_size_value_minus1,
            cbr_flag,
            initial_cpb_removal_delay_length_minus1: cursor.read_u8(5)?,
            cpb_removal_delay_length_minus1: cursor.read_u8(5)?,
            dpb_output_delay_length_minus1: cursor.read_u8(5)?,
            time_offset_length: cursor.read_u8(5)?,
        })
    }

    /// Bit rate of the `sched_sel_idx`-th CPB in bits per second (E-37).
    pub fn bit_rate(&self, sched_sel_idx: usize) -> Option<u64> {
        let value = *self.bit_rate_value_minus1.get(sched_sel_idx)?;
        Some((u64::from(value) + 1) << (6 + u32::from(self.bit_rate_scale)))
    }

    /// CPB size of the `sched_sel_idx`-th CPB in bits (E-38).
    pub fn cpb_size(&self, sched_sel_idx: usize) -> Option<u64> {
        let value = *self.cpb_size_value_minus1.get(sched_sel_idx)?;
        Some((u64::from(value) + 1) << (4 + u32::from(self.cpb_size_scale)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VuiParameters {
    pub aspect_ratio_info_present_flag: bool,
    pub aspect_ratio_idc: u8,
    pub sar_width: u16,
    pub sar_height: u16,

    pub overscan_info_present_flag: bool,
    pub overscan_appropriate_flag: bool,

    pub video_signal_type_present_flag: bool,
    pub video_format: u8,
    pub video_full_range_flag: bool,
    pub colour_description_present_flag: bool,
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,

    pub chroma_loc_info_present_flag: bool,
    pub chroma_sample_loc_type_top_field: u32,
    pub chroma_sample_loc_type_bottom_field: u32,

    pub timing_info_present_flag: bool,
    pub num_units_in_tick: u32,
    pub time_scale: u32,
    pub fixed_frame_rate_flag: bool,

    /// Present when `nal_hrd_parameters_present_flag` is set.
    pub nal_hrd_parameters: Option<HrdParameters>,
    /// Present when `vcl_hrd_parameters_present_flag` is set.
    pub vcl_hrd_parameters: Option<HrdParameters>,
    pub low_delay_hrd_flag: bool,

    pub pic_struct_present_flag: bool,

    pub bitstream_restriction_flag: bool,
    pub motion_vectors_over_pic_boundaries_flag: bool,
    pub max_bytes_per_pic_denom: u32,
    pub max_bits_per_mb_denom: u32,
    pub log2_max_mv_length_horizontal: u32,
    pub log2_max_mv_length_vertical: u32,
    pub max_num_reorder_frames: u32,
    pub max_dec_frame_buffering: u32,
}

impl VuiParameters {
    pub fn parse(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        let mut vui = VuiParameters::default();

        vui.aspect_ratio_info_present_flag = cursor.read_bit()?;
        if vui.aspect_ratio_info_present_flag {
            vui.aspect_ratio_idc = cursor.read_u8(8)?;
            if vui.aspect_ratio_idc == EXTENDED_SAR {
                vui.sar_width = cursor.read_u16(16)?;
                vui.sar_height = cursor.read_u16(16)?;
            }
        }

        vui.overscan_info_present_flag = cursor.read_bit()?;
        if vui.overscan_info_present_flag {
            vui.overscan_appropriate_flag = cursor.read_bit()?;
        }

        vui.video_signal_type_present_flag = cursor.read_bit()?;
        if vui.video_signal_type_present_flag {
            vui.video_format = cursor.read_u8(3)?;
            vui.video_full_range_flag = cursor.read_bit()?;
            vui.colour_description_present_flag = cursor.read_bit()?;
            if vui.colour_description_present_flag {
                vui.colour_primaries = cursor.read_u8(8)?;
                vui.transfer_characteristics = cursor.read_u8(8)?;
                vui.matrix_coefficients = cursor.read_u8(8)?;
            }
        }

        vui.chroma_loc_info_present_flag = cursor.read_bit()?;
        if vui.chroma_loc_info_present_flag {
            vui.chroma_sample_loc_type_top_field = cursor.read_ue()?;
            vui.chroma_sample_loc_type_bottom_field = cursor.read_ue()?;
        }

        vui.timing_info_present_flag = cursor.read_bit()?;
        if vui.timing_info_present_flag {
            vui.num_units_in_tick = cursor.read_bits(32)?;
            vui.time_scale = cursor.read_bits(32)?;
            vui.fixed_frame_rate_flag = cursor.read_bit()?;
        }

        if cursor.read_bit()? {
            vui.nal_hrd_parameters = Some(HrdParameters::parse(cursor)?);
        }
        if cursor.read_bit()? {
            vui.vcl_hrd_parameters = Some(HrdParameters::parse(cursor)?);
        }
        if vui.nal_hrd_parameters_present_flag() || vui.vcl_hrd_parameters_present_flag() {
            vui.low_delay_hrd_flag = cursor.read_bit()?;
        }

        vui.pic_struct_present_flag = cursor.read_bit()?;

        vui.bitstream_restriction_flag = cursor.read_bit()?;
        if vui.bitstream_restriction_flag {
            vui.motion_vectors_over_pic_boundaries_flag = cursor.read_bit()?;
            vui.max_bytes_per_pic_denom = cursor.read_ue()?;
            vui.max_bits_per_mb_denom = cursor.read_ue()?;
            vui.log2_max_mv_length_horizontal = cursor.read_ue()?;
            vui.log2_max_mv_length_vertical = cursor.read_ue()?;
            vui.max_num_reorder_frames = cursor.read_ue()?;
            vui.max_dec_frame_buffering = cursor.read_ue()?;
        }

        Ok(vui)
    }

    pub fn nal_hrd_parameters_present_flag(&self) -> bool {
        self.nal_hrd_parameters.is_some()
    }

    pub fn vcl_hrd_parameters_present_flag(&self) -> bool {
        self.vcl_hrd_parameters.is_some()
    }

    /// `(width, height)` of a sample, if signalled.
    pub fn sample_aspect_ratio(&self) -> Option<(u16, u16)> {
        if !self.aspect_ratio_info_present_flag {
            return None;
        }

        match self.aspect_ratio_idc {
            EXTENDED_SAR => Some((self.sar_width, self.sar_height)),
            0 => None,
            idc => SAMPLE_ASPECT_RATIOS.get(idc as usize).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pattern: &str) -> Vec<u8> {
        let pattern: String = pattern.chars().filter(|c| !c.is_whitespace()).collect();
        let mut out = vec![0u8; pattern.len().div_ceil(8)];
        for (i, c) in pattern.chars().enumerate() {
            if c == '1' {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }

    #[test]
    fn test_all_flags_clear() -> Result<(), FormatError> {
        // nine presence flags, all zero.
        let data = bits("000000000");
        let vui = VuiParameters::parse(&mut BitCursor::new(&data))?;

        assert_eq!(vui, VuiParameters::default());
        assert_eq!(vui.sample_aspect_ratio(), None);
        Ok(())
    }

    #[test]
    fn test_extended_sar() -> Result<(), FormatError> {
        let data = bits(concat!(
            "1",                // aspect_ratio_info_present_flag
            "11111111",         // aspect_ratio_idc = 255
            "0000000000000100", // sar_width = 4
            "0000000000000011", // sar_height = 3
            "0",                // overscan_info_present_flag
            "0",                // video_signal_type_present_flag
            "0",                // chroma_loc_info_present_flag
            "0",                // timing_info_present_flag
            "0",                // nal_hrd_parameters_present_flag
            "0",                // vcl_hrd_parameters_present_flag
            "0",                // pic_struct_present_flag
            "0",                // bitstream_restriction_flag
        ));
        let vui = VuiParameters::parse(&mut BitCursor::new(&data))?;

        assert_eq!(vui.aspect_ratio_idc, EXTENDED_SAR);
        assert_eq!(vui.sample_aspect_ratio(), Some((4, 3)));
        Ok(())
    }

    #[test]
    fn test_table_sar() -> Result<(), FormatError> {
        let data = bits("1 00000010 0 0 0 0 0 0 0 0");
        let vui = VuiParameters::parse(&mut BitCursor::new(&data))?;

        assert_eq!(vui.sample_aspect_ratio(), Some((12, 11)));
        Ok(())
    }

    #[test]
    fn test_nal_and_vcl_hrd_kept_apart() -> Result<(), FormatError> {
        let data = bits(concat!(
            "0",    // aspect_ratio_info_present_flag
            "0",    // overscan_info_present_flag
            "0",    // video_signal_type_present_flag
            "0",    // chroma_loc_info_present_flag
            "0",    // timing_info_present_flag
            "1",    // nal_hrd_parameters_present_flag
            "1",    // cpb_cnt_minus1 = 0
            "0001", // bit_rate_scale = 1
            "0010", // cpb_size_scale = 2
            "011",  // bit_rate_value_minus1[0] = 2
            "00100", // cpb_size_value_minus1[0] = 3
            "1",    // cbr_flag[0]
            "10111", // initial_cpb_removal_delay_length_minus1 = 23
            "10111", // cpb_removal_delay_length_minus1 = 23
            "10111", // dpb_output_delay_length_minus1 = 23
            "11000", // time_offset_length = 24
            "1",    // vcl_hrd_parameters_present_flag
            "010",  // cpb_cnt_minus1 = 1
            "0000", // bit_rate_scale = 0
            "0000", // cpb_size_scale = 0
            "1",    // bit_rate_value_minus1[0] = 0
            "1",    // cpb_size_value_minus1[0] = 0
            "0",    // cbr_flag[0]
            "010",  // bit_rate_value_minus1[1] = 1
            "010",  // cpb_size_value_minus1[1] = 1
            "1",    // cbr_flag[1]
            "00000", // initial_cpb_removal_delay_length_minus1
            "00001", // cpb_removal_delay_length_minus1
            "00010", // dpb_output_delay_length_minus1
            "00011", // time_offset_length
            "1",    // low_delay_hrd_flag
            "1",    // pic_struct_present_flag
            "0",    // bitstream_restriction_flag
        ));
        let vui = VuiParameters::parse(&mut BitCursor::new(&data))?;

        let nal = vui.nal_hrd_parameters.as_ref().expect("nal hrd");
        assert_eq!(nal.cpb_cnt_minus1, 0);
        assert_eq!(nal.bit_rate_value_minus1, vec![2]);
        assert_eq!(nal.cpb_size_value_minus1, vec![3]);
        assert_eq!(nal.cbr_flag, vec![true]);
        assert_eq!(nal.initial_cpb_removal_delay_length_minus1, 23);
        assert_eq!(nal.time_offset_length, 24);
        assert_eq!(nal.bit_rate(0), Some(3 << 7));
        assert_eq!(nal.cpb_size(0), Some(4 << 6));
        assert_eq!(nal.bit_rate(1), None);

        let vcl = vui.vcl_hrd_parameters.as_ref().expect("vcl hrd");
        assert_eq!(vcl.cpb_cnt_minus1, 1);
        assert_eq!(vcl.bit_rate_value_minus1, vec![0, 1]);
        assert_eq!(vcl.cpb_size_value_minus1, vec![0, 1]);
        assert_eq!(vcl.cbr_flag, vec![false, true]);
        assert_eq!(vcl.cpb_removal_delay_length_minus1, 1);
        assert_eq!(vcl.dpb_output_delay_length_minus1, 2);
        assert_eq!(vcl.time_offset_length, 3);

        assert!(vui.low_delay_hrd_flag);
        assert!(vui.pic_struct_present_flag);
        assert!(!vui.bitstream_restriction_flag);
        Ok(())
    }

    #[test]
    fn test_low_delay_flag_only_read_with_hrd() -> Result<(), FormatError> {
        // with neither HRD flag set the bit after them is pic_struct_present_flag.
        let data = bits("0 0 0 0 0 0 0 1 0");
        let vui = VuiParameters::parse(&mut BitCursor::new(&data))?;

        assert!(!vui.low_delay_hrd_flag);
        assert!(vui.pic_struct_present_flag);
        Ok(())
    }

    #[test]
    fn test_truncated_hrd() {
        // nal_hrd_parameters_present_flag set, then cpb_cnt_minus1 = 1 and nothing else.
        let data = bits("0 0 0 0 0 1 010");
        let result = VuiParameters::parse(&mut BitCursor::new(&data));

        assert!(matches!(result, Err(FormatError::TruncatedBits { .. })));
    }
}
