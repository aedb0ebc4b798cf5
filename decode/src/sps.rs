//! Sequence parameter set RBSP syntax (7.3.2.1.1).

use common::{BitCursor, FormatError};
use serde::Serialize;

use crate::vui::VuiParameters;

/// `profile_idc` values whose SPS carries the chroma format block.
const CHROMA_FORMAT_PROFILES: [u8; 12] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134];

/// Fields only present for the high profiles listed in `CHROMA_FORMAT_PROFILES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromaFormat {
    pub chroma_format_idc: u32,
    pub separate_colour_plane_flag: bool,
    pub bit_depth_luma_minus8: u32,
    pub bit_depth_chroma_minus8: u32,
    pub qpprime_y_zero_transform_bypass_flag: bool,
    pub seq_scaling_matrix_present_flag: bool,
}

impl ChromaFormat {
    fn parse(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        let chroma_format_idc = cursor.read_ue()?;
        let separate_colour_plane_flag = match chroma_format_idc {
            3 => cursor.read_bit()?,
            _ => false,
        };

        let chroma_format = Self {
            chroma_format_idc,
            separate_colour_plane_flag,
            bit_depth_luma_minus8: cursor.read_ue()?,
            bit_depth_chroma_minus8: cursor.read_ue()?,
            qpprime_y_zero_transform_bypass_flag: cursor.read_bit()?,
            seq_scaling_matrix_present_flag: cursor.read_bit()?,
        };

        if chroma_format.seq_scaling_matrix_present_flag {
            return Err(FormatError::UnsupportedSyntax(
                "seq_scaling_list_present_flag and scaling lists are not decoded".to_string(),
            ));
        }

        Ok(chroma_format)
    }
}

/// The three mutually exclusive `pic_order_cnt_type` layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PicOrderCnt {
    Type0 {
        log2_max_pic_order_cnt_lsb_minus4: u32,
    },
    Type1 {
        delta_pic_order_always_zero_flag: bool,
        offset_for_non_ref_pic: i32,
        offset_for_top_to_bottom_field: i32,
        /// `num_ref_frames_in_pic_order_cnt_cycle` entries.
        offset_for_ref_frame: Vec<i32>,
    },
    Type2,
}

impl PicOrderCnt {
    fn parse(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        match cursor.read_ue()? {
            0 => Ok(PicOrderCnt::Type0 {
                log2_max_pic_order_cnt_lsb_minus4: cursor.read_ue()?,
            }),
            1 => {
                let delta_pic_order_always_zero_flag = cursor.read_bit()?;
                let offset_for_non_ref_pic = cursor.read_se()?;
                let offset_for_top_to_bottom_field = cursor.read_se()?;
                let num_ref_frames_in_pic_order_cnt_cycle = cursor.read_ue()?;

                let offset_for_ref_frame = (0..num_ref_frames_in_pic_order_cnt_cycle)
                    .map(|_| cursor.read_se())
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(PicOrderCnt::Type1 {
                    delta_pic_order_always_zero_flag,
                    offset_for_non_ref_pic,
                    offset_for_top_to_bottom_field,
                    offset_for_ref_frame,
                })
            }
            2 => Ok(PicOrderCnt::Type2),
            other => Err(FormatError::UnsupportedSyntax(format!(
                "pic_order_cnt_type {other} is not one of 0, 1 or 2"
            ))),
        }
    }

    pub fn pic_order_cnt_type(&self) -> u32 {
        match self {
            PicOrderCnt::Type0 { .. } => 0,
            PicOrderCnt::Type1 { .. } => 1,
            PicOrderCnt::Type2 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameCropping {
    pub left_offset: u32,
    pub right_offset: u32,
    pub top_offset: u32,
    pub bottom_offset: u32,
}

/// `Sps` holds a decoded sequence parameter set. Slice headers refer to it through
/// `seq_parameter_set_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sps {
    pub profile_idc: u8,
    pub constraint_set0_flag: bool,
    pub constraint_set1_flag: bool,
    pub constraint_set2_flag: bool,
    pub constraint_set3_flag: bool,
    pub constraint_set4_flag: bool,
    pub constraint_set5_flag: bool,
    pub level_idc: u8,
    pub seq_parameter_set_id: u32,

    /// `None` unless `profile_idc` is one of the high profiles, in which case `chroma_format_idc`
    /// is inferred to be 1.
    pub chroma_format: Option<ChromaFormat>,

    pub log2_max_frame_num_minus4: u32,
    pub pic_order_cnt: PicOrderCnt,
    pub max_num_ref_frames: u32,
    pub gaps_in_frame_num_value_allowed_flag: bool,
    pub pic_width_in_mbs_minus1: u32,
    pub pic_height_in_map_units_minus1: u32,
    pub frame_mbs_only_flag: bool,
    pub mb_adaptive_frame_field_flag: bool,
    pub direct_8x8_inference_flag: bool,

    pub frame_cropping_flag: bool,
    pub frame_cropping: FrameCropping,

    pub vui_parameters_present_flag: bool,
    pub vui_parameters: VuiParameters,
}

impl Sps {
    /// Parses the payload of a sequence parameter set NAL unit (header byte excluded).
    ///
    /// Nothing is returned unless every syntax element decoded.
    pub fn parse(payload: &[u8]) -> Result<Self, FormatError> {
        let mut cursor = BitCursor::new(payload);
        Self::parse_from(&mut cursor)
    }

    pub fn parse_from(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        let profile_idc = cursor.read_u8(8)?;
        let constraint_set0_flag = cursor.read_bit()?;
        let constraint_set1_flag = cursor.read_bit()?;
        let constraint_set2_flag = cursor.read_bit()?;
        let constraint_set3_flag = cursor.read_bit()?;
        let constraint_set4_flag = cursor.read_bit()?;
        let constraint_set5_flag = cursor.read_bit()?;
        // reserved_zero_2bits
        cursor.skip_bits(2)?;
        let level_idc = cursor.read_u8(8)?;
        let seq_parameter_set_id = cursor.read_ue()?;

        let chroma_format = match CHROMA_FORMAT_PROFILES.contains(&profile_idc) {
            true => Some(ChromaFormat::parse(cursor)?),
            false => None,
        };

        let log2_max_frame_num_minus4 = cursor.read_ue()?;
        let pic_order_cnt = PicOrderCnt::parse(cursor)?;

        let max_num_ref_frames = cursor.read_ue()?;
        let gaps_in_frame_num_value_allowed_flag = cursor.read_bit()?;
        let pic_width_in_mbs_minus1 = cursor.read_ue()?;
        let pic_height_in_map_units_minus1 = cursor.read_ue()?;

        let frame_mbs_only_flag = cursor.read_bit()?;
        let mb_adaptive_frame_field_flag = match frame_mbs_only_flag {
            true => false,
            false => cursor.read_bit()?,
        };
        let direct_8x8_inference_flag = cursor.read_bit()?;

        let frame_cropping_flag = cursor.read_bit()?;
        let frame_cropping = match frame_cropping_flag {
            true => FrameCropping {
                left_offset: cursor.read_ue()?,
                right_offset: cursor.read_ue()?,
                top_offset: cursor.read_ue()?,
                bottom_offset: cursor.read_ue()?,
            },
            false => FrameCropping::default(),
        };

        let vui_parameters_present_flag = cursor.read_bit()?;
        let vui_parameters = match vui_parameters_present_flag {
            true => VuiParameters::parse(cursor)?,
            false => VuiParameters::default(),
        };

        Ok(Self {
            profile_idc,
            constraint_set0_flag,
            constraint_set1_flag,
            constraint_set2_flag,
            constraint_set3_flag,
            constraint_set4_flag,
            constraint_set5_flag,
            level_idc,
            seq_parameter_set_id,
            chroma_format,
            log2_max_frame_num_minus4,
            pic_order_cnt,
            max_num_ref_frames,
            gaps_in_frame_num_value_allowed_flag,
            pic_width_in_mbs_minus1,
            pic_height_in_map_units_minus1,
            frame_mbs_only_flag,
            mb_adaptive_frame_field_flag,
            direct_8x8_inference_flag,
            frame_cropping_flag,
            frame_cropping,
            vui_parameters_present_flag,
            vui_parameters,
        })
    }

    pub fn chroma_format_idc(&self) -> u32 {
        self.chroma_format
            .as_ref()
            .map_or(1, |chroma_format| chroma_format.chroma_format_idc)
    }

    pub fn separate_colour_plane_flag(&self) -> bool {
        self.chroma_format
            .as_ref()
            .is_some_and(|chroma_format| chroma_format.separate_colour_plane_flag)
    }

    /// `ChromaArrayType`: 0 for monochrome or separately coded colour planes.
    pub fn chroma_array_type(&self) -> u32 {
        match self.separate_colour_plane_flag() {
            true => 0,
            false => self.chroma_format_idc(),
        }
    }

    pub fn max_frame_num(&self) -> u64 {
        1u64 << (u64::from(self.log2_max_frame_num_minus4) + 4).min(63)
    }

    pub fn pic_width_in_mbs(&self) -> u64 {
        u64::from(self.pic_width_in_mbs_minus1) + 1
    }

    /// `FrameHeightInMbs`, in macroblocks.
    pub fn frame_height_in_mbs(&self) -> u64 {
        let frame_factor = if self.frame_mbs_only_flag { 1 } else { 2 };
        frame_factor * (u64::from(self.pic_height_in_map_units_minus1) + 1)
    }

    /// `(CropUnitX, CropUnitY)` from Table 6-1 and equations 7-19 to 7-22.
    fn crop_units(&self) -> (u64, u64) {
        let frame_factor = if self.frame_mbs_only_flag { 1 } else { 2 };

        match self.chroma_array_type() {
            0 => (1, frame_factor),
            1 => (2, 2 * frame_factor),
            2 => (2, frame_factor),
            _ => (1, frame_factor),
        }
    }

    /// Luma width in samples, after cropping.
    pub fn width(&self) -> u64 {
        let (crop_unit_x, _) = self.crop_units();
        let cropped = crop_unit_x
            * (u64::from(self.frame_cropping.left_offset)
                + u64::from(self.frame_cropping.right_offset));

        (self.pic_width_in_mbs() * 16).saturating_sub(cropped)
    }

    /// Luma height in samples, after cropping.
    pub fn height(&self) -> u64 {
        let (_, crop_unit_y) = self.crop_units();
        let cropped = crop_unit_y
            * (u64::from(self.frame_cropping.top_offset)
                + u64::from(self.frame_cropping.bottom_offset));

        (self.frame_height_in_mbs() * 16).saturating_sub(cropped)
    }

    /// Frames per second as `(time_scale, 2 * num_units_in_tick)`, when timing info is present.
    pub fn frame_rate(&self) -> Option<(u32, u64)> {
        let vui = &self.vui_parameters;
        if !self.vui_parameters_present_flag
            || !vui.timing_info_present_flag
            || vui.num_units_in_tick == 0
        {
            return None;
        }

        Some((vui.time_scale, 2 * u64::from(vui.num_units_in_tick)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Baseline SPS from a 640x360 stream, cut off inside `bitstream_restriction`.
    const BASELINE_SPS_PREFIX: [u8; 24] = [
        0x42, 0xC0, 0x1E, 0xDA, 0x02, 0x80, 0xBF, 0xE5, 0xC0, 0x5A, 0x80, 0x80, 0x80, 0xA0, 0x00,
        0x00, 0x7D, 0x20, 0x00, 0x1D, 0x4C, 0x01, 0xE2, 0xC5,
    ];

    /// `log2_max_mv_length_vertical` completes, `max_num_reorder_frames` = 0,
    /// `max_dec_frame_buffering` = 1, `rbsp_stop_one_bit`.
    const BASELINE_SPS_TAIL: u8 = 0xD4;

    fn baseline_sps() -> Vec<u8> {
        let mut data = BASELINE_SPS_PREFIX.to_vec();
        data.push(BASELINE_SPS_TAIL);
        data
    }

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
    fn test_baseline_sps() -> Result<(), FormatError> {
        let sps = Sps::parse(&baseline_sps())?;

        assert_eq!(sps.profile_idc, 66);
        assert!(sps.constraint_set0_flag);
        assert!(sps.constraint_set1_flag);
        assert!(!sps.constraint_set2_flag);
        assert!(!sps.constraint_set3_flag);
        assert!(!sps.constraint_set4_flag);
        assert!(!sps.constraint_set5_flag);
        assert_eq!(sps.level_idc, 30);
        assert_eq!(sps.seq_parameter_set_id, 0);

        assert!(sps.chroma_format.is_none());
        assert_eq!(sps.chroma_format_idc(), 1);

        assert_eq!(sps.log2_max_frame_num_minus4, 0);
        assert_eq!(sps.pic_order_cnt, PicOrderCnt::Type2);
        assert_eq!(sps.pic_order_cnt.pic_order_cnt_type(), 2);
        assert_eq!(sps.max_num_ref_frames, 1);
        assert!(!sps.gaps_in_frame_num_value_allowed_flag);
        assert_eq!(sps.pic_width_in_mbs_minus1, 39);
        assert_eq!(sps.pic_height_in_map_units_minus1, 22);
        assert!(sps.frame_mbs_only_flag);
        assert!(sps.direct_8x8_inference_flag);

        assert!(sps.frame_cropping_flag);
        assert_eq!(
            sps.frame_cropping,
            FrameCropping {
                left_offset: 0,
                right_offset: 0,
                top_offset: 0,
                bottom_offset: 4,
            }
        );
        assert_eq!(sps.width(), 640);
        assert_eq!(sps.height(), 360);
        assert_eq!(sps.max_frame_num(), 16);

        Ok(())
    }

    #[test]
    fn test_baseline_sps_vui() -> Result<(), FormatError> {
        let sps = Sps::parse(&baseline_sps())?;
        let vui = &sps.vui_parameters;

        assert!(sps.vui_parameters_present_flag);
        assert!(vui.aspect_ratio_info_present_flag);
        assert_eq!(vui.aspect_ratio_idc, 1);
        assert_eq!(vui.sample_aspect_ratio(), Some((1, 1)));
        assert!(!vui.overscan_info_present_flag);
        assert!(vui.video_signal_type_present_flag);
        assert_eq!(vui.video_format, 5);
        assert!(!vui.video_full_range_flag);
        assert!(vui.colour_description_present_flag);
        assert_eq!(vui.colour_primaries, 1);
        assert_eq!(vui.transfer_characteristics, 1);
        assert_eq!(vui.matrix_coefficients, 1);
        assert!(!vui.chroma_loc_info_present_flag);

        assert!(vui.timing_info_present_flag);
        assert_eq!(vui.num_units_in_tick, 1001);
        assert_eq!(vui.time_scale, 60000);
        assert!(!vui.fixed_frame_rate_flag);
        assert_eq!(sps.frame_rate(), Some((60000, 2002)));

        assert!(vui.nal_hrd_parameters.is_none());
        assert!(vui.vcl_hrd_parameters.is_none());
        assert!(!vui.pic_struct_present_flag);

        assert!(vui.bitstream_restriction_flag);
        assert!(vui.motion_vectors_over_pic_boundaries_flag);
        assert_eq!(vui.max_bytes_per_pic_denom, 0);
        assert_eq!(vui.max_bits_per_mb_denom, 0);
        assert_eq!(vui.log2_max_mv_length_horizontal, 10);
        assert_eq!(vui.log2_max_mv_length_vertical, 10);
        assert_eq!(vui.max_num_reorder_frames, 0);
        assert_eq!(vui.max_dec_frame_buffering, 1);

        Ok(())
    }

    #[test]
    fn test_truncated_sps_is_rejected() {
        assert!(matches!(
            Sps::parse(&BASELINE_SPS_PREFIX),
            Err(FormatError::TruncatedBits { .. })
        ));

        for len in 0..BASELINE_SPS_PREFIX.len() {
            assert!(
                Sps::parse(&BASELINE_SPS_PREFIX[..len]).is_err(),
                "accepted a {len} byte prefix"
            );
        }
    }

    #[test]
    fn test_high_profile_chroma_format() -> Result<(), FormatError> {
        let data = bits(concat!(
            "01100100", // profile_idc = 100
            "00000000", // constraint flags, reserved_zero_2bits
            "00101000", // level_idc = 40
            "1",        // seq_parameter_set_id = 0
            "00100",    // chroma_format_idc = 3
            "1",        // separate_colour_plane_flag
            "010",      // bit_depth_luma_minus8 = 1
            "011",      // bit_depth_chroma_minus8 = 2
            "1",        // qpprime_y_zero_transform_bypass_flag
            "0",        // seq_scaling_matrix_present_flag
            "1",        // log2_max_frame_num_minus4 = 0
            "1",        // pic_order_cnt_type = 0
            "00101",    // log2_max_pic_order_cnt_lsb_minus4 = 4
            "011",      // max_num_ref_frames = 2
            "0",        // gaps_in_frame_num_value_allowed_flag
            "0001010",  // pic_width_in_mbs_minus1 = 9
            "00111",    // pic_height_in_map_units_minus1 = 6
            "0",        // frame_mbs_only_flag
            "1",        // mb_adaptive_frame_field_flag
            "0",        // direct_8x8_inference_flag
            "0",        // frame_cropping_flag
            "0",        // vui_parameters_present_flag
        ));
        let sps = Sps::parse(&data)?;

        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.level_idc, 40);
        assert_eq!(
            sps.chroma_format,
            Some(ChromaFormat {
                chroma_format_idc: 3,
                separate_colour_plane_flag: true,
                bit_depth_luma_minus8: 1,
                bit_depth_chroma_minus8: 2,
                qpprime_y_zero_transform_bypass_flag: true,
                seq_scaling_matrix_present_flag: false,
            })
        );
        assert_eq!(sps.chroma_format_idc(), 3);
        assert_eq!(sps.chroma_array_type(), 0);
        assert_eq!(
            sps.pic_order_cnt,
            PicOrderCnt::Type0 {
                log2_max_pic_order_cnt_lsb_minus4: 4
            }
        );
        assert_eq!(sps.max_num_ref_frames, 2);
        assert!(!sps.frame_mbs_only_flag);
        assert!(sps.mb_adaptive_frame_field_flag);
        assert!(!sps.direct_8x8_inference_flag);
        assert!(!sps.vui_parameters_present_flag);
        assert_eq!(sps.vui_parameters, VuiParameters::default());
        assert_eq!(sps.width(), 160);
        assert_eq!(sps.height(), 224);

        Ok(())
    }

    #[test]
    fn test_scaling_matrix_is_unsupported() {
        let data = bits(concat!(
            "01100100", // profile_idc = 100
            "00000000", // constraint flags, reserved_zero_2bits
            "00101000", // level_idc = 40
            "1",        // seq_parameter_set_id = 0
            "010",      // chroma_format_idc = 1
            "1",        // bit_depth_luma_minus8 = 0
            "1",        // bit_depth_chroma_minus8 = 0
            "0",        // qpprime_y_zero_transform_bypass_flag
            "1",        // seq_scaling_matrix_present_flag
            "11111111111111111111",
        ));

        assert!(matches!(
            Sps::parse(&data),
            Err(FormatError::UnsupportedSyntax(_))
        ));
    }

    #[test]
    fn test_pic_order_cnt_type_1() -> Result<(), FormatError> {
        let data = bits(concat!(
            "01001101", // profile_idc = 77
            "01000000", // constraint_set1_flag
            "00011110", // level_idc = 30
            "010",      // seq_parameter_set_id = 1
            "1",        // log2_max_frame_num_minus4 = 0
            "010",      // pic_order_cnt_type = 1
            "1",        // delta_pic_order_always_zero_flag
            "011",      // offset_for_non_ref_pic = -1
            "00100",    // offset_for_top_to_bottom_field = 2
            "011",      // num_ref_frames_in_pic_order_cnt_cycle = 2
            "010",      // offset_for_ref_frame[0] = 1
            "00101",    // offset_for_ref_frame[1] = -2
            "010",      // max_num_ref_frames = 1
            "0",        // gaps_in_frame_num_value_allowed_flag
            "1",        // pic_width_in_mbs_minus1 = 0
            "1",        // pic_height_in_map_units_minus1 = 0
            "1",        // frame_mbs_only_flag
            "1",        // direct_8x8_inference_flag
            "1",        // frame_cropping_flag
            "1",        // frame_crop_left_offset = 0
            "010",      // frame_crop_right_offset = 1
            "011",      // frame_crop_top_offset = 2
            "1",        // frame_crop_bottom_offset = 0
            "0",        // vui_parameters_present_flag
            "1",        // rbsp_stop_one_bit
        ));
        let sps = Sps::parse(&data)?;

        assert_eq!(sps.seq_parameter_set_id, 1);
        assert!(sps.constraint_set1_flag);
        assert!(sps.chroma_format.is_none());
        assert_eq!(
            sps.pic_order_cnt,
            PicOrderCnt::Type1 {
                delta_pic_order_always_zero_flag: true,
                offset_for_non_ref_pic: -1,
                offset_for_top_to_bottom_field: 2,
                offset_for_ref_frame: vec![1, -2],
            }
        );
        assert_eq!(sps.max_num_ref_frames, 1);
        assert_eq!(sps.width(), 14);
        assert_eq!(sps.height(), 12);

        Ok(())
    }

    #[test]
    fn test_invalid_pic_order_cnt_type() {
        let data = bits(concat!(
            "01000010", // profile_idc = 66
            "00000000", // constraint flags, reserved_zero_2bits
            "00011110", // level_idc = 30
            "1",        // seq_parameter_set_id = 0
            "1",        // log2_max_frame_num_minus4 = 0
            "00100",    // pic_order_cnt_type = 3
            "1111111111111111",
        ));

        assert!(matches!(
            Sps::parse(&data),
            Err(FormatError::UnsupportedSyntax(_))
        ));
    }

    #[test]
    fn test_huge_ref_frame_cycle_is_truncated() {
        let data = bits(concat!(
            "01000010", // profile_idc = 66
            "00000000", // constraint flags, reserved_zero_2bits
            "00011110", // level_idc = 30
            "1",        // seq_parameter_set_id = 0
            "1",        // log2_max_frame_num_minus4 = 0
            "010",      // pic_order_cnt_type = 1
            "0",        // delta_pic_order_always_zero_flag
            "1",        // offset_for_non_ref_pic = 0
            "1",        // offset_for_top_to_bottom_field = 0
            "000000000000000000000000000000011111111111111111111111111111111", // cycle = 2^32 - 2
            "1111",
        ));

        assert!(matches!(
            Sps::parse(&data),
            Err(FormatError::TruncatedBits { .. })
        ));
    }
}
