//! Picture parameter set RBSP syntax (7.3.2.2).

use common::{BitCursor, FormatError};
use serde::Serialize;

/// Slice group map layouts, selected by `slice_group_map_type`. Type 1 (dispersed) carries no
/// syntax of its own and is rejected along with any other unlisted type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SliceGroupMap {
    /// Type 0.
    Interleaved { run_length_minus1: Vec<u32> },

    /// Type 2. One `top_left` / `bottom_right` pair per slice group.
    Foreground {
        top_left: Vec<u32>,
        bottom_right: Vec<u32>,
    },

    /// Types 3 (box-out), 4 (raster scan) and 5 (wipe).
    Changing {
        slice_group_map_type: u32,
        slice_group_change_direction_flag: bool,
        slice_group_change_rate_minus1: u32,
    },

    /// Type 6.
    Explicit {
        pic_size_in_map_units_minus1: u32,
        slice_group_id: Vec<u32>,
    },
}

impl SliceGroupMap {
    fn parse(cursor: &mut BitCursor, num_slice_groups_minus1: u32) -> Result<Self, FormatError> {
        let slice_group_map_type = cursor.read_ue()?;

        match slice_group_map_type {
            0 => {
                let run_length_minus1 = (0..=num_slice_groups_minus1)
                    .map(|_| cursor.read_ue())
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(SliceGroupMap::Interleaved { run_length_minus1 })
            }
            2 => {
                let mut top_left = vec![];
                let mut bottom_right = vec![];
                for _ in 0..=num_slice_groups_minus1 {
                    top_left.push(cursor.read_ue()?);
                    bottom_right.push(cursor.read_ue()?);
                }

                Ok(SliceGroupMap::Foreground {
                    top_left,
                    bottom_right,
                })
            }
            3..=5 => Ok(SliceGroupMap::Changing {
                slice_group_map_type,
                slice_group_change_direction_flag: cursor.read_bit()?,
                slice_group_change_rate_minus1: cursor.read_ue()?,
            }),
            6 => {
                let pic_size_in_map_units_minus1 = cursor.read_ue()?;
                let slice_group_id = (0..=pic_size_in_map_units_minus1)
                    .map(|_| cursor.read_ue())
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(SliceGroupMap::Explicit {
                    pic_size_in_map_units_minus1,
                    slice_group_id,
                })
            }
            other => Err(FormatError::UnsupportedSyntax(format!(
                "slice_group_map_type {other} is not supported"
            ))),
        }
    }

    pub fn slice_group_map_type(&self) -> u32 {
        match self {
            SliceGroupMap::Interleaved { .. } => 0,
            SliceGroupMap::Foreground { .. } => 2,
            SliceGroupMap::Changing {
                slice_group_map_type,
                ..
            } => *slice_group_map_type,
            SliceGroupMap::Explicit { .. } => 6,
        }
    }
}

/// `Pps` holds a decoded picture parameter set. Slice headers refer to it through
/// `pic_parameter_set_id`; it refers to its `Sps` through `seq_parameter_set_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pps {
    pub pic_parameter_set_id: u32,
    pub seq_parameter_set_id: u32,
    pub entropy_coding_mode_flag: bool,
    pub bottom_field_pic_order_in_frame_present_flag: bool,

    pub num_slice_groups_minus1: u32,
    /// Present when `num_slice_groups_minus1` is greater than 0.
    pub slice_group_map: Option<SliceGroupMap>,

    pub num_ref_idx_l0_default_active_minus1: u32,
    pub num_ref_idx_l1_default_active_minus1: u32,
    pub weighted_pred_flag: bool,
    pub weighted_bipred_idc: u8,
    pub pic_init_qp_minus26: i32,
    pub pic_init_qs_minus26: i32,
    pub chroma_qp_index_offset: i32,
    pub deblocking_filter_control_present_flag: bool,
    pub constrained_intra_pred_flag: bool,
    pub redundant_pic_cnt_present_flag: bool,
}

impl Pps {
    /// Parses the payload of a picture parameter set NAL unit (header byte excluded).
    ///
    /// `transform_8x8_mode_flag` and the picture scaling matrix are not decoded: a payload that
    /// carries them fails with `UnsupportedSyntax`.
    pub fn parse(payload: &[u8]) -> Result<Self, FormatError> {
        let mut cursor = BitCursor::new(payload);
        Self::parse_from(&mut cursor)
    }

    pub fn parse_from(cursor: &mut BitCursor) -> Result<Self, FormatError> {
        let pic_parameter_set_id = cursor.read_ue()?;
        let seq_parameter_set_id = cursor.read_ue()?;
        let entropy_coding_mode_flag = cursor.read_bit()?;
        let bottom_field_pic_order_in_frame_present_flag = cursor.read_bit()?;

        let num_slice_groups_minus1 = cursor.read_ue()?;
        let slice_group_map = match num_slice_groups_minus1 > 0 {
            true => Some(SliceGroupMap::parse(cursor, num_slice_groups_minus1)?),
            false => None,
        };

        let pps = Self {
            pic_parameter_set_id,
            seq_parameter_set_id,
            entropy_coding_mode_flag,
            bottom_field_pic_order_in_frame_present_flag,
            num_slice_groups_minus1,
            slice_group_map,
            num_ref_idx_l0_default_active_minus1: cursor.read_ue()?,
            num_ref_idx_l1_default_active_minus1: cursor.read_ue()?,
            weighted_pred_flag: cursor.read_bit()?,
            weighted_bipred_idc: cursor.read_u8(2)?,
            pic_init_qp_minus26: cursor.read_se()?,
            pic_init_qs_minus26: cursor.read_se()?,
            chroma_qp_index_offset: cursor.read_se()?,
            deblocking_filter_control_present_flag: cursor.read_bit()?,
            constrained_intra_pred_flag: cursor.read_bit()?,
            redundant_pic_cnt_present_flag: cursor.read_bit()?,
        };

        if cursor.more_rbsp_data() {
            return Err(FormatError::UnsupportedSyntax(
                "transform_8x8_mode_flag and pic_scaling_matrix_present_flag are not decoded"
                    .to_string(),
            ));
        }

        Ok(pps)
    }

    pub fn pic_init_qp(&self) -> i64 {
        26 + i64::from(self.pic_init_qp_minus26)
    }

    pub fn pic_init_qs(&self) -> i64 {
        26 + i64::from(self.pic_init_qs_minus26)
    }
}
