use serde::Serialize;

/// Prediction mode of the macroblock whose `coded_block_pattern` is being mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbPrediction {
    /// `Intra_4x4` or `Intra_8x8`.
    Intra,
    Inter,
}

/// One row of Table 9-4 (`ChromaArrayType` equal to 1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodedBlockPattern {
    pub intra_4x4: u8,
    pub inter: u8,
}

impl CodedBlockPattern {
    pub fn select(&self, prediction: MbPrediction) -> u8 {
        match prediction {
            MbPrediction::Intra => self.intra_4x4,
            MbPrediction::Inter => self.inter,
        }
    }
}

const fn cbp(intra_4x4: u8, inter: u8) -> CodedBlockPattern {
    CodedBlockPattern { intra_4x4, inter }
}

/// `codeNum` to `coded_block_pattern`, indexed by `codeNum`.
pub static CODED_BLOCK_PATTERN: [CodedBlockPattern; 48] = [
    cbp(47, 0),
    cbp(31, 16),
    cbp(15, 1),
    cbp(0, 2),
    cbp(23, 4),
    cbp(27, 8),
    cbp(29, 32),
    cbp(30, 3),
    cbp(7, 5),
    cbp(11, 10),
    cbp(13, 12),
    cbp(14, 15),
    cbp(39, 47),
    cbp(43, 7),
    cbp(45, 11),
    cbp(46, 13),
    cbp(16, 14),
    cbp(3, 6),
    cbp(5, 9),
    cbp(10, 31),
    cbp(12, 35),
    cbp(19, 37),
    cbp(21, 42),
    cbp(26, 44),
    cbp(28, 33),
    cbp(35, 34),
    cbp(37, 36),
    cbp(42, 40),
    cbp(44, 39),
    cbp(1, 43),
    cbp(2, 45),
    cbp(4, 46),
    cbp(8, 17),
    cbp(17, 18),
    cbp(18, 20),
    cbp(20, 24),
    cbp(24, 19),
    cbp(6, 21),
    cbp(9, 26),
    cbp(22, 28),
    cbp(25, 23),
    cbp(32, 27),
    cbp(33, 29),
    cbp(34, 30),
    cbp(36, 22),
    cbp(40, 25),
    cbp(38, 38),
    cbp(41, 41),
];

pub fn coded_block_pattern(code_num: u32) -> Option<CodedBlockPattern> {
    CODED_BLOCK_PATTERN.get(code_num as usize).copied()
}
