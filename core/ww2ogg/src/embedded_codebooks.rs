//! Embedded packed codebook libraries.
//!
//! Stripped-form codebooks consumed through
//! [`CodebookLibrary`](crate::codebook::CodebookLibrary). Real game content
//! generally wants the full packed library of its engine version, supplied
//! externally; these built-in sets keep library selection and the aoTuV
//! fallback working out of the box.

#![allow(clippy::all)]

pub mod standard {
    pub static CODEBOOKS: &[&[u8]] = &[
        &[0x41, 0x00, 0x88, 0x07],
        &[0x81, 0x00, 0x10, 0x55, 0x55, 0x00],
        &[0x01, 0x01, 0x90, 0xFF, 0xFF, 0xFF, 0x7F, 0x00],
        &[0x01, 0x02, 0x18, 0x92, 0x24, 0x49, 0x92, 0x24, 0x49, 0x92, 0x24, 0x49, 0x92, 0x24, 0x49, 0x00],
        &[0x01, 0x04, 0x98, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0x5B, 0x00],
        &[0x81, 0x01, 0xD8, 0x4C, 0x99, 0x32, 0x65, 0xCA, 0x94, 0x29, 0x53, 0x26, 0x00],
        &[0x02, 0x01, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80, 0xBF, 0x00, 0x00, 0x00, 0x3F, 0x23, 0xA6, 0x0E],
        &[0x14, 0x05, 0x98, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0x06, 0x00, 0x00, 0xFC, 0x05, 0x00, 0x00, 0xF4, 0xA1, 0x20, 0x08],
        &[0x02, 0x04, 0x98, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0x00, 0x00, 0x80, 0xBF, 0x00, 0x00, 0x80, 0x3F, 0x02, 0xD1, 0x58, 0x1F],
        &[0x81, 0x00, 0x10, 0xF2, 0x7F, 0x00],
        &[0xC1, 0x00, 0x18, 0x69, 0xDB, 0x48, 0x92, 0x04],
    ];
}

pub mod aotuv603 {
    pub static CODEBOOKS: &[&[u8]] = &[
        &[0x41, 0x00, 0x90, 0x54, 0x00],
        &[0x81, 0x00, 0x10, 0xFF, 0x7F, 0x00],
        &[0x01, 0x01, 0x98, 0x91, 0x24, 0x49, 0x92, 0x24, 0x49, 0x00],
        &[0x01, 0x02, 0x18, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0x5B, 0x00],
        &[0x01, 0x04, 0x98, 0xDA, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0x00],
        &[0x81, 0x01, 0xD8, 0x4C, 0x99, 0x32, 0x65, 0xCA, 0x94, 0x29, 0x53, 0x26, 0x00],
        &[0x02, 0x01, 0x90, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x3F, 0x23, 0xA6, 0x0E],
        &[0x14, 0x05, 0x98, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0x06, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0xF4, 0xA1, 0x20, 0x08],
        &[0x02, 0x04, 0x98, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0xB6, 0x6D, 0xDB, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x80, 0x3F, 0x02, 0xD1, 0x58, 0x1F],
        &[0x81, 0x00, 0x98, 0x44, 0xD2, 0x48, 0x00],
        &[0xC1, 0x00, 0x18, 0x69, 0xDB, 0x48, 0x92, 0x04],
    ];
}
