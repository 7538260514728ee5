//! Registry encodings derived from a [`ColorDescriptor`].

use crate::descriptor::ColorDescriptor;

/// Number of identical swatches in the accent palette table.
pub const PALETTE_SWATCHES: usize = 8;

/// Alpha byte forced into every encoding.
const ALPHA: u8 = 0x00;

/// Decimal channel values, as written to the classic color slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Everything the registry writes need, computed once per apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEncoding {
    /// `RRGGBBAA`, uppercase. Used for the taskbar palette.
    pub taskbar_format: String,
    /// `AABBGGRR`, uppercase. The byte-reversed form most DWORDs use.
    pub windows_format: String,
    /// `windows_format` read as a big-endian `u32`.
    pub dword_value: u32,
    /// `taskbar_format` repeated [`PALETTE_SWATCHES`] times, as hex text.
    pub palette_blob: String,
    pub channels: Channels,
}

impl RegistryEncoding {
    /// Raw bytes of the palette blob (`R G B A` per swatch).
    pub fn palette_bytes(&self) -> Vec<u8> {
        let Channels { red, green, blue } = self.channels;
        [red, green, blue, ALPHA].repeat(PALETTE_SWATCHES)
    }

    /// Space separated decimal triple, e.g. `"51 102 153"`.
    pub fn rgb_string(&self) -> String {
        let Channels { red, green, blue } = self.channels;
        format!("{red} {green} {blue}")
    }
}

impl From<&ColorDescriptor> for RegistryEncoding {
    fn from(color: &ColorDescriptor) -> Self {
        let ColorDescriptor { red, green, blue } = *color;

        let taskbar_format = format!("{red:02X}{green:02X}{blue:02X}{ALPHA:02X}");
        let windows_format = format!("{ALPHA:02X}{blue:02X}{green:02X}{red:02X}");
        let dword_value = u32::from_be_bytes([ALPHA, blue, green, red]);
        let palette_blob = taskbar_format.repeat(PALETTE_SWATCHES);

        Self {
            taskbar_format,
            windows_format,
            dword_value,
            palette_blob,
            channels: Channels { red, green, blue },
        }
    }
}
