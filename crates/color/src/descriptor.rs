use std::fmt;
use std::str::FromStr;

use crate::ApplyError;

/// An RGB color parsed from `#RRGGBB` or `RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorDescriptor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ColorDescriptor {
    /// Parses exactly six hex digits after an optional leading `#`.
    pub fn parse(input: &str) -> Result<Self, ApplyError> {
        let invalid = || ApplyError::InvalidFormat(input.to_string());

        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        // All bytes are ASCII hex digits, so slicing on byte offsets is safe.
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        Ok(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
        })
    }

    /// Six uppercase hex digits without the leading `#`.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl FromStr for ColorDescriptor {
    type Err = ApplyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ColorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}
