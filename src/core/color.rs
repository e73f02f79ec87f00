//! Playbulb color values
//! This module handles parsing color input and the fixed preset table.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use thiserror::Error;

use crate::core::bluetooth::COLOR_PACKET_SIZE;

static COLOR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-fA-F]{2}){4}$").expect("color pattern is valid"));

/// A color as the bulb stores it: `[mode/white, red, green, blue]`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorValue([u8; COLOR_PACKET_SIZE]);

impl ColorValue {
    pub const OFF: ColorValue = ColorValue([0x00, 0x00, 0x00, 0x00]);

    pub const fn new(white: u8, red: u8, green: u8, blue: u8) -> Self {
        Self([white, red, green, blue])
    }

    /// Builds a color from raw bytes, returning `None` unless exactly four bytes are given
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; COLOR_PACKET_SIZE]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; COLOR_PACKET_SIZE] {
        &self.0
    }

    pub fn white(&self) -> u8 {
        self.0[0]
    }

    pub fn red(&self) -> u8 {
        self.0[1]
    }

    pub fn green(&self) -> u8 {
        self.0[2]
    }

    pub fn blue(&self) -> u8 {
        self.0[3]
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorValue({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color literal {0:?}: expected 8 hex digits")]
pub struct ParseColorError(String);

impl FromStr for ColorValue {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !COLOR_REGEXP.is_match(s) {
            return Err(ParseColorError(s.to_string()));
        }

        let mut bytes = [0u8; COLOR_PACKET_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseColorError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

/// Named colors accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Red,
    Green,
    Blue,
    Purple,
    Off,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Red,
        Preset::Green,
        Preset::Blue,
        Preset::Purple,
        Preset::Off,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Off => "off",
        }
    }

    pub fn value(&self) -> ColorValue {
        match self {
            Self::Red => ColorValue::new(0x00, 0xff, 0x00, 0x00),
            Self::Green => ColorValue::new(0x00, 0x00, 0xff, 0x00),
            Self::Blue => ColorValue::new(0x00, 0x00, 0x00, 0xff),
            Self::Purple => ColorValue::new(0x00, 0x33, 0x00, 0x66),
            Self::Off => ColorValue::OFF,
        }
    }
}

/// Where the requested color came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// An 8-hex-digit literal such as `deadbeef`
    Literal(ColorValue),
    /// A named entry of the preset table
    Preset(Preset),
    /// Nothing usable was given, so the bulb is turned off
    Fallback,
}

impl ColorSource {
    /// Resolves user input. Literals win over preset names; anything else falls back to off.
    pub fn resolve(input: Option<&str>) -> Self {
        let Some(arg) = input else {
            warn!("No color value! Turning off...");
            return Self::Fallback;
        };

        if let Ok(color) = arg.parse::<ColorValue>() {
            Self::Literal(color)
        } else if let Some(preset) = Preset::from_name(arg) {
            Self::Preset(preset)
        } else {
            warn!("No color value! Turning off...");
            Self::Fallback
        }
    }

    pub fn color(&self) -> ColorValue {
        match self {
            Self::Literal(color) => *color,
            Self::Preset(preset) => preset.value(),
            Self::Fallback => ColorValue::OFF,
        }
    }
}
