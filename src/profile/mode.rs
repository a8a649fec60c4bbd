// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Performance modes, mode tiers and platform variants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GovernorError;

/// Number of numbered performance tiers (L0 - L7).
pub const MODE_TIER_COUNT: usize = 8;

/// Number of hardware SKU variants covered by the IR threshold arrays.
pub const PLATFORM_VARIANT_COUNT: usize = 8;

/// Firmware performance mode.
///
/// Each mode has exactly one variant. Display aliases that share a wire code
/// with another mode (such as `L8`) resolve through [`MODE_ALIASES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PerformanceMode {
    Default,
    Performance,
    Cool,
    Quiet,
    Extreme,
    L0,
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
    Eco,
}

/// Alternate names that map onto a canonical mode.
pub const MODE_ALIASES: &[(&str, PerformanceMode)] = &[("L8", PerformanceMode::Extreme)];

impl PerformanceMode {
    pub const ALL: [PerformanceMode; 14] = [
        PerformanceMode::Default,
        PerformanceMode::Performance,
        PerformanceMode::Cool,
        PerformanceMode::Quiet,
        PerformanceMode::Extreme,
        PerformanceMode::L0,
        PerformanceMode::L1,
        PerformanceMode::L2,
        PerformanceMode::L3,
        PerformanceMode::L4,
        PerformanceMode::L5,
        PerformanceMode::L6,
        PerformanceMode::L7,
        PerformanceMode::Eco,
    ];

    /// Firmware wire code for this mode.
    pub fn code(&self) -> u16 {
        match self {
            PerformanceMode::Default => 0x00,
            PerformanceMode::Performance => 0x01,
            PerformanceMode::Cool => 0x02,
            PerformanceMode::Quiet => 0x03,
            PerformanceMode::Extreme => 0x04,
            PerformanceMode::L0 => 0x10,
            PerformanceMode::L5 => 0x11,
            PerformanceMode::L1 => 0x20,
            PerformanceMode::L6 => 0x21,
            PerformanceMode::L2 => 0x30,
            PerformanceMode::L7 => 0x31,
            PerformanceMode::L3 => 0x40,
            PerformanceMode::L4 => 0x50,
            PerformanceMode::Eco => 0x100,
        }
    }

    /// Decode a firmware wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    /// Canonical name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            PerformanceMode::Default => "Default",
            PerformanceMode::Performance => "Performance",
            PerformanceMode::Cool => "Cool",
            PerformanceMode::Quiet => "Quiet",
            PerformanceMode::Extreme => "Extreme",
            PerformanceMode::L0 => "L0",
            PerformanceMode::L1 => "L1",
            PerformanceMode::L2 => "L2",
            PerformanceMode::L3 => "L3",
            PerformanceMode::L4 => "L4",
            PerformanceMode::L5 => "L5",
            PerformanceMode::L6 => "L6",
            PerformanceMode::L7 => "L7",
            PerformanceMode::Eco => "Eco",
        }
    }

    /// Numbered tier for L0 - L7, `None` for the named modes.
    pub fn tier(&self) -> Option<ModeTier> {
        let index = match self {
            PerformanceMode::L0 => 0,
            PerformanceMode::L1 => 1,
            PerformanceMode::L2 => 2,
            PerformanceMode::L3 => 3,
            PerformanceMode::L4 => 4,
            PerformanceMode::L5 => 5,
            PerformanceMode::L6 => 6,
            PerformanceMode::L7 => 7,
            _ => return None,
        };
        Some(ModeTier(index))
    }

    /// Whether this mode selects the performance power and fan calibration.
    pub fn is_performance_class(&self) -> bool {
        matches!(self, PerformanceMode::Performance | PerformanceMode::Extreme)
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PerformanceMode {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(mode) = Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(mode);
        }
        MODE_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
            .map(|(_, mode)| *mode)
            .ok_or_else(|| GovernorError::InvalidInput(format!("unknown performance mode '{}'", s)))
    }
}

impl TryFrom<String> for PerformanceMode {
    type Error = GovernorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Index of a numbered performance tier, always in `0..MODE_TIER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ModeTier(u8);

impl ModeTier {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Default for ModeTier {
    fn default() -> Self {
        ModeTier(0)
    }
}

impl TryFrom<u8> for ModeTier {
    type Error = GovernorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (value as usize) < MODE_TIER_COUNT {
            Ok(ModeTier(value))
        } else {
            Err(GovernorError::Config(format!(
                "mode tier {} out of range 0..{}",
                value, MODE_TIER_COUNT
            )))
        }
    }
}

impl From<ModeTier> for u8 {
    fn from(tier: ModeTier) -> Self {
        tier.0
    }
}

impl fmt::Display for ModeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Hardware SKU index into the per-variant IR threshold arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlatformVariant(u8);

impl PlatformVariant {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Default for PlatformVariant {
    fn default() -> Self {
        PlatformVariant(0)
    }
}

impl TryFrom<u8> for PlatformVariant {
    type Error = GovernorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (value as usize) < PLATFORM_VARIANT_COUNT {
            Ok(PlatformVariant(value))
        } else {
            Err(GovernorError::Config(format!(
                "platform variant {} out of range 0..{}",
                value, PLATFORM_VARIANT_COUNT
            )))
        }
    }
}

impl From<PlatformVariant> for u8 {
    fn from(variant: PlatformVariant) -> Self {
        variant.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l8_alias_resolves_to_extreme() {
        let mode: PerformanceMode = "L8".parse().unwrap();
        assert_eq!(mode, PerformanceMode::Extreme);
        assert_eq!(mode.code(), 0x04);
        assert_eq!(mode.name(), "Extreme");
    }

    #[test]
    fn test_codes_are_unique() {
        for a in PerformanceMode::ALL {
            for b in PerformanceMode::ALL {
                if a != b {
                    assert_ne!(a.code(), b.code(), "{} and {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_from_code_roundtrips_every_mode() {
        for mode in PerformanceMode::ALL {
            assert_eq!(PerformanceMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(PerformanceMode::from_code(0x99), None);
    }

    #[test]
    fn test_numbered_modes_have_tiers() {
        assert_eq!(PerformanceMode::L2.tier().map(|t| t.index()), Some(2));
        assert_eq!(PerformanceMode::L7.tier().map(|t| t.index()), Some(7));
        assert!(PerformanceMode::Default.tier().is_none());
        assert!(PerformanceMode::Eco.tier().is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!("Turbo".parse::<PerformanceMode>().is_err());
        assert_eq!(
            "performance".parse::<PerformanceMode>().unwrap(),
            PerformanceMode::Performance
        );
    }

    #[test]
    fn test_mode_tier_bounds() {
        assert!(ModeTier::try_from(7).is_ok());
        let err = ModeTier::try_from(8).unwrap_err();
        assert!(matches!(err, GovernorError::Config(_)));
    }

    #[test]
    fn test_platform_variant_bounds() {
        assert_eq!(PlatformVariant::try_from(2).unwrap().index(), 2);
        assert!(PlatformVariant::try_from(8).is_err());
    }

    #[test]
    fn test_mode_deserializes_alias() {
        let mode: PerformanceMode = serde_json::from_str("\"L8\"").unwrap();
        assert_eq!(mode, PerformanceMode::Extreme);
        let tier: std::result::Result<ModeTier, _> = serde_json::from_str("9");
        assert!(tier.is_err());
    }
}
