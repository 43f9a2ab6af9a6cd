use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

#[cfg(feature = "defmt")]
use defmt::Format;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::divider::{ClockDivider, TimerDivider};
use crate::error::Error;

/// Frequency of the 32 kHz crystal feeding ACLK.
pub const LFXT_FREQ: u32 = 32_768;

/// DCO settings reachable by MCLK and SMCLK. 24 MHz is the highest
/// frequency allowed on either line.
pub const DCO_FREQS: [u32; 7] = [
    2_000_000, 4_000_000, 8_000_000, 12_000_000, 16_000_000, 20_000_000, 24_000_000,
];

/// DCO settings for the cascaded catalog, which can also run the DCO at 1 MHz.
pub const DCO_FREQS_EXTENDED: [u32; 8] = [
    1_000_000, 2_000_000, 4_000_000, 8_000_000, 12_000_000, 16_000_000, 20_000_000, 24_000_000,
];

/// The only two oscillator settings kept by the restricted catalog.
pub const DCO_FREQS_RESTRICTED: [u32; 2] = [16_000_000, 24_000_000];

/// A prescaler register field and the settings it accepts, in the order they
/// are tried.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrescalerStage {
    pub name: &'static str,
    pub dividers: &'static [ClockDivider],
}

/// How many prescaler stages sit between a clock source and the timer.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prescaling {
    None,
    Single(PrescalerStage),
    /// Outer stage first, inner stage applied on top of it.
    Dual(PrescalerStage, PrescalerStage),
}

impl Prescaling {
    /// Number of distinct prescaler selections this topology offers.
    /// Saturates at `usize::MAX`.
    pub fn combinations(&self) -> usize {
        match self {
            Prescaling::None => 1,
            Prescaling::Single(stage) => stage.dividers.len(),
            Prescaling::Dual(outer, inner) => outer.dividers.len().saturating_mul(inner.dividers.len()),
        }
    }

    pub fn stages(&self) -> impl Iterator<Item = &PrescalerStage> {
        let (first, second) = match self {
            Prescaling::None => (None, None),
            Prescaling::Single(stage) => (Some(stage), None),
            Prescaling::Dual(outer, inner) => (Some(outer), Some(inner)),
        };
        first.into_iter().chain(second)
    }
}

/// One clock line that can drive the timer.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockSource {
    pub name: &'static str,
    /// Base frequencies in Hz, in enumeration order.
    pub frequencies: &'static [u32],
    pub prescaling: Prescaling,
}

impl ClockSource {
    /// Number of (frequency, prescaler selection) pairs this source offers.
    pub fn settings(&self) -> usize {
        self.frequencies.len().saturating_mul(self.prescaling.combinations())
    }
}

/// Fast-path source tried before the rest of the catalog. When one of its
/// candidates is within tolerance, the other sources are never enumerated.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrimarySource {
    pub source: ClockSource,
    pub timer_dividers: &'static [TimerDivider],
}

/// A fixed description of every clock configuration one device variant can
/// reach.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub name: &'static str,
    pub primary: Option<PrimarySource>,
    pub sources: &'static [ClockSource],
    pub timer_dividers: &'static [TimerDivider],
}

impl Catalog {
    // Counts saturate at `usize::MAX` so oversized catalogs compare as too
    // large instead of wrapping.

    /// Candidates produced by the primary source alone.
    pub fn primary_cardinality(&self) -> usize {
        self.primary
            .map(|p| p.source.settings().saturating_mul(p.timer_dividers.len()))
            .unwrap_or(0)
    }

    /// Candidates produced by the broad sources.
    pub fn broad_cardinality(&self) -> usize {
        self.sources
            .iter()
            .map(ClockSource::settings)
            .fold(0, usize::saturating_add)
            .saturating_mul(self.timer_dividers.len())
    }

    /// Total number of candidates a search produces when nothing is skipped.
    pub fn cardinality(&self) -> usize {
        self.primary_cardinality().saturating_add(self.broad_cardinality())
    }
}

const DIVM: PrescalerStage = PrescalerStage { name: "DIVM", dividers: &ClockDivider::BASIC };
const DIVS: PrescalerStage = PrescalerStage { name: "DIVS", dividers: &ClockDivider::BASIC };

const ACLK: ClockSource = ClockSource {
    name: "ACLK",
    frequencies: &[LFXT_FREQ],
    prescaling: Prescaling::None,
};

const SMCLK: ClockSource = ClockSource {
    name: "SMCLK",
    frequencies: &DCO_FREQS,
    prescaling: Prescaling::Single(DIVS),
};

const MCLK: ClockSource = ClockSource {
    name: "MCLK",
    frequencies: &DCO_FREQS,
    prescaling: Prescaling::Single(DIVM),
};

/// ACLK, SMCLK and MCLK over the full DCO range.
pub static FULL: Catalog = Catalog {
    name: "full",
    primary: None,
    sources: &[ACLK, SMCLK, MCLK],
    timer_dividers: &TimerDivider::ALL,
};

/// ACLK alone first; the DCO through DIVM and DIVS only if ACLK is not
/// close enough.
pub static TIERED: Catalog = Catalog {
    name: "tiered",
    primary: Some(PrimarySource {
        source: ACLK,
        timer_dividers: &[
            TimerDivider::Pow6,
            TimerDivider::Pow9,
            TimerDivider::Pow13,
            TimerDivider::Pow15,
        ],
    }),
    sources: &[ClockSource {
        name: "DCO",
        frequencies: &DCO_FREQS_EXTENDED,
        prescaling: Prescaling::Dual(DIVM, DIVS),
    }],
    timer_dividers: &TimerDivider::ALL,
};

/// Same lines as [`FULL`], limited to the oscillator settings in
/// [`DCO_FREQS_RESTRICTED`].
pub static RESTRICTED: Catalog = Catalog {
    name: "restricted",
    primary: None,
    sources: &[
        ACLK,
        ClockSource { frequencies: &DCO_FREQS_RESTRICTED, ..SMCLK },
        ClockSource { frequencies: &DCO_FREQS_RESTRICTED, ..MCLK },
    ],
    timer_dividers: &TimerDivider::ALL,
};

/// Built-in catalog selector.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    #[default]
    Full,
    Tiered,
    Restricted,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::Tiered, Variant::Restricted];

    pub fn catalog(&self) -> &'static Catalog {
        match self {
            Variant::Full => &FULL,
            Variant::Tiered => &TIERED,
            Variant::Restricted => &RESTRICTED,
        }
    }

    pub fn name(&self) -> &'static str {
        self.catalog().name
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| Error::UnknownVariant(name.to_string()))
    }
}
