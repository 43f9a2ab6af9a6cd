use core::fmt;

use alloc::vec::Vec;
use num_traits::Float;

#[cfg(feature = "defmt")]
use defmt::Format;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

use crate::catalog::{Catalog, ClockSource, Prescaling, PrescalerStage};
use crate::divider::{ClockDivider, TimerDivider};
use crate::error::{Error, Result};
use crate::units::{from_canonical, TimeUnit};

/// Upper bound on the number of candidates a single search may enumerate.
pub const DEFAULT_MAX_CANDIDATES: usize = 16_384;

const US_PER_S: f64 = 1_000_000.0;

/// One prescaler stage set to one of its dividers.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppliedPrescaler {
    pub stage: &'static str,
    pub divider: ClockDivider,
}

impl AppliedPrescaler {
    fn new(stage: &PrescalerStage, divider: ClockDivider) -> Self {
        Self { stage: stage.name, divider }
    }
}

impl fmt::Display for AppliedPrescaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.stage, self.divider)
    }
}

/// The prescaler settings a candidate was computed with. Mirrors
/// [`Prescaling`]: one entry per stage of the source.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrescalerSelection {
    None,
    Single(AppliedPrescaler),
    Dual(AppliedPrescaler, AppliedPrescaler),
}

impl PrescalerSelection {
    /// Every selection `prescaling` allows, outer stage varying slowest.
    fn all(prescaling: &Prescaling) -> Vec<Self> {
        match prescaling {
            Prescaling::None => alloc::vec![PrescalerSelection::None],
            Prescaling::Single(stage) => stage
                .dividers
                .iter()
                .map(|&divider| PrescalerSelection::Single(AppliedPrescaler::new(stage, divider)))
                .collect(),
            Prescaling::Dual(outer, inner) => outer
                .dividers
                .iter()
                .flat_map(|&outer_divider| {
                    inner.dividers.iter().map(move |&inner_divider| {
                        PrescalerSelection::Dual(
                            AppliedPrescaler::new(outer, outer_divider),
                            AppliedPrescaler::new(inner, inner_divider),
                        )
                    })
                })
                .collect(),
        }
    }

    pub fn applied(&self) -> impl Iterator<Item = &AppliedPrescaler> {
        let (first, second) = match self {
            PrescalerSelection::None => (None, None),
            PrescalerSelection::Single(p) => (Some(p), None),
            PrescalerSelection::Dual(outer, inner) => (Some(outer), Some(inner)),
        };
        first.into_iter().chain(second)
    }

    /// Combined division ratio of all applied stages.
    pub fn product(&self) -> u32 {
        self.applied().map(|p| p.divider.divisor()).product()
    }
}

impl fmt::Display for PrescalerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrescalerSelection::None => f.write_str("N/A"),
            PrescalerSelection::Single(p) => write!(f, "{}", p),
            PrescalerSelection::Dual(outer, inner) => write!(f, "{} {}", outer, inner),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for PrescalerSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.applied())
    }
}

/// A fully specified clock configuration and the interval it produces.
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub source: &'static str,
    /// Oscillator frequency before any prescaler, in Hz.
    pub base_frequency: u32,
    #[cfg_attr(feature = "serde", serde(rename = "prescalers"))]
    pub prescaler: PrescalerSelection,
    pub divider: TimerDivider,
    /// Frequency after the prescalers, in Hz.
    pub effective_frequency: f64,
    pub time_us: f64,
    pub error_us: f64,
}

impl Candidate {
    fn new(source: &ClockSource, base_frequency: u32, prescaler: PrescalerSelection,
           divider: TimerDivider, desired_us: f64) -> Self
    {
        let effective_frequency = f64::from(base_frequency) / f64::from(prescaler.product());
        let time_us = (divider.divisor() as f64 / effective_frequency) * US_PER_S;
        Self {
            source: source.name,
            base_frequency,
            prescaler,
            divider,
            effective_frequency,
            time_us,
            error_us: Float::abs(time_us - desired_us),
        }
    }

    pub fn time_in(&self, unit: TimeUnit) -> f64 {
        from_canonical(self.time_us, unit)
    }

    pub fn error_in(&self, unit: TimeUnit) -> f64 {
        from_canonical(self.error_us, unit)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchOptions {
    /// A primary-source candidate at most this far (in us) from the target
    /// ends the search early.
    pub tolerance_us: f64,
    /// Catalogs producing more candidates than this are rejected.
    pub max_candidates: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { tolerance_us: 0.0, max_candidates: DEFAULT_MAX_CANDIDATES }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Every candidate, in enumeration order.
    pub candidates: Vec<Candidate>,
    pub best: Candidate,
    /// `true` when a primary-source candidate was within tolerance and the
    /// broad sources were not enumerated.
    pub short_circuited: bool,
}

/// Find the clock configuration whose interval is closest to `desired_us`.
///
/// Candidates are enumerated source by source in catalog order (the primary
/// source, if any, first), then by base frequency, prescaler selection and
/// timer divider, each in declaration order. The best candidate is the first
/// one with the smallest error.
///
/// If the catalog has a primary source and its best candidate is within
/// `options.tolerance_us`, the search stops there and only the primary
/// candidates are returned.
pub fn search(desired_us: f64, catalog: &Catalog, options: &SearchOptions) -> Result<SearchOutcome> {
    if !desired_us.is_finite() || desired_us < 0.0 {
        return Err(Error::InvalidDesiredValue(desired_us));
    }
    if !options.tolerance_us.is_finite() || options.tolerance_us < 0.0 {
        return Err(Error::InvalidTolerance(options.tolerance_us));
    }
    validate_catalog(catalog)?;

    let size = catalog.cardinality();
    if size > options.max_candidates {
        return Err(Error::CatalogTooLarge { size, limit: options.max_candidates });
    }

    let mut candidates = Vec::with_capacity(size);

    if let Some(primary) = &catalog.primary {
        enumerate(&primary.source, primary.timer_dividers, desired_us, &mut candidates);
        let best = best_of(&candidates).ok_or(Error::EmptyCatalog)?;
        if best.error_us <= options.tolerance_us {
            return Ok(SearchOutcome { candidates, best, short_circuited: true });
        }
    }

    for source in catalog.sources {
        enumerate(source, catalog.timer_dividers, desired_us, &mut candidates);
    }
    let best = best_of(&candidates).ok_or(Error::EmptyCatalog)?;

    Ok(SearchOutcome { candidates, best, short_circuited: false })
}

/// Every source must contribute at least one candidate, and every base
/// frequency must be non-zero.
fn validate_catalog(catalog: &Catalog) -> Result<()> {
    if catalog.sources.is_empty() || catalog.timer_dividers.is_empty() {
        return Err(Error::EmptyCatalog);
    }
    if let Some(primary) = &catalog.primary {
        if primary.timer_dividers.is_empty() {
            return Err(Error::EmptyCatalog);
        }
    }

    let primary = catalog.primary.as_ref().map(|p| &p.source);
    for source in primary.into_iter().chain(catalog.sources) {
        if source.settings() == 0 {
            return Err(Error::EmptyCatalog);
        }
        if source.frequencies.contains(&0) {
            return Err(Error::InvalidFrequency { clock: source.name });
        }
    }

    Ok(())
}

fn enumerate(source: &ClockSource, dividers: &[TimerDivider], desired_us: f64, out: &mut Vec<Candidate>) {
    let selections = PrescalerSelection::all(&source.prescaling);
    for &base_frequency in source.frequencies {
        for &selection in &selections {
            for &divider in dividers {
                out.push(Candidate::new(source, base_frequency, selection, divider, desired_us));
            }
        }
    }
}

/// First candidate with the smallest error.
fn best_of(candidates: &[Candidate]) -> Option<Candidate> {
    let mut iter = candidates.iter();
    let mut best = *iter.next()?;
    for candidate in iter {
        if candidate.error_us < best.error_us {
            best = *candidate;
        }
    }
    Some(best)
}
