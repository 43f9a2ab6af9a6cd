#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

pub mod catalog;
pub mod divider;
pub mod error;
pub mod search;
pub mod units;

pub use catalog::{Catalog, ClockSource, Prescaling, PrescalerStage, Variant};
pub use divider::{ClockDivider, TimerDivider};
pub use error::{Error, Result};
pub use search::{search, AppliedPrescaler, Candidate, PrescalerSelection, SearchOptions, SearchOutcome};
pub use units::{from_canonical, to_canonical, TimeUnit};
