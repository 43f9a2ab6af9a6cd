/// Fractional digits of the recommended interval and error, in the unit the
/// user asked for.
pub const READOUT_PRECISION: usize = 6;
/// Fractional digits of the interval and error columns (always microseconds).
pub const TABLE_PRECISION: usize = 3;
/// Values at or above this magnitude are printed in scientific notation.
pub const SCIENTIFIC_THRESHOLD: f64 = 1e12;

/// Environment variables that preset command line flags. A `.env` file in
/// the working directory is loaded before they are read.
pub const VARIANT_ENV: &str = "WDT_CALC_VARIANT";
pub const TOLERANCE_ENV: &str = "WDT_CALC_TOLERANCE_US";
pub const FORMAT_ENV: &str = "WDT_CALC_FORMAT";

pub const DEFAULT_VARIANT: &str = "full";
pub const DEFAULT_TOLERANCE_US: f64 = 0.0;

/// A best match further than this fraction of the target away is logged as a
/// warning.
pub const LARGE_ERROR_RATIO: f64 = 0.1;
