use alloc::string::String;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("InvalidUnit ({:?}): unit must be one of 'ns', 'us', 'ms', 's'", .0)]
    InvalidUnit(String),
    #[error("UnknownVariant ({:?}): variant must be one of 'full', 'tiered', 'restricted'", .0)]
    UnknownVariant(String),
    #[error("InvalidDesiredValue ({}): desired duration must be finite and not negative", .0)]
    InvalidDesiredValue(f64),
    #[error("InvalidTolerance ({}): tolerance must be finite and not negative", .0)]
    InvalidTolerance(f64),
    #[error("EmptyCatalog: no clock source or timer divider to enumerate")]
    EmptyCatalog,
    #[error("InvalidFrequency: clock source {} has a base frequency of 0 Hz", .clock)]
    InvalidFrequency { clock: &'static str },
    #[error("CatalogTooLarge: {} combinations exceed the limit of {}", .size, .limit)]
    CatalogTooLarge { size: usize, limit: usize },
}
