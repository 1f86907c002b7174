//! Validation Errors
//!
//! Field-attributed validation errors. Validators push into a shared
//! [`ValidationErrors`] so one call can report problems across several inputs.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use smallvec::SmallVec;

/// Error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A predicate, reward type or reward value is missing.
    Required,

    /// Malformed input or a business-rule violation.
    Invalid,

    /// Fixed reward amount exceeds the currency's minor-unit precision.
    InvalidPrecision,

    /// Catalogue and order predicates set on the same rule.
    MixedPredicates,

    /// Catalogue and order rules mixed within one promotion.
    MixedPromotionPredicates,

    /// Fixed reward without any channel.
    MissingChannels,

    /// Fixed reward across channels with different currencies.
    MultipleCurrenciesNotAllowed,

    /// Products without variants cannot join a catalogue.
    CannotManageProductWithoutVariant,

    /// Referenced entity does not exist.
    NotFound,
}

impl ErrorCode {
    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::Invalid => "INVALID",
            Self::InvalidPrecision => "INVALID_PRECISION",
            Self::MixedPredicates => "MIXED_PREDICATES",
            Self::MixedPromotionPredicates => "MIXED_PROMOTION_PREDICATES",
            Self::MissingChannels => "MISSING_CHANNELS",
            Self::MultipleCurrenciesNotAllowed => "MULTIPLE_CURRENCIES_NOT_ALLOWED",
            Self::CannotManageProductWithoutVariant => "CANNOT_MANAGE_PRODUCT_WITHOUT_VARIANT",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra parameters attached to a [`FieldError`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorParams {
    /// Position of the offending element in a bulk input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Entity ids the error refers to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Error code.
    pub code: ErrorCode,

    /// Human readable message.
    pub message: String,

    /// Extra parameters.
    pub params: ErrorParams,
}

impl FieldError {
    /// Create an error without parameters.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: ErrorParams::default(),
        }
    }

    /// Attach the bulk input index.
    #[must_use]
    pub fn with_index(mut self, index: Option<usize>) -> Self {
        self.params.index = index;
        self
    }

    /// Attach the offending entity ids.
    #[must_use]
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;

        if let Some(index) = self.params.index {
            write!(f, " (index {index})")?;
        }

        Ok(())
    }
}

/// Errors accumulated per input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, SmallVec<[FieldError; 1]>>,
}

impl ValidationErrors {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`.
    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.fields.entry(field.into()).or_default().push(error);
    }

    /// Move every error from `other` into `self`.
    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, errors) in other.fields {
            self.fields.entry(field).or_default().extend(errors);
        }
    }

    /// Whether no error was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.values().map(SmallVec::len).sum()
    }

    /// Errors recorded against `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[FieldError] {
        self.fields.get(field).map_or(&[][..], SmallVec::as_slice)
    }

    /// Whether `field` carries an error with `code`.
    #[must_use]
    pub fn has(&self, field: &str, code: ErrorCode) -> bool {
        self.get(field).iter().any(|error| error.code == code)
    }

    /// Iterate over `(field, error)` pairs in field order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.fields
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |error| (field.as_str(), error)))
    }

    /// `Ok(())` when empty, otherwise the collection itself.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (field, error) in self.entries() {
            if !first {
                f.write_str("; ")?;
            }

            write!(f, "{field}: {error}")?;
            first = false;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
