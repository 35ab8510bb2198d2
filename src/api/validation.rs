//! Utilities to help with API request validation.

use derive_more::derive::{AsRef, Deref, Display};
use serde::Deserialize;
use thiserror::Error;

/// A new todo item's description.
///
/// The upper bound matches the 64 KiB limit a table string property has in UTF-16.
pub type TaskDescription = BoundedString<1, 32_768>;

/// A [`String`] newtype that guarantees its length is within a certain range.
#[derive(Deref, AsRef, Display, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[as_ref(forward)]
#[serde(try_from = "String")]
pub struct BoundedString<const MIN: usize, const MAX: usize>(String);

impl<const MIN: usize, const MAX: usize> BoundedString<MIN, MAX> {
    /// Consumes the [`BoundedString`], returning the wrapped [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// An error constructing a [`BoundedString`].
#[derive(Error, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BoundedStringError<const MIN: usize, const MAX: usize> {
    /// The length was less than the [`BoundedString`]'s `MIN`.
    #[error("invalid length {0}, expected at least {MIN}")]
    TooShort(usize),

    /// The length was greater than the [`BoundedString`]'s `MAX`.
    #[error("invalid length {0}, expected at most {MAX}")]
    TooLong(usize),
}

impl<const MIN: usize, const MAX: usize> TryFrom<String> for BoundedString<MIN, MAX> {
    type Error = BoundedStringError<MIN, MAX>;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        let length = string.chars().count();

        if length < MIN {
            Err(BoundedStringError::TooShort(length))
        } else if length > MAX {
            Err(BoundedStringError::TooLong(length))
        } else {
            Ok(Self(string))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_description_is_rejected() {
        assert_eq!(
            TaskDescription::try_from(String::new()),
            Err(BoundedStringError::TooShort(0)),
        );
    }

    #[test]
    fn length_counts_characters() -> anyhow::Result<()> {
        let description = TaskDescription::try_from("🌱".repeat(32_768))?;
        assert_eq!(description.chars().count(), 32_768);

        assert_eq!(
            TaskDescription::try_from("x".repeat(32_769)),
            Err(BoundedStringError::TooLong(32_769)),
        );

        Ok(())
    }

    #[test]
    fn deserializes_through_validation() {
        let result = serde_json::from_str::<TaskDescription>("\"\"");

        assert!(result.is_err(), "empty string shouldn't deserialize");
    }
}
