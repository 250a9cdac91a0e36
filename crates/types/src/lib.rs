//! Validated text primitives shared by the intake crates.
//!
//! Form input arrives as free text. These types are what it becomes once a registration is
//! accepted: every value has been trimmed and checked, so downstream code never re-validates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The input contained characters that are not allowed in a contact number
    #[error("contact number may only contain digits, spaces, '+' and '-'")]
    InvalidContactNumber,
}

/// A string that holds at least one non-whitespace character.
///
/// Input is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A patient contact number.
///
/// Only the characters found in hand-typed phone numbers are accepted; no attempt is made to
/// check the number against a dialling plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactNumber(NonEmptyText);

impl ContactNumber {
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidContactNumber`] when
    /// the input contains anything other than digits, spaces, `+` or `-`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        let ok = text
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'));
        if !ok || !text.as_str().chars().any(|c| c.is_ascii_digit()) {
            return Err(TextError::InvalidContactNumber);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ContactNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Asha Meena ").expect("valid text");
        assert_eq!(text.as_str(), "Asha Meena");
    }

    #[test]
    fn non_empty_text_rejects_blank() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank must fail");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn contact_number_accepts_common_forms() {
        assert!(ContactNumber::new("9829012345").is_ok());
        assert!(ContactNumber::new("+91 98290-12345").is_ok());
    }

    #[test]
    fn contact_number_rejects_letters_and_punctuation_only() {
        assert_eq!(
            ContactNumber::new("call me"),
            Err(TextError::InvalidContactNumber)
        );
        assert_eq!(ContactNumber::new("+ -"), Err(TextError::InvalidContactNumber));
        assert_eq!(ContactNumber::new(" "), Err(TextError::Empty));
    }
}
