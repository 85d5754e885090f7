//! Payload decoding
//!
//! Two policies:
//! - [`decode`]: strict. Any mismatch rejects the whole payload.
//! - [`decode_lenient`]: bulk listings. The payload must be an array, each
//!   element is decoded on its own, and bad elements are dropped.

use crate::error::{PartialItemError, ValidationError};
use crate::schema::Validate;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode and validate a whole payload
///
/// # Errors
/// `ValidationError` naming the first offending path
pub fn decode<T>(endpoint: &'static str, payload: Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let decoded: T = serde_path_to_error::deserialize(payload).map_err(|e| {
        ValidationError::new(endpoint, e.path().to_string(), e.inner().to_string())
    })?;
    decoded
        .validate()
        .map_err(|field| ValidationError::from_field(endpoint, field))?;
    Ok(decoded)
}

/// Valid subset of a bulk listing plus what was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lenient<T> {
    /// Elements that passed validation, in payload order
    pub items: Vec<T>,
    /// Elements that did not
    pub skipped: Vec<PartialItemError>,
}

impl<T> Lenient<T> {
    /// Whether every element was accepted
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Map accepted items, keeping the skip report
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Lenient<U> {
        Lenient {
            items: self.items.into_iter().map(f).collect(),
            skipped: self.skipped,
        }
    }
}

/// Decode a bulk listing element by element
///
/// # Errors
/// `ValidationError` only when the payload is not an array
pub fn decode_lenient<T>(endpoint: &'static str, payload: Value) -> Result<Lenient<T>, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let Value::Array(elements) = payload else {
        return Err(ValidationError::new(endpoint, ".", "expected an array"));
    };

    let mut items = Vec::with_capacity(elements.len());
    let mut skipped = Vec::new();
    for (index, element) in elements.into_iter().enumerate() {
        match decode::<T>(endpoint, element) {
            Ok(item) => items.push(item),
            Err(source) => {
                tracing::warn!(endpoint, index, error = %source, "dropping invalid list item");
                skipped.push(PartialItemError { index, source });
            }
        }
    }

    Ok(Lenient { items, skipped })
}
