//! Wards and ward ordering
//!
//! A ward is an administrative zone identifier delivered as a string. The
//! population splits into:
//! - numeric wards (`"1"`, `"12"`), ordered numerically
//! - the sentinel [`WARD_NOT_PROVIDED`], always shown and placed last
//! - any other string, a free-form ward name, groupable but never part of a
//!   numeric range

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sentinel ward for documents whose ward was not captured
pub const WARD_NOT_PROVIDED: &str = "Ward not provided";

/// Ward identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ward(String);

/// Classification of a ward string
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WardKind {
    /// Parses as a finite number
    Numeric(f64),
    /// The "ward not provided" sentinel
    NotProvided,
    /// Any other label
    Named,
}

impl Ward {
    /// Wrap a raw ward string (no normalization)
    #[inline]
    #[must_use]
    pub fn new(ward: impl Into<String>) -> Self {
        Self(ward.into())
    }

    /// The sentinel ward
    #[inline]
    #[must_use]
    pub fn not_provided() -> Self {
        Self(WARD_NOT_PROVIDED.to_string())
    }

    /// Use the sentinel when no ward was captured
    #[must_use]
    pub fn or_not_provided(ward: Option<Ward>) -> Self {
        ward.unwrap_or_else(Self::not_provided)
    }

    /// Borrow the raw ward string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify this ward
    #[must_use]
    pub fn kind(&self) -> WardKind {
        if self.0 == WARD_NOT_PROVIDED {
            return WardKind::NotProvided;
        }
        match self.0.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && !self.0.trim().is_empty() => WardKind::Numeric(n),
            _ => WardKind::Named,
        }
    }

    /// Numeric value, if this is a numeric ward
    #[inline]
    #[must_use]
    pub fn numeric(&self) -> Option<f64> {
        match self.kind() {
            WardKind::Numeric(n) => Some(n),
            _ => None,
        }
    }

    /// Whether this is the sentinel ward
    #[inline]
    #[must_use]
    pub fn is_not_provided(&self) -> bool {
        self.0 == WARD_NOT_PROVIDED
    }
}

impl std::fmt::Display for Ward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ward {
    fn from(ward: &str) -> Self {
        Self::new(ward)
    }
}

impl From<String> for Ward {
    fn from(ward: String) -> Self {
        Self(ward)
    }
}

/// Anything displayed in ward order
pub trait WardKeyed {
    /// The ward this item belongs to
    fn ward(&self) -> &Ward;
}

impl WardKeyed for Ward {
    fn ward(&self) -> &Ward {
        self
    }
}

fn display_order(a: &Ward, b: &Ward) -> Ordering {
    match (a.numeric(), b.numeric()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort into display order
///
/// Ascending numeric wards first, then every non-numeric ward (sentinel and
/// named alike) in its original relative order. The sort is stable, so ties
/// keep their input order.
pub fn sort_for_display<T: WardKeyed>(items: &mut [T]) {
    items.sort_by(|a, b| display_order(a.ward(), b.ward()));
}

/// Numeric extent of a ward population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WardBounds {
    /// Floor of the smallest numeric ward
    pub min: i64,
    /// Ceiling of the largest numeric ward
    pub max: i64,
    /// Whether the sentinel ward is present
    pub includes_not_provided: bool,
}

impl WardBounds {
    /// Compute bounds, or `None` when no ward is numeric
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_wards<'a, T: WardKeyed + 'a>(items: impl IntoIterator<Item = &'a T>) -> Option<Self> {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut includes_not_provided = false;

        for item in items {
            let ward = item.ward();
            match ward.kind() {
                WardKind::Numeric(n) => {
                    min = Some(min.map_or(n, |m| m.min(n)));
                    max = Some(max.map_or(n, |m| m.max(n)));
                }
                WardKind::NotProvided => includes_not_provided = true,
                WardKind::Named => {}
            }
        }

        Some(Self {
            min: min?.floor() as i64,
            max: max?.ceil() as i64,
            includes_not_provided,
        })
    }

    /// Upper bound of the range control
    ///
    /// One past the largest numeric ward when the sentinel is present, so the
    /// sentinel has a slot of its own.
    #[inline]
    #[must_use]
    pub fn effective_max(&self) -> i64 {
        if self.includes_not_provided {
            self.max.saturating_add(1)
        } else {
            self.max
        }
    }

    /// Range covering every numeric ward
    #[inline]
    #[must_use]
    pub fn full_range(&self) -> WardRange {
        WardRange::new(self.min, self.max)
    }

    /// Position of a ward on the range control
    ///
    /// Named wards have no position.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, ward: &Ward) -> Option<f64> {
        match ward.kind() {
            WardKind::Numeric(n) => Some(n),
            WardKind::NotProvided => Some(self.effective_max() as f64),
            WardKind::Named => None,
        }
    }
}

/// Inclusive numeric ward range selected on the range control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WardRange {
    lo: i64,
    hi: i64,
}

impl WardRange {
    /// Create a range; reversed bounds are swapped
    #[inline]
    #[must_use]
    pub fn new(lo: i64, hi: i64) -> Self {
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    /// Lower bound
    #[inline]
    #[must_use]
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// Upper bound
    #[inline]
    #[must_use]
    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Whether a ward is shown under this range
    ///
    /// Numeric wards must fall inside the bounds. The sentinel is always
    /// shown. Named wards never are.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn admits(&self, ward: &Ward) -> bool {
        match ward.kind() {
            WardKind::Numeric(n) => n >= self.lo as f64 && n <= self.hi as f64,
            WardKind::NotProvided => true,
            WardKind::Named => false,
        }
    }
}

/// Keep the items admitted by `range`, preserving order
#[must_use]
pub fn filter_in_range<T: WardKeyed + Clone>(items: &[T], range: WardRange) -> Vec<T> {
    items
        .iter()
        .filter(|item| range.admits(item.ward()))
        .cloned()
        .collect()
}
