//! # Restriction Algebra
//!
//! YANG `range` and `length` arguments are unions of closed intervals
//! (`"1..10 | 20 | 30..max"`). A derived type's restriction is intersected
//! with its base's, never substituted for it, so a typedef chain can only
//! narrow the value space. An empty intersection means no value can satisfy
//! the chain, which is reported as an invalid constraint.
//!
//! Patterns accumulate instead: every pattern in the chain must match (or,
//! for `invert-match`, must not match).

use std::fmt;
use std::str::FromStr;

use ysc_core::{EnumSpec, PatternSpec};

/// Numeric type usable as an interval bound.
pub trait Bound: Copy + PartialOrd + fmt::Display + FromStr {}

impl Bound for i128 {}
impl Bound for u64 {}
impl Bound for f64 {}

/// A closed interval `lo..hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub lo: T,
    pub hi: T,
}

impl<T: Bound> Interval<T> {
    fn intersect(&self, other: &Self) -> Option<Self> {
        let lo = if self.lo >= other.lo { self.lo } else { other.lo };
        let hi = if self.hi <= other.hi { self.hi } else { other.hi };
        (lo <= hi).then_some(Self { lo, hi })
    }
}

impl<T: Bound> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}..{}", self.lo, self.hi)
        }
    }
}

/// A union of disjoint closed intervals in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSet<T>(Vec<Interval<T>>);

impl<T: Bound> RangeSet<T> {
    /// The single interval `lo..hi`.
    pub fn full(lo: T, hi: T) -> Self {
        Self(vec![Interval { lo, hi }])
    }

    /// Parse a YANG range or length expression. `min` and `max` stand for
    /// the lowest and highest value of `base`. The result is intersected
    /// with `base`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if a bound does not parse, an
    /// interval is inverted, intervals are not in ascending order, or the
    /// intersection with `base` is empty.
    pub fn parse_restriction(expr: &str, base: &Self) -> Result<Self, String> {
        let (base_min, base_max) = match (base.min(), base.max()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Err("base type admits no values".to_string()),
        };
        let bound = |text: &str| -> Result<T, String> {
            match text.trim() {
                "min" => Ok(base_min),
                "max" => Ok(base_max),
                other => other
                    .parse::<T>()
                    .map_err(|_| format!("'{other}' is not a valid bound in '{expr}'")),
            }
        };

        let mut intervals: Vec<Interval<T>> = Vec::new();
        for part in expr.split('|') {
            let part = part.trim();
            if part.is_empty() {
                return Err(format!("empty interval in '{expr}'"));
            }
            let interval = match part.split_once("..") {
                Some((lo, hi)) => Interval {
                    lo: bound(lo)?,
                    hi: bound(hi)?,
                },
                None => {
                    let v = bound(part)?;
                    Interval { lo: v, hi: v }
                }
            };
            if interval.lo > interval.hi {
                return Err(format!("interval '{part}' has its lower bound above its upper bound"));
            }
            if let Some(prev) = intervals.last() {
                if interval.lo <= prev.hi {
                    return Err(format!("intervals in '{expr}' overlap or are not in ascending order"));
                }
            }
            intervals.push(interval);
        }

        let restricted = Self(intervals).intersect(base);
        if restricted.is_empty() {
            return Err(format!("'{expr}' does not intersect the base range {base}"));
        }
        Ok(restricted)
    }

    /// Values present in both sets.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        for a in &self.0 {
            for b in &other.0 {
                if let Some(i) = a.intersect(b) {
                    out.push(i);
                }
            }
        }
        out.sort_by(|x, y| x.lo.partial_cmp(&y.lo).unwrap_or(std::cmp::Ordering::Equal));
        Self(out)
    }

    /// Returns true when no value is admitted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest admitted value.
    pub fn min(&self) -> Option<T> {
        self.0.first().map(|i| i.lo)
    }

    /// Highest admitted value.
    pub fn max(&self) -> Option<T> {
        self.0.last().map(|i| i.hi)
    }

    /// The intervals, ascending.
    pub fn intervals(&self) -> &[Interval<T>] {
        &self.0
    }

    /// Returns true when the set is a single interval.
    pub fn is_contiguous(&self) -> bool {
        self.0.len() == 1
    }
}

impl<T: Bound> fmt::Display for RangeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{interval}")?;
        }
        Ok(())
    }
}

/// Append `added` patterns to `base`, dropping exact duplicates.
///
/// # Errors
///
/// Fails when the same expression is required to match and required not to
/// match; no value can satisfy both.
pub fn merge_patterns(base: &[PatternSpec], added: &[PatternSpec]) -> Result<Vec<PatternSpec>, String> {
    let mut merged = base.to_vec();
    for pattern in added {
        if merged
            .iter()
            .any(|p| p.regex == pattern.regex && p.invert_match != pattern.invert_match)
        {
            return Err(format!(
                "pattern '{}' is both required and inverted in the derivation chain",
                pattern.regex
            ));
        }
        if !merged.contains(pattern) {
            merged.push(pattern.clone());
        }
    }
    Ok(merged)
}

/// Narrow an enumeration to `restriction`, which must name a subset of `base`.
/// Base descriptions are kept unless the restriction supplies its own.
///
/// # Errors
///
/// Fails when the restriction names a value the base does not define.
pub fn restrict_enums(base: &[EnumSpec], restriction: &[EnumSpec]) -> Result<Vec<EnumSpec>, String> {
    restriction
        .iter()
        .map(|r| {
            base.iter()
                .find(|b| b.name == r.name)
                .map(|b| EnumSpec {
                    name: r.name.clone(),
                    description: r.description.clone().or_else(|| b.description.clone()),
                })
                .ok_or_else(|| format!("enum '{}' is not defined by the base enumeration", r.name))
        })
        .collect()
}

/// Narrow a bits type to `restriction`, which must name a subset of `base`.
///
/// # Errors
///
/// Fails when the restriction names a bit the base does not define.
pub fn restrict_bits(base: &[String], restriction: &[String]) -> Result<Vec<String>, String> {
    restriction
        .iter()
        .map(|bit| {
            if base.contains(bit) {
                Ok(bit.clone())
            } else {
                Err(format!("bit '{bit}' is not defined by the base bits type"))
            }
        })
        .collect()
}

/// Anchor an XSD pattern for JSON Schema, whose `pattern` is unanchored.
pub fn anchored(regex: &str) -> String {
    format!("^(?:{regex})$")
}
