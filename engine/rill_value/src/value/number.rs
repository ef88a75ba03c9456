//! Numbers with units.
//!
//! A number carries an optional unit ("ms", "px"). Addition, subtraction and
//! comparison require compatible units; a unitless operand adopts the other
//! side's unit. Multiplication and division only scale by unitless operands
//! (no unit-product algebra), except that dividing equal units cancels them.

use std::cmp::Ordering;
use std::fmt;

use crate::exception::{division_by_zero, incompatible_units, Exception};
use crate::value::heap::Heap;

/// Number value: f64 magnitude plus optional unit.
#[derive(Clone, Debug)]
pub struct NumberValue {
    pub magnitude: f64,
    unit: Option<Heap<String>>,
}

impl NumberValue {
    /// Unitless number.
    pub fn new(magnitude: f64) -> Self {
        NumberValue {
            magnitude,
            unit: None,
        }
    }

    /// Number with a unit; an empty unit string means unitless.
    pub fn with_unit(magnitude: f64, unit: &str) -> Self {
        NumberValue {
            magnitude,
            unit: if unit.is_empty() {
                None
            } else {
                Some(Heap::new(unit.to_owned()))
            },
        }
    }

    /// Unit text; empty when unitless.
    pub fn unit(&self) -> &str {
        self.unit.as_ref().map_or("", |u| u.as_str())
    }

    pub fn is_unitless(&self) -> bool {
        self.unit.is_none()
    }

    fn same_magnitude_unit(&self, magnitude: f64) -> Self {
        NumberValue {
            magnitude,
            unit: self.unit.clone(),
        }
    }

    /// Join units for addition/subtraction/comparison: equal units keep the
    /// unit, a unitless side adopts the other's.
    fn join_units(&self, other: &NumberValue) -> Result<Option<Heap<String>>, Exception> {
        match (&self.unit, &other.unit) {
            (None, None) => Ok(None),
            (Some(u), None) | (None, Some(u)) => Ok(Some(u.clone())),
            (Some(a), Some(b)) if **a == **b => Ok(Some(a.clone())),
            (Some(a), Some(b)) => Err(incompatible_units(a.as_str(), b.as_str())),
        }
    }

    pub fn try_add(&self, other: &NumberValue) -> Result<NumberValue, Exception> {
        let unit = self.join_units(other)?;
        Ok(NumberValue {
            magnitude: self.magnitude + other.magnitude,
            unit,
        })
    }

    pub fn try_sub(&self, other: &NumberValue) -> Result<NumberValue, Exception> {
        let unit = self.join_units(other)?;
        Ok(NumberValue {
            magnitude: self.magnitude - other.magnitude,
            unit,
        })
    }

    pub fn try_mul(&self, other: &NumberValue) -> Result<NumberValue, Exception> {
        let unit = match (&self.unit, &other.unit) {
            (None, None) => None,
            (Some(u), None) | (None, Some(u)) => Some(u.clone()),
            (Some(a), Some(b)) => return Err(incompatible_units(a.as_str(), b.as_str())),
        };
        Ok(NumberValue {
            magnitude: self.magnitude * other.magnitude,
            unit,
        })
    }

    pub fn try_div(&self, other: &NumberValue) -> Result<NumberValue, Exception> {
        if other.magnitude == 0.0 {
            return Err(division_by_zero());
        }
        let unit = match (&self.unit, &other.unit) {
            (_, None) => self.unit.clone(),
            // Equal units cancel to a plain ratio.
            (Some(a), Some(b)) if **a == **b => None,
            (_, Some(b)) => {
                return Err(incompatible_units(self.unit(), b.as_str()));
            }
        };
        Ok(NumberValue {
            magnitude: self.magnitude / other.magnitude,
            unit,
        })
    }

    pub fn try_rem(&self, other: &NumberValue) -> Result<NumberValue, Exception> {
        if other.magnitude == 0.0 {
            return Err(division_by_zero());
        }
        let unit = self.join_units(other)?;
        Ok(NumberValue {
            magnitude: self.magnitude % other.magnitude,
            unit,
        })
    }

    pub fn neg(&self) -> NumberValue {
        self.same_magnitude_unit(-self.magnitude)
    }

    /// Unit-checked comparison.
    pub fn try_compare(&self, other: &NumberValue) -> Result<Ordering, Exception> {
        self.join_units(other)?;
        Ok(self
            .magnitude
            .partial_cmp(&other.magnitude)
            .unwrap_or(Ordering::Equal))
    }
}

impl PartialEq for NumberValue {
    fn eq(&self, other: &Self) -> bool {
        self.magnitude == other.magnitude && self.unit() == other.unit()
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.magnitude.fract() == 0.0 && self.magnitude.abs() < 9.0e15 {
            write!(f, "{}", self.magnitude as i64)?;
        } else {
            write!(f, "{}", self.magnitude)?;
        }
        write!(f, "{}", self.unit())
    }
}
