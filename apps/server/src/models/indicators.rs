//! Environmental indicator value types.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use utoipa::ToSchema;

/// Per-kg impact coefficients of a reference material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coefficients {
    /// kg CO₂-eq per kg
    pub gwp: f64,
    /// UBP per kg
    pub ubp: f64,
    /// kWh oil-eq per kg
    pub penre: f64,
}

impl Coefficients {
    /// All three coefficients are finite numbers.
    pub fn is_numeric(&self) -> bool {
        self.gwp.is_finite() && self.ubp.is_finite() && self.penre.is_finite()
    }
}

/// GWP, UBP and PENRE totals for an element, material or project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Indicators {
    pub gwp: f64,
    pub ubp: f64,
    pub penre: f64,
}

impl Indicators {
    pub const ZERO: Indicators = Indicators {
        gwp: 0.0,
        ubp: 0.0,
        penre: 0.0,
    };

    pub fn new(gwp: f64, ubp: f64, penre: f64) -> Self {
        Self { gwp, ubp, penre }
    }

    pub fn is_zero(&self) -> bool {
        self.gwp == 0.0 && self.ubp == 0.0 && self.penre == 0.0
    }
}

impl Add for Indicators {
    type Output = Indicators;

    fn add(self, rhs: Self) -> Self::Output {
        Indicators {
            gwp: self.gwp + rhs.gwp,
            ubp: self.ubp + rhs.ubp,
            penre: self.penre + rhs.penre,
        }
    }
}

impl AddAssign for Indicators {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Indicators {
    fn sum<I: Iterator<Item = Indicators>>(iter: I) -> Self {
        iter.fold(Indicators::ZERO, Add::add)
    }
}
