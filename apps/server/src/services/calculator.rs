//! Environmental indicator calculation.
//!
//! `compute` never fails. Layers with an incomplete match contribute zero.

use crate::models::{Coefficients, Indicators};

/// Indicators of `volume` m³ of a material with `density` kg/m³.
///
/// Returns zeros when the volume or density is not a positive number, or the
/// coefficients are missing or not finite.
pub fn compute(volume: f64, density: f64, coefficients: Option<&Coefficients>) -> Indicators {
    let Some(c) = coefficients.filter(|c| c.is_numeric()) else {
        return Indicators::ZERO;
    };
    if !(is_positive(volume) && is_positive(density)) {
        return Indicators::ZERO;
    }

    let mass = volume * density;
    Indicators {
        gwp: mass * c.gwp,
        ubp: mass * c.ubp,
        penre: mass * c.penre,
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Mass in kg, 0 for unusable inputs.
pub fn mass(volume: f64, density: Option<f64>) -> f64 {
    match density {
        Some(d) if is_positive(d) && is_positive(volume) => volume * d,
        _ => 0.0,
    }
}

/// One material layer ready for calculation.
#[derive(Debug, Clone, Copy)]
pub struct LayerInput {
    pub volume: f64,
    pub density: Option<f64>,
    pub coefficients: Option<Coefficients>,
}

impl LayerInput {
    pub fn indicators(&self) -> Indicators {
        match self.density {
            Some(density) => compute(self.volume, density, self.coefficients.as_ref()),
            None => Indicators::ZERO,
        }
    }
}

/// Element indicators: the sum over its material layers.
pub fn element_indicators<'a, I>(layers: I) -> Indicators
where
    I: IntoIterator<Item = &'a LayerInput>,
{
    layers.into_iter().map(LayerInput::indicators).sum()
}
