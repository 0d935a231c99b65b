use serde::{Deserialize, Serialize};

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Transform applied to a quality so that blending is linear in index space.
///
/// Properties like vapor pressure or viscosity do not mix linearly by volume;
/// the industry workaround is to blend a transformed "index" value linearly
/// and convert the result back to natural units afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendIndex {
    /// Reid vapor pressure index: rvp^1.25
    Rvp,
    /// Pour point index from a pour point in degrees Fahrenheit
    PourPoint,
    /// Viscosity blending index: log10(log10(v + 0.8)), valid for v > 0.2
    Viscosity,
    /// API gravity to specific gravity: 141.5 / (131.5 + api)
    ApiGravity,
}

impl BlendIndex {
    /// Convert a natural-unit quality value into index space.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            BlendIndex::Rvp => value.powf(1.25),
            BlendIndex::PourPoint => {
                let celsius = fahrenheit_to_celsius(value);
                ((celsius + 273.15) / 283.15 * 100f64.powf(0.08)).powf(12.5)
            }
            BlendIndex::Viscosity => (value + 0.8).log10().log10(),
            BlendIndex::ApiGravity => 141.5 / (131.5 + value),
        }
    }

    /// Convert an index-space value back into natural units.
    pub fn invert(&self, index: f64) -> f64 {
        match self {
            BlendIndex::Rvp => index.powf(1.0 / 1.25),
            BlendIndex::PourPoint => {
                (283.15 * (index / 100.0).powf(0.08) - 273.15) * 1.8 + 32.0
            }
            BlendIndex::Viscosity => 10f64.powf(10f64.powf(index)) - 0.8,
            BlendIndex::ApiGravity => 141.5 / index - 131.5,
        }
    }

    /// Whether the transform accepts the given natural-unit value.
    pub fn domain_ok(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            BlendIndex::Rvp => value >= 0.0,
            // absolute zero in Fahrenheit
            BlendIndex::PourPoint => value > -459.67,
            BlendIndex::Viscosity => value > 0.2,
            BlendIndex::ApiGravity => value > -131.5,
        }
    }

    /// True when the transform reverses ordering (higher natural value maps
    /// to a lower index), in which case transformed bounds must be swapped.
    pub fn reverses_order(&self) -> bool {
        matches!(self, BlendIndex::ApiGravity)
    }
}
