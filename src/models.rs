use crate::error::BlendError;
use crate::indices::BlendIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Volumes below this threshold are treated as zero when deciding whether a
/// grade made it into the blend.
pub const VOLUME_TOLERANCE_BBL: f64 = 1e-6;

/// How a quality averages when grades are mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityBasis {
    /// Weighted by barrel volume
    #[default]
    Volume,
    /// Weighted by mass (volume x specific gravity)
    Weight,
}

/// A bounded quality the blended product must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub basis: QualityBasis,
    /// Transform into linear blending space, if the quality needs one
    pub index: Option<BlendIndex>,
}

impl QualitySpec {
    pub fn volume(name: &str, lower: f64, upper: f64) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
            basis: QualityBasis::Volume,
            index: None,
        }
    }

    pub fn weight(name: &str, lower: f64, upper: f64) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
            basis: QualityBasis::Weight,
            index: None,
        }
    }

    pub fn with_index(mut self, index: BlendIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Transform a raw assay value into the space the model blends linearly.
    pub fn indexed_value(&self, raw: f64) -> f64 {
        match self.index {
            Some(ix) => ix.apply(raw),
            None => raw,
        }
    }

    /// Invert a blended index-space value back to natural units.
    pub fn natural_value(&self, indexed: f64) -> f64 {
        match self.index {
            Some(ix) => ix.invert(indexed),
            None => indexed,
        }
    }

    /// Bounds in index space, reordered if the transform reverses ordering.
    pub fn indexed_bounds(&self) -> (f64, f64) {
        match self.index {
            Some(ix) => {
                let a = ix.apply(self.lower);
                let b = ix.apply(self.upper);
                if ix.reverses_order() {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            None => (self.lower, self.upper),
        }
    }
}

/// One crude oil source: price, supply window, and assay values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub price_per_bbl: f64,
    #[serde(default)]
    pub min_supply_bbl: f64,
    pub max_supply_bbl: f64,
    #[serde(default)]
    pub assay_date: Option<NaiveDate>,
    pub qualities: HashMap<String, f64>,
}

impl Grade {
    pub fn new(id: &str, price_per_bbl: f64, max_supply_bbl: f64) -> Self {
        Self {
            id: id.to_string(),
            price_per_bbl,
            min_supply_bbl: 0.0,
            max_supply_bbl,
            assay_date: None,
            qualities: HashMap::new(),
        }
    }

    pub fn with_quality(mut self, name: &str, value: f64) -> Self {
        self.qualities.insert(name.to_string(), value);
        self
    }

    pub fn with_min_supply(mut self, min_supply_bbl: f64) -> Self {
        self.min_supply_bbl = min_supply_bbl;
        self
    }

    pub fn quality(&self, name: &str) -> Option<f64> {
        self.qualities.get(name).copied()
    }

    /// Specific gravity from the 'sg' assay value, or derived from 'api'.
    pub fn specific_gravity(&self) -> Result<f64, BlendError> {
        if let Some(sg) = self.quality("sg") {
            return Ok(sg);
        }
        if let Some(api) = self.quality("api") {
            return Ok(BlendIndex::ApiGravity.apply(api));
        }
        Err(BlendError::MissingSpecificGravity {
            grade: self.id.clone(),
        })
    }
}

/// Tank-level settings for one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendConfig {
    pub tank_capacity_bbl: f64,
    pub min_volume_bbl: f64,
    pub max_components: usize,
    pub sale_price_per_bbl: f64,
    #[serde(default)]
    pub solver_time_limit_secs: Option<f64>,
}

impl BlendConfig {
    pub fn new(tank_capacity_bbl: f64, sale_price_per_bbl: f64) -> Self {
        Self {
            tank_capacity_bbl,
            min_volume_bbl: 0.0,
            max_components: 3,
            sale_price_per_bbl,
            solver_time_limit_secs: None,
        }
    }
}

/// Volume assigned to one grade in the solved blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeAllocation {
    pub grade_id: String,
    pub volume_bbl: f64,
    pub ratio: f64,
    pub price_per_bbl: f64,
}

/// A blended quality value alongside its configured bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendedQuality {
    pub name: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub basis: QualityBasis,
}

impl BlendedQuality {
    pub fn within_bounds(&self, tolerance: f64) -> bool {
        self.value >= self.lower - tolerance && self.value <= self.upper + tolerance
    }
}

/// The solved blend recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendSolution {
    pub allocations: Vec<GradeAllocation>,
    pub total_volume_bbl: f64,
    pub profit: f64,
    pub profit_per_bbl: f64,
    pub qualities: Vec<BlendedQuality>,
}

impl BlendSolution {
    pub fn selected_grades(&self) -> Vec<&str> {
        self.allocations.iter().map(|a| a.grade_id.as_str()).collect()
    }

    pub fn allocation(&self, grade_id: &str) -> Option<&GradeAllocation> {
        self.allocations.iter().find(|a| a.grade_id == grade_id)
    }

    pub fn quality(&self, name: &str) -> Option<&BlendedQuality> {
        self.qualities.iter().find(|q| q.name == name)
    }
}
