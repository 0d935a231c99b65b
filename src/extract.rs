use crate::error::BlendError;
use crate::models::{
    BlendConfig, BlendSolution, BlendedQuality, Grade, GradeAllocation, QualityBasis, QualitySpec,
    VOLUME_TOLERANCE_BBL,
};
use log::warn;

/// Turn solved per-grade volumes into the reporting model.
///
/// A grade counts as selected when its volume clears the tolerance; the
/// indicator variable itself may sit at 1 on a zero-volume grade without
/// affecting the recipe.
pub(crate) fn build_solution(
    config: &BlendConfig,
    grades: &[Grade],
    specs: &[QualitySpec],
    gravities: &[f64],
    volumes: &[f64],
) -> Result<BlendSolution, BlendError> {
    let total_volume_bbl: f64 = volumes.iter().sum();
    if total_volume_bbl <= VOLUME_TOLERANCE_BBL {
        return Err(BlendError::DegenerateBlend);
    }

    let mut allocations: Vec<GradeAllocation> = grades
        .iter()
        .zip(volumes)
        .filter(|(_, &v)| v > VOLUME_TOLERANCE_BBL)
        .map(|(grade, &v)| GradeAllocation {
            grade_id: grade.id.clone(),
            volume_bbl: v,
            ratio: v / total_volume_bbl,
            price_per_bbl: grade.price_per_bbl,
        })
        .collect();
    allocations.sort_by(|a, b| b.volume_bbl.partial_cmp(&a.volume_bbl).unwrap());

    let profit: f64 = grades
        .iter()
        .zip(volumes)
        .map(|(grade, &v)| (config.sale_price_per_bbl - grade.price_per_bbl) * v)
        .sum();

    let mut qualities = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for ((grade, &v), &sg) in grades.iter().zip(volumes).zip(gravities) {
            let raw = grade
                .quality(&spec.name)
                .ok_or_else(|| BlendError::MissingQuality {
                    grade: grade.id.clone(),
                    quality: spec.name.clone(),
                })?;
            let w = match spec.basis {
                QualityBasis::Volume => 1.0,
                QualityBasis::Weight => sg,
            };
            numerator += w * v * spec.indexed_value(raw);
            denominator += w * v;
        }
        if denominator <= VOLUME_TOLERANCE_BBL {
            return Err(BlendError::DegenerateBlend);
        }
        let quality = BlendedQuality {
            name: spec.name.clone(),
            value: spec.natural_value(numerator / denominator),
            lower: spec.lower,
            upper: spec.upper,
            basis: spec.basis,
        };
        if !quality.within_bounds(1e-4) {
            warn!(
                "blended {} = {} drifted outside [{}, {}]",
                quality.name, quality.value, quality.lower, quality.upper
            );
        }
        qualities.push(quality);
    }

    Ok(BlendSolution {
        allocations,
        total_volume_bbl,
        profit,
        profit_per_bbl: profit / total_volume_bbl,
        qualities,
    })
}
