use crate::error::BlendError;
use crate::extract;
use crate::models::{BlendConfig, BlendSolution, Grade, QualityBasis, QualitySpec};
use good_lp::{
    default_solver, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};
use log::{debug, info};

/// Builds the blend MIP and hands it to the solver.
///
/// Decision variables are a continuous volume per grade plus a binary
/// selection indicator per grade; constraints cover throughput, per-quality
/// blending bounds, the component-count cap, and the volume/indicator
/// linking rows.
pub struct BlendOptimizer {
    config: BlendConfig,
}

impl BlendOptimizer {
    pub fn new(config: BlendConfig) -> Self {
        Self { config }
    }

    /// Solve for the most profitable blend of the candidate grades.
    pub fn optimize(
        &self,
        grades: &[Grade],
        specs: &[QualitySpec],
    ) -> Result<BlendSolution, BlendError> {
        self.validate(grades, specs)?;

        // Specific gravity is only needed when a quality blends by weight.
        let gravities = if specs.iter().any(|s| s.basis == QualityBasis::Weight) {
            grades
                .iter()
                .map(|g| g.specific_gravity())
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![1.0; grades.len()]
        };

        let mut vars = variables!();
        let mut volume: Vec<Variable> = Vec::with_capacity(grades.len());
        let mut select: Vec<Variable> = Vec::with_capacity(grades.len());
        let mut objective = Expression::with_capacity(grades.len());

        for grade in grades {
            let v = vars.add(variable().min(0.0).max(grade.max_supply_bbl));
            objective.add_mul(self.config.sale_price_per_bbl - grade.price_per_bbl, v);
            volume.push(v);
            select.push(vars.add(variable().binary()));
        }

        let mut problem = vars.maximise(objective).using(default_solver);
        problem.set_parameter("log", "0");
        if let Some(secs) = self.config.solver_time_limit_secs {
            problem.set_parameter("seconds", &secs.to_string());
        }

        // Throughput: min_volume <= total <= tank capacity
        let mut total = Expression::with_capacity(grades.len());
        for &v in &volume {
            total.add_mul(1.0, v);
        }
        problem = problem.with(total.clone().leq(self.config.tank_capacity_bbl));
        problem = problem.with(total.geq(self.config.min_volume_bbl));

        // Quality bounds, linearized around each bound so the rows stay
        // linear in volume: sum_g w_g * vol_g * (q_g - bound) vs 0
        for spec in specs {
            let (lower, upper) = spec.indexed_bounds();
            let mut upper_row = Expression::with_capacity(grades.len());
            let mut lower_row = Expression::with_capacity(grades.len());
            for ((grade, &v), &sg) in grades.iter().zip(&volume).zip(&gravities) {
                let raw = grade
                    .quality(&spec.name)
                    .ok_or_else(|| BlendError::MissingQuality {
                        grade: grade.id.clone(),
                        quality: spec.name.clone(),
                    })?;
                let q = spec.indexed_value(raw);
                let w = match spec.basis {
                    QualityBasis::Volume => 1.0,
                    QualityBasis::Weight => sg,
                };
                upper_row.add_mul(w * (q - upper), v);
                lower_row.add_mul(w * (q - lower), v);
            }
            problem = problem.with(upper_row.leq(0.0));
            problem = problem.with(lower_row.geq(0.0));
        }

        // Cardinality: at most max_components grades in the blend
        let mut picked = Expression::with_capacity(grades.len());
        for &s in &select {
            picked.add_mul(1.0, s);
        }
        problem = problem.with(picked.leq(self.config.max_components as f64));

        // Linking rows: an unselected grade contributes nothing, and a
        // selected grade commits to at least its minimum parcel
        for ((grade, &v), &s) in grades.iter().zip(&volume).zip(&select) {
            problem = problem.with((v - grade.max_supply_bbl * s).leq(0.0));
            if grade.min_supply_bbl > 0.0 {
                problem = problem.with((v - grade.min_supply_bbl * s).geq(0.0));
            }
        }

        info!(
            "Solving blend model: {} grades, {} qualities",
            grades.len(),
            specs.len()
        );

        let solution = problem.solve().map_err(|e| match e {
            ResolutionError::Infeasible => BlendError::Infeasible,
            ResolutionError::Unbounded => BlendError::Unbounded,
            other => BlendError::Solver(other.to_string()),
        })?;

        let volumes: Vec<f64> = volume.iter().map(|&v| solution.value(v)).collect();
        debug!("Solved volumes: {:?}", volumes);

        extract::build_solution(&self.config, grades, specs, &gravities, &volumes)
    }

    fn validate(&self, grades: &[Grade], specs: &[QualitySpec]) -> Result<(), BlendError> {
        if grades.is_empty() {
            return Err(BlendError::NoGrades);
        }
        for spec in specs {
            if spec.lower > spec.upper {
                return Err(BlendError::InvertedBounds {
                    quality: spec.name.clone(),
                    lower: spec.lower,
                    upper: spec.upper,
                });
            }
        }
        for grade in grades {
            if grade.min_supply_bbl > grade.max_supply_bbl {
                return Err(BlendError::InvertedSupply {
                    grade: grade.id.clone(),
                    min: grade.min_supply_bbl,
                    max: grade.max_supply_bbl,
                });
            }
            for spec in specs {
                let raw = grade
                    .quality(&spec.name)
                    .ok_or_else(|| BlendError::MissingQuality {
                        grade: grade.id.clone(),
                        quality: spec.name.clone(),
                    })?;
                if let Some(index) = spec.index {
                    if !index.domain_ok(raw) {
                        return Err(BlendError::IndexDomain {
                            grade: grade.id.clone(),
                            quality: spec.name.clone(),
                            value: raw,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VOLUME_TOLERANCE_BBL;

    fn sweet_grade(id: &str, price: f64, sulfur: f64) -> Grade {
        Grade::new(id, price, 50_000.0)
            .with_quality("sulfur", sulfur)
            .with_quality("sg", 0.85)
    }

    #[test]
    fn test_feasible_blend_respects_all_bounds() {
        let grades = vec![
            sweet_grade("a", 60.0, 0.4),
            sweet_grade("b", 55.0, 1.2),
            sweet_grade("c", 65.0, 0.2),
            sweet_grade("d", 58.0, 0.9),
        ];
        let specs = vec![QualitySpec::volume("sulfur", 0.0, 0.8)];
        let mut config = BlendConfig::new(100_000.0, 70.0);
        config.min_volume_bbl = 40_000.0;
        let optimizer = BlendOptimizer::new(config.clone());

        let solution = optimizer.optimize(&grades, &specs).unwrap();

        for allocation in &solution.allocations {
            let grade = grades.iter().find(|g| g.id == allocation.grade_id).unwrap();
            assert!(allocation.volume_bbl >= -VOLUME_TOLERANCE_BBL);
            assert!(allocation.volume_bbl <= grade.max_supply_bbl + 1e-4);
            // reported allocations are the selected grades
            assert!(allocation.volume_bbl > VOLUME_TOLERANCE_BBL);
        }
        assert!(solution.allocations.len() <= config.max_components);
        assert!(solution.total_volume_bbl >= config.min_volume_bbl - 1e-4);
        assert!(solution.total_volume_bbl <= config.tank_capacity_bbl + 1e-4);
        let sulfur = solution.quality("sulfur").unwrap();
        assert!(sulfur.within_bounds(1e-4));
    }

    #[test]
    fn test_forced_high_sulfur_mix_is_infeasible() {
        // 100 bbl of each grade is forced in; the 50/50 blend averages
        // 1.25 sulfur against an upper bound of 1.0
        let grades = vec![
            Grade::new("a", 60.0, 100.0)
                .with_min_supply(100.0)
                .with_quality("sulfur", 0.5),
            Grade::new("b", 55.0, 100.0)
                .with_min_supply(100.0)
                .with_quality("sulfur", 2.0),
        ];
        let specs = vec![QualitySpec::volume("sulfur", 0.0, 1.0)];
        let mut config = BlendConfig::new(1_000.0, 70.0);
        config.min_volume_bbl = 200.0;
        config.max_components = 2;
        let optimizer = BlendOptimizer::new(config);

        let result = optimizer.optimize(&grades, &specs);
        assert!(matches!(result, Err(BlendError::Infeasible)));
    }

    #[test]
    fn test_selects_cheapest_grades_up_to_capacity() {
        // All grades profitable, no quality constraints: the optimizer
        // should fill the tank from the cheapest max_components grades
        let grades = vec![
            Grade::new("cheap_1", 50.0, 40_000.0),
            Grade::new("cheap_2", 52.0, 40_000.0),
            Grade::new("cheap_3", 54.0, 40_000.0),
            Grade::new("pricey_1", 65.0, 40_000.0),
            Grade::new("pricey_2", 68.0, 40_000.0),
        ];
        let config = BlendConfig::new(100_000.0, 70.0);
        let optimizer = BlendOptimizer::new(config.clone());

        let solution = optimizer.optimize(&grades, &[]).unwrap();

        let mut selected = solution.selected_grades();
        selected.sort();
        assert_eq!(selected, vec!["cheap_1", "cheap_2", "cheap_3"]);
        assert!((solution.total_volume_bbl - 100_000.0).abs() < 1e-3);
        // cheapest two fill their supply; the third takes the remainder
        assert!((solution.allocation("cheap_1").unwrap().volume_bbl - 40_000.0).abs() < 1e-3);
        assert!((solution.allocation("cheap_2").unwrap().volume_bbl - 40_000.0).abs() < 1e-3);
        assert!((solution.allocation("cheap_3").unwrap().volume_bbl - 20_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_cardinality_cap_binds() {
        let grades: Vec<Grade> = (0..6)
            .map(|i| Grade::new(&format!("g{}", i), 50.0 + i as f64, 10_000.0))
            .collect();
        let mut config = BlendConfig::new(100_000.0, 70.0);
        config.max_components = 2;
        let optimizer = BlendOptimizer::new(config);

        let solution = optimizer.optimize(&grades, &[]).unwrap();

        assert_eq!(solution.allocations.len(), 2);
        assert!((solution.total_volume_bbl - 20_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_minimum_parcel_commits_selected_grades() {
        // The cheap grade only sells in parcels of at least 30k bbl; with a
        // 25k tank it cannot participate at all
        let grades = vec![
            Grade::new("bulk_only", 50.0, 60_000.0).with_min_supply(30_000.0),
            Grade::new("flexible", 55.0, 60_000.0),
        ];
        let config = BlendConfig::new(25_000.0, 70.0);
        let optimizer = BlendOptimizer::new(config);

        let solution = optimizer.optimize(&grades, &[]).unwrap();

        assert_eq!(solution.selected_grades(), vec!["flexible"]);
        assert!((solution.total_volume_bbl - 25_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_weight_basis_tightens_heavy_grade() {
        // Equal volumes, but the heavy grade dominates a weight-basis
        // average; the optimizer must shade toward the light grade to pass
        let grades = vec![
            Grade::new("heavy_sour", 50.0, 10_000.0)
                .with_quality("sulfur", 2.0)
                .with_quality("sg", 0.95),
            Grade::new("light_sweet", 60.0, 10_000.0)
                .with_quality("sulfur", 0.2)
                .with_quality("sg", 0.80),
        ];
        let specs = vec![QualitySpec::weight("sulfur", 0.0, 1.0)];
        let mut config = BlendConfig::new(15_000.0, 70.0);
        config.min_volume_bbl = 15_000.0;
        config.max_components = 2;
        let optimizer = BlendOptimizer::new(config);

        let solution = optimizer.optimize(&grades, &specs).unwrap();

        let sulfur = solution.quality("sulfur").unwrap();
        assert!(sulfur.within_bounds(1e-4));
        // the weight-weighted average must be reproducible from the parts
        let heavy = solution.allocation("heavy_sour").unwrap().volume_bbl;
        let light = solution.allocation("light_sweet").unwrap().volume_bbl;
        let expected = (0.95 * heavy * 2.0 + 0.80 * light * 0.2) / (0.95 * heavy + 0.80 * light);
        assert!((sulfur.value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_ratio_round_trip_reproduces_qualities() {
        let grades = vec![
            sweet_grade("a", 60.0, 0.4),
            sweet_grade("b", 58.0, 0.7),
            sweet_grade("c", 62.0, 0.3),
        ];
        let specs = vec![QualitySpec::volume("sulfur", 0.0, 0.8)];
        let mut config = BlendConfig::new(90_000.0, 70.0);
        config.min_volume_bbl = 60_000.0;
        let optimizer = BlendOptimizer::new(config);

        let solution = optimizer.optimize(&grades, &specs).unwrap();

        let reblended: f64 = solution
            .allocations
            .iter()
            .map(|a| {
                let grade = grades.iter().find(|g| g.id == a.grade_id).unwrap();
                a.ratio * grade.quality("sulfur").unwrap()
            })
            .sum();
        let reported = solution.quality("sulfur").unwrap().value;
        assert!((reblended - reported).abs() < 1e-9);

        let ratio_sum: f64 = solution.allocations.iter().map(|a| a.ratio).sum();
        assert!((ratio_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unprofitable_market_yields_degenerate_blend() {
        // Every grade costs more than the blend sells for; with no minimum
        // throughput the optimum is an empty tank, which is reported as a
        // distinct error instead of 0/0 ratios
        let grades = vec![sweet_grade("a", 80.0, 0.4), sweet_grade("b", 90.0, 0.5)];
        let config = BlendConfig::new(50_000.0, 70.0);
        let optimizer = BlendOptimizer::new(config);

        let result = optimizer.optimize(&grades, &[]);
        assert!(matches!(result, Err(BlendError::DegenerateBlend)));
    }

    #[test]
    fn test_missing_quality_fails_before_solve() {
        let grades = vec![
            sweet_grade("a", 60.0, 0.4),
            Grade::new("no_assay", 55.0, 10_000.0),
        ];
        let specs = vec![QualitySpec::volume("sulfur", 0.0, 0.8)];
        let optimizer = BlendOptimizer::new(BlendConfig::new(50_000.0, 70.0));

        let result = optimizer.optimize(&grades, &specs);
        assert!(matches!(
            result,
            Err(BlendError::MissingQuality { grade, quality })
                if grade == "no_assay" && quality == "sulfur"
        ));
    }

    #[test]
    fn test_no_grades_rejected() {
        let optimizer = BlendOptimizer::new(BlendConfig::new(50_000.0, 70.0));
        assert!(matches!(
            optimizer.optimize(&[], &[]),
            Err(BlendError::NoGrades)
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let grades = vec![sweet_grade("a", 60.0, 0.4)];
        let specs = vec![QualitySpec::volume("sulfur", 1.0, 0.5)];
        let optimizer = BlendOptimizer::new(BlendConfig::new(50_000.0, 70.0));
        assert!(matches!(
            optimizer.optimize(&grades, &specs),
            Err(BlendError::InvertedBounds { .. })
        ));
    }
}
