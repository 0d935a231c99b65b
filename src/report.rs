use crate::models::{BlendConfig, BlendSolution, QualityBasis};

const BOUNDS_DISPLAY_TOLERANCE: f64 = 1e-6;

/// Machine-readable report.
pub fn render_json(solution: &BlendSolution) -> serde_json::Result<String> {
    serde_json::to_string_pretty(solution)
}

/// One CSV row per selected grade.
pub fn render_csv(solution: &BlendSolution) -> String {
    let mut out = String::from("grade,volume_bbl,ratio,price_per_bbl\n");
    for allocation in &solution.allocations {
        out.push_str(&format!(
            "{},{:.1},{:.4},{:.2}\n",
            allocation.grade_id,
            allocation.volume_bbl,
            allocation.ratio,
            allocation.price_per_bbl
        ));
    }
    out
}

/// Human-readable summary block.
pub fn render_summary(solution: &BlendSolution, config: &BlendConfig) -> String {
    let mut out = String::new();
    out.push_str("Blend Optimization Summary\n");
    out.push_str("==========================\n");
    out.push_str(&format!("Tank capacity: {:.1} bbl\n", config.tank_capacity_bbl));
    out.push_str(&format!(
        "Blend volume: {:.1} bbl ({:.1}% of capacity)\n",
        solution.total_volume_bbl,
        100.0 * solution.total_volume_bbl / config.tank_capacity_bbl
    ));
    out.push_str(&format!("Sale price: ${:.2}/bbl\n", config.sale_price_per_bbl));
    out.push_str(&format!(
        "Profit: ${:.2} (${:.2}/bbl)\n",
        solution.profit, solution.profit_per_bbl
    ));
    out.push('\n');

    out.push_str("Selected grades:\n");
    for allocation in &solution.allocations {
        out.push_str(&format!(
            "  {}: {:.1} bbl ({:.2}%) @ ${:.2}/bbl\n",
            allocation.grade_id,
            allocation.volume_bbl,
            100.0 * allocation.ratio,
            allocation.price_per_bbl
        ));
    }

    if !solution.qualities.is_empty() {
        out.push('\n');
        out.push_str("Blend qualities:\n");
        for quality in &solution.qualities {
            let basis = match quality.basis {
                QualityBasis::Volume => "volume",
                QualityBasis::Weight => "weight",
            };
            let status = if quality.within_bounds(BOUNDS_DISPLAY_TOLERANCE) {
                "ok"
            } else {
                "OUT OF BOUNDS"
            };
            out.push_str(&format!(
                "  {} ({} basis): {:.4} in [{:.4}, {:.4}] {}\n",
                quality.name, basis, quality.value, quality.lower, quality.upper, status
            ));
        }
    }

    out
}
