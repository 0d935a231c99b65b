use blend_optimizer::{
    BlendConfig, BlendIndex, BlendOptimizer, Grade, QualitySpec,
};

fn main() {
    // Three candidate crudes with dated assays
    let grades = vec![
        Grade::new("light_sweet", 72.0, 40_000.0)
            .with_quality("sulfur", 0.4)
            .with_quality("api", 38.0)
            .with_quality("rvp", 7.5),
        Grade::new("medium", 64.0, 60_000.0)
            .with_quality("sulfur", 1.4)
            .with_quality("api", 31.0)
            .with_quality("rvp", 6.0),
        Grade::new("heavy_sour", 55.0, 80_000.0)
            .with_quality("sulfur", 3.2)
            .with_quality("api", 22.0)
            .with_quality("rvp", 4.5),
    ];

    // Product window: low-sulfur blend, mid API, bounded vapor pressure
    let specs = vec![
        QualitySpec::weight("sulfur", 0.0, 1.5),
        QualitySpec::volume("api", 28.0, 40.0).with_index(BlendIndex::ApiGravity),
        QualitySpec::volume("rvp", 0.0, 7.0).with_index(BlendIndex::Rvp),
    ];

    let mut config = BlendConfig::new(100_000.0, 76.0);
    config.min_volume_bbl = 60_000.0;

    let optimizer = BlendOptimizer::new(config.clone());
    let solution = match optimizer.optimize(&grades, &specs) {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("No blend: {}", e);
            return;
        }
    };

    // Print results
    println!("Blend Recipe");
    println!("============");
    println!("Tank: {:.0} bbl capacity", config.tank_capacity_bbl);
    println!("Blended: {:.1} bbl", solution.total_volume_bbl);
    println!(
        "Profit: ${:.2} (${:.2}/bbl)",
        solution.profit, solution.profit_per_bbl
    );
    println!();

    println!("Grades:");
    for allocation in &solution.allocations {
        println!(
            "  {}: {:.1} bbl ({:.1}%) @ ${:.2}/bbl",
            allocation.grade_id,
            allocation.volume_bbl,
            100.0 * allocation.ratio,
            allocation.price_per_bbl
        );
    }
    println!();

    println!("Qualities:");
    for quality in &solution.qualities {
        println!(
            "  {}: {:.3} (bounds {:.3} to {:.3})",
            quality.name, quality.value, quality.lower, quality.upper
        );
    }
}
