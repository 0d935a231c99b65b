use thiserror::Error;

/// Failures surfaced by model construction, solving, and result extraction.
#[derive(Debug, Error)]
pub enum BlendError {
    #[error("no candidate grades to blend")]
    NoGrades,

    #[error("grade '{grade}' has no assay value for quality '{quality}'")]
    MissingQuality { grade: String, quality: String },

    #[error("grade '{grade}' has no specific gravity (provide an 'sg' or 'api' assay value)")]
    MissingSpecificGravity { grade: String },

    #[error("quality '{quality}' has inverted bounds ({lower} > {upper})")]
    InvertedBounds {
        quality: String,
        lower: f64,
        upper: f64,
    },

    #[error("grade '{grade}' has inverted supply bounds ({min} > {max})")]
    InvertedSupply { grade: String, min: f64, max: f64 },

    #[error("grade '{grade}' quality '{quality}' value {value} is outside the domain of its blend index")]
    IndexDomain {
        grade: String,
        quality: String,
        value: f64,
    },

    #[error("no feasible blend satisfies the quality and throughput constraints")]
    Infeasible,

    #[error("the blend model is unbounded; check supply caps and tank capacity")]
    Unbounded,

    #[error("solver failed: {0}")]
    Solver(String),

    #[error("optimal blend has zero volume; ratios and per-barrel profit are undefined")]
    DegenerateBlend,
}
