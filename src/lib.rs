pub mod data_loader;
pub mod error;
mod extract;
pub mod indices;
pub mod models;
pub mod optimizer;
pub mod report;

pub use error::BlendError;
pub use indices::BlendIndex;
pub use models::{
    BlendConfig, BlendSolution, BlendedQuality, Grade, GradeAllocation, QualityBasis, QualitySpec,
};
pub use optimizer::BlendOptimizer;
