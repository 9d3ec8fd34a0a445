use crate::builder::BufferBuildError;
use crate::pipeline::PipelineBuildError;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("{what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("GPU resource failure: {0}")]
    GpuResourceFailure(#[from] BufferBuildError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineBuildError),
    #[error("{0} missing from resource registry")]
    MissingResource(&'static str),
}
