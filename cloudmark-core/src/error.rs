use cloudmark_data::DataError;
use cloudmark_gpu::GpuError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PointCloudError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("Segmentation is not enabled for this point cloud")]
    SegmentationDisabled,

    #[error("Label {0} is not a defined class")]
    UnknownLabel(u32),

    #[error("Point {point} is out of range for a cloud of {len} points")]
    PointOutOfRange { point: usize, len: usize },

    #[error("GPU buffers have not been created")]
    BuffersNotCreated,
}

impl From<cloudmark_gpu::BufferBuildError> for PointCloudError {
    fn from(error: cloudmark_gpu::BufferBuildError) -> Self {
        PointCloudError::Gpu(error.into())
    }
}

pub type Result<T, E = PointCloudError> = std::result::Result<T, E>;
