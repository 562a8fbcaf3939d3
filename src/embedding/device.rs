use candle_core::Device;
use tracing::debug;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::{info, warn};

use super::error::EmbeddingError;

/// Picks the compute device for the BERT embedder.
///
/// GPU backends are only tried when compiled in (`metal`, `cuda` features);
/// any failure falls back to CPU.
pub fn select_device() -> Result<Device, EmbeddingError> {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("embedding on Metal GPU");
            return Ok(device);
        }
        Err(e) => warn!(error = %e, "Metal device unavailable"),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("embedding on CUDA GPU");
            return Ok(device);
        }
        Err(e) => warn!(error = %e, "CUDA device unavailable"),
    }

    debug!(
        gpu_compiled = cfg!(any(feature = "metal", feature = "cuda")),
        "embedding on CPU"
    );
    Ok(Device::Cpu)
}
