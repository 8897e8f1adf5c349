mod backends;
mod model;
mod registry;
mod result;

pub use backends::StubModel;
#[cfg(feature = "backend-tract")]
pub use backends::TractModel;
pub use model::{DetectionModel, Device, InferenceOptions};
pub use registry::{ModelKey, ModelRegistry};
pub use result::{Detection, DetectionBuckets, DetectionClass, DetectionSnapshot, RawDetection};
