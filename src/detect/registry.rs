use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::detect::model::{DetectionModel, Device};

/// Cache key: which model, on which device.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub model_id: String,
    pub device: Device,
}

impl ModelKey {
    pub fn new(model_id: impl Into<String>, device: Device) -> Self {
        Self {
            model_id: model_id.into(),
            device,
        }
    }
}

/// Explicit model cache, keyed by model identity and device.
///
/// Loading a model is expensive; the registry lets an owning service load
/// once and hand the same handle to every pipeline that needs it. Models
/// are wrapped in `Mutex` because inference takes `&mut self`. The handle
/// is the one resource pipelines may share.
pub struct ModelRegistry {
    models: HashMap<ModelKey, Arc<Mutex<dyn DetectionModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Fetch a cached model, or load it with `loader` and cache the result.
    pub fn get_or_load<M, F>(&mut self, key: ModelKey, loader: F) -> Result<Arc<Mutex<dyn DetectionModel>>>
    where
        M: DetectionModel + 'static,
        F: FnOnce() -> Result<M>,
    {
        if let Some(model) = self.models.get(&key) {
            log::info!("using cached model {} on {}", key.model_id, key.device);
            return Ok(model.clone());
        }

        log::info!("loading model {} on {}", key.model_id, key.device);
        let model: Arc<Mutex<dyn DetectionModel>> = Arc::new(Mutex::new(loader()?));
        self.models.insert(key, model.clone());
        Ok(model)
    }

    pub fn get(&self, key: &ModelKey) -> Option<Arc<Mutex<dyn DetectionModel>>> {
        self.models.get(key).cloned()
    }

    /// Drop every cached model handle.
    pub fn clear(&mut self) {
        self.models.clear();
        log::info!("model cache cleared");
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubModel;

    #[test]
    fn loader_runs_once_per_key() {
        let mut registry = ModelRegistry::new();
        let key = ModelKey::new("models/best.onnx", Device::Cpu);

        let mut loads = 0;
        for _ in 0..3 {
            registry
                .get_or_load(key.clone(), || {
                    loads += 1;
                    Ok(StubModel::empty())
                })
                .unwrap();
        }
        assert_eq!(loads, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_devices_are_distinct_entries() {
        let mut registry = ModelRegistry::new();
        registry
            .get_or_load(ModelKey::new("m", Device::Cpu), || {
                Ok(StubModel::empty())
            })
            .unwrap();
        registry
            .get_or_load(ModelKey::new("m", Device::Cuda), || {
                Ok(StubModel::empty())
            })
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut registry = ModelRegistry::new();
        registry
            .get_or_load(ModelKey::new("m", Device::Cpu), || {
                Ok(StubModel::empty())
            })
            .unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(&ModelKey::new("m", Device::Cpu)).is_none());
    }
}
