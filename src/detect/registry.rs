use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;
use super::backends::{StubBackend, SyntheticFaceBackend};
use super::service::ThreadedService;

/// Name-keyed detector backends.
///
/// Backends are shared as `Arc<Mutex<..>>` because `DetectorBackend::detect`
/// takes `&mut self` and runs on the service's detector thread.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry holding `synthetic` and `stub`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SyntheticFaceBackend::new());
        registry.register(StubBackend::new());
        registry
    }

    /// Register a backend under its own name, replacing any earlier one.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        self.backends
            .insert(backend.name().to_string(), Arc::new(Mutex::new(backend)));
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Start an asynchronous detection service for the named backend.
    pub fn service(&self, name: &str) -> Result<ThreadedService> {
        let backend = self.backends.get(name).cloned().ok_or_else(|| {
            anyhow!(
                "backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })?;
        ThreadedService::spawn(backend)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectionService;

    #[test]
    fn builtin_backends_are_listed_by_name() {
        let registry = BackendRegistry::with_builtin();
        assert_eq!(registry.list(), vec!["stub", "synthetic"]);
    }

    #[test]
    fn registering_same_name_replaces_backend() {
        let mut registry = BackendRegistry::with_builtin();
        registry.register(SyntheticFaceBackend::new().with_failure_every(2));
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let registry = BackendRegistry::new();
        let err = match registry.service("tflite") {
            Ok(_) => panic!("unknown backend started"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("tflite"));
    }

    #[test]
    fn service_uses_backend_name() {
        let registry = BackendRegistry::with_builtin();
        let service = registry.service("stub").unwrap();
        assert_eq!(service.name(), "stub");
    }
}
