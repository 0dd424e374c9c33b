//! # Method Registry
//!
//! Maps (model, method) keys to their descriptors, and layer identities to
//! layers. The registry is written during bootstrap, then frozen and only
//! read from. Any declaration after `freeze` is refused.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::descriptor::{MethodDescriptor, MethodKey};
use super::errors::{MethodError, MethodResult};
use super::layer::{Callable, IntoMethod, Layer, LayerHandle, LayerId};
use super::signature::Signature;
use crate::config::OrmConfig;
use crate::observability::{log_event_with_fields, DispatchMetrics, Event};

#[derive(Debug, Default)]
struct RegistryState {
    /// Descriptors by method key
    methods: HashMap<MethodKey, Arc<MethodDescriptor>>,

    /// Layers by identity
    layers: HashMap<LayerId, Arc<Layer>>,

    /// Last layer id handed out
    last_layer_id: u64,

    /// Bootstrap finished
    done: bool,
}

/// Registry of layered model methods
#[derive(Debug)]
pub struct MethodRegistry {
    state: RwLock<RegistryState>,
    max_call_depth: usize,
    trace_dispatch: bool,
    metrics: DispatchMetrics,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        let config = OrmConfig::default();
        Self::with_settings(config.max_call_depth, config.trace_dispatch)
    }
}

impl MethodRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry using the dispatch settings of `config`
    pub fn with_config(config: &OrmConfig) -> MethodResult<Self> {
        config.validate()?;
        Ok(Self::with_settings(config.max_call_depth, config.trace_dispatch))
    }

    fn with_settings(max_call_depth: usize, trace_dispatch: bool) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            max_call_depth,
            trace_dispatch,
            metrics: DispatchMetrics::new(),
        }
    }

    /// Declare all modules in order, then freeze the registry.
    ///
    /// The configuration is validated first. The first failing declaration
    /// aborts the bootstrap.
    pub fn bootstrap(config: &OrmConfig, modules: &[&dyn Module]) -> MethodResult<Arc<Self>> {
        let registry = match Self::with_config(config) {
            Ok(registry) => registry,
            Err(err) => {
                log_event_with_fields(
                    Event::BootstrapFailed,
                    &[("code", err.code()), ("error", err.to_string().as_str())],
                );
                return Err(err);
            }
        };
        config.apply_logging();

        let module_count = modules.len().to_string();
        log_event_with_fields(Event::BootstrapStart, &[("modules", module_count.as_str())]);

        for module in modules {
            if let Err(err) = module.declare(&registry) {
                log_event_with_fields(
                    Event::BootstrapFailed,
                    &[
                        ("code", err.code()),
                        ("error", err.to_string().as_str()),
                        ("module", module.name()),
                    ],
                );
                return Err(err);
            }
            log_event_with_fields(Event::ModuleLoaded, &[("module", module.name())]);
        }

        registry.freeze()?;

        let method_count = registry.len()?.to_string();
        log_event_with_fields(Event::BootstrapComplete, &[("methods", method_count.as_str())]);

        Ok(Arc::new(registry))
    }

    fn read_state(&self) -> MethodResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| MethodError::Internal("Lock poisoned".into()))
    }

    fn write_state(&self) -> MethodResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_| MethodError::Internal("Lock poisoned".into()))
    }

    /// Declare `method` as the new top layer of `model.name`.
    ///
    /// The first declaration fixes the signature every later layer of the
    /// same method must have.
    pub fn declare_method<M, F>(
        &self,
        model: &str,
        name: &str,
        method: F,
    ) -> MethodResult<LayerHandle>
    where
        F: IntoMethod<M>,
    {
        let (signature, callable) = method.into_method();
        self.declare_raw(model, name, signature, callable)
    }

    /// Declare an already erased implementation with an explicit signature
    pub fn declare_raw(
        &self,
        model: &str,
        name: &str,
        signature: Signature,
        callable: Callable,
    ) -> MethodResult<LayerHandle> {
        let key = MethodKey::new(model, name);
        match self.insert_layer(key.clone(), signature, callable) {
            Ok((handle, depth)) => {
                self.metrics.increment_declarations();
                log_event_with_fields(
                    Event::MethodDeclared,
                    &[
                        ("layer", handle.id().to_string().as_str()),
                        ("layers", depth.to_string().as_str()),
                        ("method", key.to_string().as_str()),
                    ],
                );
                Ok(handle)
            }
            Err(err) => {
                self.metrics.increment_declarations_rejected();
                log_event_with_fields(
                    Event::MethodDeclareRejected,
                    &[
                        ("code", err.code()),
                        ("error", err.to_string().as_str()),
                        ("method", key.to_string().as_str()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn insert_layer(
        &self,
        key: MethodKey,
        signature: Signature,
        callable: Callable,
    ) -> MethodResult<(LayerHandle, usize)> {
        let mut guard = self.write_state()?;
        let state = &mut *guard;
        if state.done {
            return Err(MethodError::RegistryFrozen(key.to_string()));
        }
        signature.validate_receiver()?;

        let id = LayerId::new(state.last_layer_id + 1);
        let layer = Arc::new(Layer::new(id, key.clone(), signature, callable));

        let depth = match state.methods.get_mut(&key) {
            Some(descriptor) => {
                // Copy-on-write keeps descriptors handed out earlier intact.
                let descriptor = Arc::make_mut(descriptor);
                descriptor.push_layer(Arc::clone(&layer))?;
                descriptor.layer_count()
            }
            None => {
                state
                    .methods
                    .insert(key, Arc::new(MethodDescriptor::new(Arc::clone(&layer))));
                1
            }
        };

        state.last_layer_id = id.as_u64();
        state.layers.insert(id, layer);
        Ok((LayerHandle(id), depth))
    }

    /// Switch the registry to read-only. Idempotent.
    pub fn freeze(&self) -> MethodResult<()> {
        let (methods, layers) = {
            let mut state = self.write_state()?;
            if state.done {
                return Ok(());
            }
            state.done = true;
            (state.methods.len(), state.layers.len())
        };

        log_event_with_fields(
            Event::RegistryFrozen,
            &[
                ("layers", layers.to_string().as_str()),
                ("methods", methods.to_string().as_str()),
            ],
        );
        Ok(())
    }

    pub fn is_frozen(&self) -> MethodResult<bool> {
        Ok(self.read_state()?.done)
    }

    /// Get the descriptor of `model.name`
    pub fn lookup(&self, model: &str, name: &str) -> MethodResult<Arc<MethodDescriptor>> {
        let state = self.read_state()?;
        state
            .methods
            .get(&MethodKey::new(model, name))
            .cloned()
            .ok_or_else(|| MethodError::unknown_method(model, name))
    }

    /// Get the layer a declaration created
    pub fn lookup_layer(&self, handle: LayerHandle) -> MethodResult<Arc<Layer>> {
        let state = self.read_state()?;
        state
            .layers
            .get(&handle.id())
            .cloned()
            .ok_or_else(|| MethodError::UnknownLayer(handle.id().to_string()))
    }

    /// Returns true if `model.name` has at least one layer
    pub fn contains(&self, model: &str, name: &str) -> bool {
        self.lookup(model, name).is_ok()
    }

    /// Number of declared methods
    pub fn len(&self) -> MethodResult<usize> {
        Ok(self.read_state()?.methods.len())
    }

    pub fn is_empty(&self) -> MethodResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All declared method keys, sorted
    pub fn method_keys(&self) -> MethodResult<Vec<MethodKey>> {
        let mut keys: Vec<MethodKey> = self.read_state()?.methods.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn trace_dispatch(&self) -> bool {
        self.trace_dispatch
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

/// A unit of model extensions declared during bootstrap
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Declare this module's method layers
    fn declare(&self, registry: &MethodRegistry) -> MethodResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::value::{TypeInfo, Value};
    use crate::observability::Logger;
    use crate::recordset::RecordSet;

    fn double(_rs: &RecordSet, x: i64) -> MethodResult<i64> {
        Ok(x * 2)
    }

    #[test]
    fn test_declare_and_lookup() {
        let registry = MethodRegistry::new();
        registry.declare_method("product", "double", double).unwrap();

        let desc = registry.lookup("product", "double").unwrap();
        assert_eq!(desc.layer_count(), 1);
        assert_eq!(desc.signature().to_string(), "fn(RecordSet, i64) -> i64");
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_unknown_method() {
        let registry = MethodRegistry::new();
        let err = registry.lookup("product", "missing").unwrap_err();
        assert_eq!(err, MethodError::unknown_method("product", "missing"));
    }

    #[test]
    fn test_layers_stack() {
        let registry = MethodRegistry::new();
        let first = registry.declare_method("product", "double", double).unwrap();
        let second = registry.declare_method("product", "double", double).unwrap();
        assert_ne!(first, second);

        let desc = registry.lookup("product", "double").unwrap();
        assert_eq!(desc.layer_count(), 2);
        assert_eq!(desc.top_layer().id(), second.id());
        assert_eq!(
            desc.next_layer(second.id()).unwrap().map(|l| l.id()),
            Some(first.id())
        );
    }

    #[test]
    fn test_signature_mismatch_keeps_state() {
        let registry = MethodRegistry::new();
        let first = registry.declare_method("product", "double", double).unwrap();

        let err = registry
            .declare_method("product", "double", |_rs: &RecordSet, x: f64| -> MethodResult<f64> {
                Ok(x)
            })
            .unwrap_err();
        assert!(matches!(err, MethodError::SignatureMismatch { .. }));

        let desc = registry.lookup("product", "double").unwrap();
        assert_eq!(desc.layer_count(), 1);
        assert_eq!(desc.top_layer().id(), first.id());
        assert_eq!(registry.metrics().snapshot().declarations_rejected, 1);
    }

    #[test]
    fn test_invalid_receiver() {
        let registry = MethodRegistry::new();
        let signature = Signature::with_receiver(TypeInfo::of::<String>(), vec![], None);
        fn noop(_rs: &RecordSet, _args: &[Value]) -> MethodResult<Option<Value>> {
            Ok(None)
        }
        let callable: Callable = Arc::new(noop);

        let err = registry
            .declare_raw("product", "noop", signature, callable)
            .unwrap_err();
        assert_eq!(err.code(), "ORM_INVALID_IMPLEMENTATION");
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_freeze_is_idempotent_and_final() {
        let registry = MethodRegistry::new();
        registry.declare_method("product", "double", double).unwrap();
        registry.freeze().unwrap();
        registry.freeze().unwrap();
        assert!(registry.is_frozen().unwrap());

        let err = registry.declare_method("product", "double", double).unwrap_err();
        assert_eq!(err, MethodError::RegistryFrozen("product.double".into()));
        assert_eq!(registry.lookup("product", "double").unwrap().layer_count(), 1);
    }

    #[test]
    fn test_lookup_layer() {
        let registry = MethodRegistry::new();
        let handle = registry.declare_method("product", "double", double).unwrap();

        let layer = registry.lookup_layer(handle).unwrap();
        assert_eq!(layer.key(), &MethodKey::new("product", "double"));

        let err = registry
            .lookup_layer(LayerHandle(LayerId::new(42)))
            .unwrap_err();
        assert_eq!(err.code(), "ORM_UNKNOWN_LAYER");
    }

    #[test]
    fn test_descriptor_snapshot_unaffected_by_later_layers() {
        let registry = MethodRegistry::new();
        registry.declare_method("product", "double", double).unwrap();
        let before = registry.lookup("product", "double").unwrap();

        registry.declare_method("product", "double", double).unwrap();
        assert_eq!(before.layer_count(), 1);
        assert_eq!(registry.lookup("product", "double").unwrap().layer_count(), 2);
    }

    #[test]
    fn test_method_keys_sorted() {
        let registry = MethodRegistry::new();
        registry.declare_method("sale", "total", double).unwrap();
        registry.declare_method("product", "double", double).unwrap();

        let keys: Vec<String> = registry
            .method_keys()
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["product.double", "sale.total"]);
    }

    struct PricingModule;

    impl Module for PricingModule {
        fn name(&self) -> &str {
            "pricing"
        }

        fn declare(&self, registry: &MethodRegistry) -> MethodResult<()> {
            registry.declare_method("product", "double", double)?;
            Ok(())
        }
    }

    struct BrokenModule;

    impl Module for BrokenModule {
        fn name(&self) -> &str {
            "broken"
        }

        fn declare(&self, registry: &MethodRegistry) -> MethodResult<()> {
            registry.declare_method("product", "double", |_rs: &RecordSet| -> MethodResult<()> {
                Ok(())
            })?;
            Ok(())
        }
    }

    #[test]
    fn test_bootstrap_freezes() {
        let modules: [&dyn Module; 1] = [&PricingModule];
        let registry = MethodRegistry::bootstrap(&OrmConfig::default(), &modules).unwrap();
        assert!(registry.is_frozen().unwrap());
        assert!(registry.contains("product", "double"));
    }

    #[test]
    fn test_bootstrap_stops_on_failure() {
        let modules: [&dyn Module; 2] = [&PricingModule, &BrokenModule];
        let err = MethodRegistry::bootstrap(&OrmConfig::default(), &modules).unwrap_err();
        assert!(matches!(err, MethodError::SignatureMismatch { .. }));
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let modules: [&dyn Module; 1] = [&PricingModule];

        let zero_depth = OrmConfig {
            max_call_depth: 0,
            ..OrmConfig::default()
        };
        let err = MethodRegistry::bootstrap(&zero_depth, &modules).unwrap_err();
        assert!(matches!(err, MethodError::Config(_)));
        assert_eq!(err.code(), "ORM_CONFIG_INVALID");

        let unknown_level = OrmConfig {
            log_level: "loud".to_string(),
            ..OrmConfig::default()
        };
        let err = MethodRegistry::bootstrap(&unknown_level, &modules).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_with_config_validates() {
        let config = OrmConfig {
            max_call_depth: 0,
            ..OrmConfig::default()
        };
        assert!(matches!(
            MethodRegistry::with_config(&config),
            Err(MethodError::Config(_))
        ));

        let config = OrmConfig {
            max_call_depth: 3,
            trace_dispatch: true,
            ..OrmConfig::default()
        };
        let registry = MethodRegistry::with_config(&config).unwrap();
        assert_eq!(registry.max_call_depth(), 3);
        assert!(registry.trace_dispatch());
    }

    #[test]
    fn test_poisoned_lock_surfaces_as_internal() {
        let registry = MethodRegistry::new();
        registry.declare_method("product", "double", double).unwrap();

        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _guard = registry.state.write().unwrap();
                panic!("poison the registry lock");
            });
            assert!(poisoner.join().is_err());
        });

        let poisoned = MethodError::Internal("Lock poisoned".into());
        assert_eq!(registry.is_frozen().unwrap_err(), poisoned);
        assert_eq!(registry.len().unwrap_err(), poisoned);
        assert_eq!(registry.is_empty().unwrap_err(), poisoned);
        assert_eq!(registry.method_keys().unwrap_err(), poisoned);
        assert_eq!(registry.freeze().unwrap_err(), poisoned);
    }

    #[test]
    fn test_freeze_logs_once() {
        let registry = MethodRegistry::new();
        registry.declare_method("product", "double", double).unwrap();

        let (_, lines) = Logger::capture(|| {
            registry.freeze().unwrap();
            registry.freeze().unwrap();
        });
        let frozen: Vec<&String> = lines
            .iter()
            .filter(|line| line.contains("REGISTRY_FROZEN"))
            .collect();
        assert_eq!(frozen.len(), 1);
        assert!(frozen[0].contains("\"layers\":\"1\""));

        // The write lock is released before logging.
        assert!(registry.state.try_write().is_ok());
    }
}
