//! Method dispatch on record sets
//!
//! `call` enters a method at its top layer; `call_super` continues from
//! the layer currently executing to the one it overrides. Each dispatch
//! runs the layer on a copy of the record set whose call stack records the
//! layer, so concurrent dispatches on the same record set never interfere.

use std::any::Any;
use std::sync::Arc;

use super::recordset::RecordSet;
use crate::methods::{Layer, MethodError, MethodResult, Signature, Value};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

impl RecordSet {
    /// Call `method` on this record set, starting at its top layer.
    ///
    /// Returns `None` when the method declares no return value.
    pub fn call(&self, method: &str, args: &[Value]) -> MethodResult<Option<Value>> {
        let result = self.dispatch_top(method, args);
        self.record_outcome(method, &result);
        result
    }

    fn dispatch_top(&self, method: &str, args: &[Value]) -> MethodResult<Option<Value>> {
        let registry = self.env.registry();
        let descriptor = registry.lookup(&self.model, method)?;

        let limit = registry.max_call_depth();
        if self.call_stack.len() >= limit {
            return Err(MethodError::CallDepthExceeded {
                method: descriptor.key().to_string(),
                limit,
            });
        }

        let layer = Arc::clone(descriptor.top_layer());
        let mut frame = self.clone();
        frame.call_stack.push(Arc::clone(&layer));

        registry.metrics().increment_calls();
        frame.trace(Event::MethodCall, &layer);
        layer.invoke(&frame, args)
    }

    /// Call the layer overridden by the one currently executing.
    ///
    /// Must be called from inside a layer, on the record set it received.
    /// Returns `Ok(None)` from the first declared layer, which has nothing
    /// to override.
    pub fn call_super(&self, args: &[Value]) -> MethodResult<Option<Value>> {
        let current = self.call_stack.last().ok_or(MethodError::EmptyCallStack)?;
        let registry = self.env.registry();
        let key = current.key();
        let descriptor = registry
            .lookup(&key.model, &key.name)
            .map_err(|_| MethodError::UnknownLayer(format!("{} in {}", current.id(), key)))?;

        let next = match descriptor.next_layer(current.id())? {
            Some(next) => next,
            None => {
                registry.metrics().increment_super_terminals();
                return Ok(None);
            }
        };

        let mut frame = self.clone();
        if let Some(head) = frame.call_stack.last_mut() {
            *head = Arc::clone(&next);
        }

        registry.metrics().increment_super_calls();
        frame.trace(Event::MethodSuper, &next);
        next.invoke(&frame, args)
    }

    /// `call` with the return value cloned out as `T`
    pub fn call_as<T: Any + Clone>(&self, method: &str, args: &[Value]) -> MethodResult<Option<T>> {
        self.call(method, args)?.map(|v| v.cloned::<T>()).transpose()
    }

    /// `call_super` with the return value cloned out as `T`
    pub fn super_as<T: Any + Clone>(&self, args: &[Value]) -> MethodResult<Option<T>> {
        self.call_super(args)?.map(|v| v.cloned::<T>()).transpose()
    }

    /// Declared signature of `method` on this model
    pub fn method_signature(&self, method: &str) -> MethodResult<Signature> {
        let descriptor = self.env.registry().lookup(&self.model, method)?;
        Ok(descriptor.signature().clone())
    }

    /// Returns true if `method` is declared on this model
    pub fn has_method(&self, method: &str) -> bool {
        self.env.registry().contains(&self.model, method)
    }

    fn trace(&self, event: Event, layer: &Layer) {
        if !self.env.registry().trace_dispatch() || !Logger::enabled(Severity::Trace) {
            return;
        }
        log_event_with_fields(
            event,
            &[
                ("depth", self.call_stack.len().to_string().as_str()),
                ("layer", layer.id().to_string().as_str()),
                ("method", layer.key().to_string().as_str()),
                ("records", self.to_string().as_str()),
                ("session", self.env.session_id().to_string().as_str()),
            ],
        );
    }

    /// Failures are counted and logged once, where they leave the outermost call
    fn record_outcome(&self, method: &str, result: &MethodResult<Option<Value>>) {
        if !self.call_stack.is_empty() {
            return;
        }
        if let Err(err) = result {
            self.env.registry().metrics().increment_failures();
            log_event_with_fields(
                Event::DispatchFailed,
                &[
                    ("code", err.code()),
                    ("error", err.to_string().as_str()),
                    ("method", method),
                    ("model", self.model_name()),
                ],
            );
        }
    }
}
