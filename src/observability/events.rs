//! Observable events of the method engine
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Bootstrap
    /// Module bootstrap begins
    BootstrapStart,
    /// One module declared all its layers
    ModuleLoaded,
    /// Bootstrap complete, registry frozen
    BootstrapComplete,
    /// A module failed to declare its layers (FATAL)
    BootstrapFailed,

    // Registration
    /// A layer was added to a method
    MethodDeclared,
    /// A declaration was refused
    MethodDeclareRejected,
    /// Registry switched to read-only
    RegistryFrozen,

    // Dispatch
    /// Top layer invoked through `call`
    MethodCall,
    /// Next layer invoked through `call_super`
    MethodSuper,
    /// A dispatch returned an error
    DispatchFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootstrapStart => "BOOTSTRAP_BEGIN",
            Event::ModuleLoaded => "MODULE_LOADED",
            Event::BootstrapComplete => "BOOTSTRAP_COMPLETE",
            Event::BootstrapFailed => "BOOTSTRAP_FAILED",

            Event::MethodDeclared => "METHOD_DECLARED",
            Event::MethodDeclareRejected => "METHOD_DECLARE_REJECTED",
            Event::RegistryFrozen => "REGISTRY_FROZEN",

            Event::MethodCall => "METHOD_CALL",
            Event::MethodSuper => "METHOD_SUPER",
            Event::DispatchFailed => "DISPATCH_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::BootstrapFailed)
    }

    /// Returns true for events emitted on every dispatch
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Event::MethodCall | Event::MethodSuper)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
