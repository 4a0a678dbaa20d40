//! Routes inbound messages to the function bound to their destination.

use std::collections::HashMap;

use crate::error::StreamError;
use crate::runtime::config_loader::{inbound_binding_name, outbound_binding_name, BindingConfig};
use crate::runtime::registry::{FunctionKind, FunctionRegistry, Payload};
use crate::trace::TraceSink;

/// A resolved binding: which function consumes a destination and where its
/// output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub destination: String,
    pub function: String,
    pub kind: FunctionKind,
    pub outbound: Option<String>,
}

/// A transform result addressed to its outbound destination.
#[derive(Debug)]
pub struct Outbound {
    pub destination: String,
    pub payload: Payload,
}

/// Dispatches messages by inbound destination.
///
/// Built once from a registry and a binding config; holds no per-message state,
/// so a shared reference can serve concurrent callers.
pub struct Dispatcher<'r> {
    registry: &'r FunctionRegistry,
    routes: HashMap<String, Route>,
}

impl<'r> Dispatcher<'r> {
    /// Resolve every function in `config.definition` against the registry.
    ///
    /// # Errors
    /// `StreamError::Config` if the definition is empty, names an unknown
    /// function, lacks an inbound binding, binds two functions to the same
    /// destination, or leaves a transform without an outbound binding.
    pub fn new(registry: &'r FunctionRegistry, config: &BindingConfig) -> Result<Self, StreamError> {
        let names = config.function_names();
        if names.is_empty() {
            return Err(StreamError::Config(
                "Function definition is empty".to_string(),
            ));
        }

        let mut routes: HashMap<String, Route> = HashMap::new();

        for name in names {
            let function = registry.get(name).ok_or_else(|| {
                StreamError::Config(format!("Unknown function in definition: {}", name))
            })?;

            let inbound = config.inbound(name).ok_or_else(|| {
                StreamError::Config(format!(
                    "Missing binding '{}'",
                    inbound_binding_name(name)
                ))
            })?;

            let outbound = config.outbound(name).map(|b| b.destination.clone());
            match (function.kind(), &outbound) {
                (FunctionKind::Transform, None) => {
                    return Err(StreamError::Config(format!(
                        "Transform '{}' requires binding '{}'",
                        name,
                        outbound_binding_name(name)
                    )));
                }
                (FunctionKind::Sink, Some(destination)) => {
                    tracing::warn!(
                        "Sink '{}' has outbound binding to '{}'; it will never be used",
                        name,
                        destination
                    );
                }
                _ => {}
            }

            if let Some(existing) = routes.get(&inbound.destination) {
                return Err(StreamError::Config(format!(
                    "Destination '{}' bound to both '{}' and '{}'",
                    inbound.destination, existing.function, name
                )));
            }

            tracing::debug!(
                "Bound {} '{}' to destination '{}'",
                function.kind(),
                name,
                inbound.destination
            );

            routes.insert(
                inbound.destination.clone(),
                Route {
                    destination: inbound.destination.clone(),
                    function: name.to_string(),
                    kind: function.kind(),
                    outbound,
                },
            );
        }

        Ok(Self { registry, routes })
    }

    /// Process one message arriving on `destination`.
    ///
    /// Returns the outbound message for transforms and `None` for sinks.
    /// Failures are returned as-is; nothing is retried.
    pub fn dispatch(
        &self,
        destination: &str,
        payload: Payload,
        trace: &dyn TraceSink,
    ) -> Result<Option<Outbound>, StreamError> {
        let route = self.routes.get(destination).ok_or_else(|| {
            StreamError::fault(format!("No function bound to destination '{}'", destination))
        })?;

        let _span = tracing::debug_span!(
            "dispatch",
            function = %route.function,
            destination = %destination
        )
        .entered();

        let function = self.registry.get(&route.function).ok_or_else(|| {
            StreamError::fault(format!("Stream function not found: {}", route.function))
        })?;

        match (function.apply(payload, trace)?, &route.outbound) {
            (None, _) => Ok(None),
            (Some(payload), Some(outbound)) => Ok(Some(Outbound {
                destination: outbound.clone(),
                payload,
            })),
            (Some(_), None) => Err(StreamError::fault(format!(
                "Function '{}' produced output but has no outbound binding",
                route.function
            ))),
        }
    }

    pub fn route(&self, destination: &str) -> Option<&Route> {
        self.routes.get(destination)
    }

    /// All routes, sorted by inbound destination.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.routes.values().collect();
        routes.sort_by(|a, b| a.destination.cmp(&b.destination));
        routes
    }
}
