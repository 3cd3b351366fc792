// Registry: maps a step's declared `type` to an executor, and a context
// block's `type` to a context factory. The two namespaces are disjoint.
// Re-registering a name overwrites silently; lookup misses surface as typed
// errors at step-wrap / context-build time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::{ContextFactory, DefaultContextFactory, DEFAULT_CONTEXT};
use crate::errors::EngineError;
use crate::executor::Executor;

pub struct Registry {
    executors: HashMap<String, Arc<dyn Executor>>,
    contexts: HashMap<String, Arc<dyn ContextFactory>>,
}

impl Registry {
    /// An empty registry with the default case context pre-registered.
    pub fn new() -> Self {
        let mut registry = Self {
            executors: HashMap::new(),
            contexts: HashMap::new(),
        };
        registry.register_context(DEFAULT_CONTEXT, Arc::new(DefaultContextFactory));
        registry
    }

    pub fn register_executor(&mut self, name: &str, executor: Arc<dyn Executor>) {
        self.executors.insert(name.to_string(), executor);
    }

    pub fn register_context(&mut self, name: &str, factory: Arc<dyn ContextFactory>) {
        self.contexts.insert(name.to_string(), factory);
    }

    pub fn executor(&self, name: &str) -> Result<Arc<dyn Executor>, EngineError> {
        self.executors
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownExecutor(name.to_string()))
    }

    pub fn context_factory(&self, name: &str) -> Result<Arc<dyn ContextFactory>, EngineError> {
        self.contexts
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownContext(name.to_string()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
