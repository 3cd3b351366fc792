// Test case contexts: a scoped resource bundle kept alive across the steps
// of one case. `init` runs once before any step, `close` is guaranteed on
// every exit path by a drop guard, and `bag` exposes read-only state some
// executors consume. The engine never mutates the bag.

use std::collections::HashMap;

use serde_json::Value;

/// Context type used when a case declares no `context` block, or the block
/// omits `type`.
pub const DEFAULT_CONTEXT: &str = "default";

pub trait TestCaseContext: Send + Sync {
    /// Initialize the context from the rendered context document.
    fn init(&mut self, document: &Value) -> anyhow::Result<()>;

    /// Release held resources. Called exactly once, on every exit path,
    /// including after a failed `init`.
    fn close(&mut self);

    /// Read-only state executors may consume.
    fn bag(&self) -> &HashMap<String, Value>;
}

pub trait ContextFactory: Send + Sync {
    fn create(&self) -> Box<dyn TestCaseContext>;
}

impl std::fmt::Debug for dyn ContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn ContextFactory")
    }
}

/// The stateless default context.
#[derive(Debug, Default)]
pub struct DefaultContext {
    bag: HashMap<String, Value>,
}

impl TestCaseContext for DefaultContext {
    fn init(&mut self, _document: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn bag(&self) -> &HashMap<String, Value> {
        &self.bag
    }
}

pub struct DefaultContextFactory;

impl ContextFactory for DefaultContextFactory {
    fn create(&self) -> Box<dyn TestCaseContext> {
        Box::new(DefaultContext::default())
    }
}

/// Guard guaranteeing `close()` on every exit path, including unwinds and
/// partially initialized contexts.
pub struct ContextGuard {
    inner: Box<dyn TestCaseContext>,
}

impl ContextGuard {
    pub fn new(context: Box<dyn TestCaseContext>) -> Self {
        Self { inner: context }
    }

    pub fn context(&self) -> &dyn TestCaseContext {
        self.inner.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn TestCaseContext {
        self.inner.as_mut()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}
