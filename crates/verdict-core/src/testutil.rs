// Shared test doubles for runner, analyzer, and engine tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::context::{ContextFactory, TestCaseContext};
use crate::event::{Event, EventSink};
use crate::executor::{Executor, ExecutorResult};

pub(crate) fn result(pairs: &[(&str, &str)]) -> ExecutorResult {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Executor returning a fixed result (or error), optionally after a delay,
/// optionally exposing a zero-value template.
pub(crate) struct StaticExecutor {
    result: ExecutorResult,
    error: Option<String>,
    delay: Option<Duration>,
    zero: Option<ExecutorResult>,
    calls: Mutex<usize>,
}

impl StaticExecutor {
    pub fn ok(pairs: &[(&str, &str)]) -> Self {
        Self {
            result: result(pairs),
            error: None,
            delay: None,
            zero: None,
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        let mut executor = Self::ok(&[]);
        executor.error = Some(message.to_string());
        executor
    }

    pub fn with_zero(mut self, pairs: &[(&str, &str)]) -> Self {
        self.zero = Some(result(pairs));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Executor for StaticExecutor {
    async fn run(
        &self,
        _step: &Value,
        _context: &dyn TestCaseContext,
    ) -> anyhow::Result<ExecutorResult> {
        *self.calls.lock() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.result.clone()),
        }
    }

    fn zero_value_result(&self) -> Option<ExecutorResult> {
        self.zero.clone()
    }
}

/// Sink recording every event in publication order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Context factory whose instances count inits and closes, and can refuse
/// initialization.
pub(crate) struct ProbeContextFactory {
    pub fail_init: bool,
    pub inits: Arc<Mutex<usize>>,
    pub closes: Arc<Mutex<usize>>,
}

impl ProbeContextFactory {
    pub fn new(fail_init: bool) -> Self {
        Self {
            fail_init,
            inits: Arc::new(Mutex::new(0)),
            closes: Arc::new(Mutex::new(0)),
        }
    }
}

impl ContextFactory for ProbeContextFactory {
    fn create(&self) -> Box<dyn TestCaseContext> {
        Box::new(ProbeContext {
            fail_init: self.fail_init,
            inits: self.inits.clone(),
            closes: self.closes.clone(),
            bag: HashMap::new(),
        })
    }
}

struct ProbeContext {
    fail_init: bool,
    inits: Arc<Mutex<usize>>,
    closes: Arc<Mutex<usize>>,
    bag: HashMap<String, Value>,
}

impl TestCaseContext for ProbeContext {
    fn init(&mut self, _document: &Value) -> anyhow::Result<()> {
        *self.inits.lock() += 1;
        if self.fail_init {
            anyhow::bail!("context refused to initialize");
        }
        Ok(())
    }

    fn close(&mut self) {
        *self.closes.lock() += 1;
    }

    fn bag(&self) -> &HashMap<String, Value> {
        &self.bag
    }
}
