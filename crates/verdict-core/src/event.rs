// Event bus: state transitions for suites, cases, and steps.
// Publication is synchronous on the task that transitions state. The bus is
// an observer list rather than a single mutable hook so parallel suites
// cannot corrupt consumer state; sinks guard their own interior state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TestSuite,
    TestCase,
    TestStep,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestSuite => write!(f, "testSuite"),
            Self::TestCase => write!(f, "testCase"),
            Self::TestStep => write!(f, "testStep"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    Run,
    Success,
    Failure,
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "RUN"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Identity of one case run.
///
/// The display `name` is what reports show; the `nonce` is fresh per run so
/// that identically named cases executing in parallel suites never collide
/// in the event stream. Consumers grouping events key on [`identity`].
///
/// [`identity`]: CaseIdentity::identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseIdentity {
    pub name: String,
    pub nonce: Uuid,
}

impl CaseIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nonce: Uuid::new_v4(),
        }
    }

    /// Collision-free identity string for event consumers.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.name, self.nonce)
    }
}

/// An immutable state-transition record.
///
/// Within one case, events are totally ordered; across suites no ordering is
/// guaranteed and consumers must tolerate interleaving.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub state: EventState,
    pub suite: String,
    pub case: Option<CaseIdentity>,
    pub step: Option<String>,
}

impl Event {
    pub fn suite(state: EventState, suite: &str) -> Self {
        Self {
            kind: EventKind::TestSuite,
            state,
            suite: suite.to_string(),
            case: None,
            step: None,
        }
    }

    pub fn case(state: EventState, suite: &str, case: &CaseIdentity) -> Self {
        Self {
            kind: EventKind::TestCase,
            state,
            suite: suite.to_string(),
            case: Some(case.clone()),
            step: None,
        }
    }

    pub fn step(state: EventState, suite: &str, case: &CaseIdentity, step: &str) -> Self {
        Self {
            kind: EventKind::TestStep,
            state,
            suite: suite.to_string(),
            case: Some(case.clone()),
            step: Some(step.to_string()),
        }
    }
}

/// A consumer of engine state transitions.
///
/// Invoked synchronously on the task that transitions state; the engine does
/// not serialize calls across suites, so implementations needing shared
/// state must guard it themselves.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Observer-list publisher for engine events.
#[derive(Clone, Default)]
pub struct EventBus {
    sinks: Arc<RwLock<Vec<Arc<dyn EventSink>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    pub fn publish(&self, event: Event) {
        for sink in self.sinks.read().iter() {
            sink.on_event(&event);
        }
    }
}
