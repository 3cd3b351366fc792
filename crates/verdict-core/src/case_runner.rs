// Case runner: sequences the steps of one case around a shared context.
// A fresh identity nonce is generated per run so concurrent re-runs of
// identically named cases never collide in the event stream. The first step
// leaving failures or errors behind stops the case; remaining steps are
// neither executed nor reported.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::context::{ContextGuard, DEFAULT_CONTEXT};
use crate::event::{CaseIdentity, Event, EventBus, EventState};
use crate::registry::Registry;
use crate::step_runner::run_step;
use crate::suite::{Failure, TestCase};
use crate::templater::Templater;

pub(crate) async fn run_case(
    registry: &Registry,
    bus: &EventBus,
    step_timeout: Option<Duration>,
    suite_name: &str,
    templater: &mut Templater,
    case: &mut TestCase,
) {
    let identity = CaseIdentity::new(&case.name);
    bus.publish(Event::case(EventState::Run, suite_name, &identity));
    tracing::info!(suite = %suite_name, testcase = %case.name, "start");
    let started = Instant::now();

    let context_doc = case
        .context
        .as_ref()
        .map(|document| templater.apply_on_context(document));
    let context_type = context_doc
        .as_ref()
        .and_then(|document| document.get("type"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CONTEXT);

    let factory = match registry.context_factory(context_type) {
        Ok(factory) => factory,
        Err(err) => {
            case.errors.push(Failure::new(err.to_string()));
            case.time = Duration::ZERO;
            bus.publish(Event::case(EventState::Failure, suite_name, &identity));
            return;
        }
    };

    let mut guard = ContextGuard::new(factory.create());
    let init_doc = context_doc.unwrap_or(Value::Null);
    if let Err(err) = guard.context_mut().init(&init_doc) {
        case.errors
            .push(Failure::new(format!("context init failed: {err:#}")));
        case.time = Duration::ZERO;
        bus.publish(Event::case(EventState::Failure, suite_name, &identity));
        // the guard still closes the partially initialized context
        return;
    }

    for index in 0..case.steps.len() {
        let rendered = templater.apply_on_step(&case.steps[index]);
        run_step(
            registry,
            bus,
            step_timeout,
            suite_name,
            templater,
            case,
            &identity,
            index,
            &rendered,
            guard.context(),
        )
        .await;
        if case.has_failed() {
            break;
        }
    }

    let state = if case.has_failed() {
        EventState::Failure
    } else {
        EventState::Success
    };
    bus.publish(Event::case(state, suite_name, &identity));
    case.time = started.elapsed();
    tracing::info!(suite = %suite_name, testcase = %case.name, state = %state, "end");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::testutil::{ProbeContextFactory, RecordingSink, StaticExecutor};
    use serde_json::json;
    use std::sync::Arc;

    fn case_with_steps(name: &str, steps: Vec<Value>) -> TestCase {
        TestCase {
            name: name.to_string(),
            context: None,
            steps,
            failures: Vec::new(),
            errors: Vec::new(),
            skipped: Vec::new(),
            time: Duration::ZERO,
        }
    }

    fn harness() -> (Registry, EventBus, Arc<RecordingSink>) {
        let registry = Registry::new();
        let bus = EventBus::new();
        let sink = RecordingSink::new();
        bus.subscribe(sink.clone());
        (registry, bus, sink)
    }

    #[tokio::test]
    async fn test_exactly_one_run_and_one_terminal_case_event() {
        let (mut registry, bus, sink) = harness();
        registry.register_executor("ok", Arc::new(StaticExecutor::ok(&[("result.code", "0")])));
        let mut case = case_with_steps("case", vec![json!({"type": "ok"}), json!({"type": "ok"})]);
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        let case_events: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|event| event.kind == EventKind::TestCase)
            .collect();
        assert_eq!(case_events.len(), 2);
        assert_eq!(case_events[0].state, EventState::Run);
        assert_eq!(case_events[1].state, EventState::Success);
        // both events carry the same run identity
        let run_id = case_events[0].case.as_ref().map(CaseIdentity::identity);
        let end_id = case_events[1].case.as_ref().map(CaseIdentity::identity);
        assert_eq!(run_id, end_id);
    }

    #[tokio::test]
    async fn test_first_failing_step_stops_the_case() {
        let (mut registry, bus, sink) = harness();
        let ok = Arc::new(StaticExecutor::ok(&[("result.code", "0")]));
        let boom = Arc::new(StaticExecutor::failing("boom"));
        registry.register_executor("ok", ok.clone());
        registry.register_executor("boom", boom.clone());
        let mut case = case_with_steps(
            "case",
            vec![
                json!({"type": "boom"}),
                json!({"type": "ok"}),
                json!({"type": "ok"}),
            ],
        );
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert_eq!(case.errors.len(), 1);
        // remaining steps are neither executed nor reported
        assert_eq!(ok.calls(), 0);
        let step_events = sink
            .events()
            .into_iter()
            .filter(|event| event.kind == EventKind::TestStep)
            .count();
        assert_eq!(step_events, 2); // one RUN + one FAILURE
        assert_eq!(
            sink.events()
                .last()
                .map(|event| (event.kind, event.state)),
            Some((EventKind::TestCase, EventState::Failure))
        );
    }

    #[tokio::test]
    async fn test_terminal_state_matches_accumulators() {
        let (mut registry, bus, sink) = harness();
        registry.register_executor("one", Arc::new(StaticExecutor::ok(&[("result.code", "1")])));
        let mut case = case_with_steps(
            "case",
            vec![json!({"type": "one", "assertions": ["result.code eq 0"]})],
        );
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert!(case.has_failed());
        assert_eq!(
            sink.events()
                .last()
                .map(|event| event.state),
            Some(EventState::Failure)
        );
    }

    #[tokio::test]
    async fn test_context_init_and_close_once_per_case() {
        let (mut registry, bus, _sink) = harness();
        registry.register_executor("ok", Arc::new(StaticExecutor::ok(&[])));
        let factory = ProbeContextFactory::new(false);
        let inits = factory.inits.clone();
        let closes = factory.closes.clone();
        registry.register_context("probe", Arc::new(factory));
        let mut case = case_with_steps("case", vec![json!({"type": "ok"}), json!({"type": "ok"})]);
        case.context = Some(json!({"type": "probe"}));
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert_eq!(*inits.lock(), 1);
        assert_eq!(*closes.lock(), 1);
    }

    #[tokio::test]
    async fn test_context_init_failure_errors_case_without_running_steps() {
        let (mut registry, bus, sink) = harness();
        let executor = Arc::new(StaticExecutor::ok(&[]));
        registry.register_executor("ok", executor.clone());
        let factory = ProbeContextFactory::new(true);
        let closes = factory.closes.clone();
        registry.register_context("probe", Arc::new(factory));
        let mut case = case_with_steps("case", vec![json!({"type": "ok"})]);
        case.context = Some(json!({"type": "probe"}));
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert_eq!(case.errors.len(), 1);
        assert!(case.errors[0].value.contains("context init failed"));
        assert_eq!(executor.calls(), 0);
        // close still runs on the partially initialized context
        assert_eq!(*closes.lock(), 1);
        // terminal event with zero duration
        assert_eq!(case.time, Duration::ZERO);
        assert_eq!(
            sink.events()
                .last()
                .map(|event| (event.kind, event.state)),
            Some((EventKind::TestCase, EventState::Failure))
        );
    }

    #[tokio::test]
    async fn test_unknown_context_type_errors_case() {
        let (mut registry, bus, _sink) = harness();
        registry.register_executor("ok", Arc::new(StaticExecutor::ok(&[])));
        let mut case = case_with_steps("case", vec![json!({"type": "ok"})]);
        case.context = Some(json!({"type": "redis"}));
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert_eq!(case.errors.len(), 1);
        assert!(case.errors[0].value.contains("unknown context type 'redis'"));
    }

    #[tokio::test]
    async fn test_extracted_values_flow_into_later_steps() {
        let (mut registry, bus, _sink) = harness();
        registry.register_executor(
            "emit",
            Arc::new(StaticExecutor::ok(&[("result.systemout", "got token=abc")])),
        );
        registry.register_executor("ok", Arc::new(StaticExecutor::ok(&[("result.code", "0")])));
        let mut case = case_with_steps(
            "login",
            vec![
                json!({"type": "emit", "extracts": {"result.systemout": "token={{token=[a-z]+}}"}}),
                json!({"type": "ok", "payload": "use {{.login.token}}"}),
            ],
        );
        let mut templater = Templater::new();

        run_case(&registry, &bus, None, "suite", &mut templater, &mut case).await;

        assert!(!case.has_failed());
        assert_eq!(
            templater.values().get("login.token"),
            Some(&"abc".to_string())
        );
    }
}
