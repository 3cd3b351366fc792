// Step runner: one executor invocation plus its assertions and extractions.
// Assertion violations accumulate as failures; executor, lookup, and timeout
// problems accumulate as errors and terminate the case. Extracted values are
// bound into the suite scope before the terminal event is published so hook
// consumers observing the event see them.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::assertions;
use crate::context::TestCaseContext;
use crate::errors::EngineError;
use crate::event::{CaseIdentity, Event, EventBus, EventState};
use crate::extract;
use crate::registry::Registry;
use crate::suite::{Failure, TestCase};
use crate::templater::Templater;

#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_step(
    registry: &Registry,
    bus: &EventBus,
    step_timeout: Option<Duration>,
    suite_name: &str,
    templater: &mut Templater,
    case: &mut TestCase,
    identity: &CaseIdentity,
    index: usize,
    step: &Value,
    context: &dyn TestCaseContext,
) {
    let step_name = format!("step {}", index + 1);
    bus.publish(Event::step(EventState::Run, suite_name, identity, &step_name));

    let failures_before = case.failures.len();
    let errors_before = case.errors.len();

    let type_name = match step.get("type").and_then(Value::as_str) {
        Some(name) => name,
        None => {
            case.errors
                .push(Failure::new(format!("{step_name} has no 'type' key")));
            bus.publish(Event::step(
                EventState::Failure,
                suite_name,
                identity,
                &step_name,
            ));
            return;
        }
    };

    let executor = match registry.executor(type_name) {
        Ok(executor) => executor,
        Err(err) => {
            case.errors.push(Failure::new(err.to_string()));
            bus.publish(Event::step(
                EventState::Failure,
                suite_name,
                identity,
                &step_name,
            ));
            return;
        }
    };

    tracing::debug!(suite = %suite_name, testcase = %case.name, step = %step_name, executor = %type_name, "running step");

    let invocation = executor.run(step, context);
    let outcome = match step_timeout {
        Some(limit) => match tokio::time::timeout(limit, invocation).await {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineError::Timeout(limit).into()),
        },
        None => invocation.await,
    };

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            case.errors
                .push(Failure::new(format!("{step_name} failed: {err:#}")));
            bus.publish(Event::step(
                EventState::Failure,
                suite_name,
                identity,
                &step_name,
            ));
            return;
        }
    };

    // Every assertion is evaluated; violations collect rather than
    // short-circuiting.
    if let Some(items) = step.get("assertions").and_then(Value::as_array) {
        for item in items {
            match item.as_str() {
                Some(line) => {
                    if let Err(message) = assertions::check(line, &result) {
                        case.failures.push(Failure::new(message));
                    }
                }
                None => {
                    case.failures
                        .push(Failure::new(format!("assertion must be a string: {item}")));
                }
            }
        }
    }

    // Extraction precedes the terminal event so that downstream hook
    // consumers see the event after the variables are bound.
    if let Some(entries) = step.get("extracts").and_then(Value::as_object) {
        let mut bound = HashMap::new();
        for (key, pattern) in entries {
            let pattern = match pattern.as_str() {
                Some(pattern) => pattern,
                None => {
                    case.failures.push(Failure::new(format!(
                        "extraction pattern for '{key}' must be a string"
                    )));
                    continue;
                }
            };
            let input = match result.get(key) {
                Some(input) => input,
                None => {
                    case.failures.push(Failure::new(format!(
                        "extraction key '{key}' not found in result"
                    )));
                    continue;
                }
            };
            match extract::apply(pattern, input) {
                Ok(pairs) => {
                    for (name, value) in pairs {
                        bound.insert(name, value);
                    }
                }
                Err(message) => case.failures.push(Failure::new(message)),
            }
        }
        if !bound.is_empty() {
            templater.add(&case.name, &bound);
        }
    }

    let state = if case.failures.len() > failures_before || case.errors.len() > errors_before {
        EventState::Failure
    } else {
        EventState::Success
    };
    bus.publish(Event::step(state, suite_name, identity, &step_name));
}
