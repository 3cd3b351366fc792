// Suite runner: initializes the suite scope, runs cases in order, and
// aggregates their accumulator counts. Skipped cases never reach the case
// runner. With stop-on-failure the suite returns right after the failing
// case; what happens to the cases never reached is governed by the
// engine's unexecuted-case policy.

use std::collections::HashMap;
use std::time::Instant;

use crate::case_runner::run_case;
use crate::engine::{RunConfig, UnexecutedPolicy};
use crate::event::{Event, EventBus, EventState};
use crate::registry::Registry;
use crate::suite::{Failure, TestSuite};
use crate::templater::Templater;

pub(crate) async fn run_suite(
    registry: &Registry,
    bus: &EventBus,
    config: &RunConfig,
    globals: &HashMap<String, String>,
    suite: &mut TestSuite,
) {
    bus.publish(Event::suite(EventState::Run, &suite.name));
    tracing::info!(suite = %suite.name, cases = suite.test_cases.len(), "running test suite");
    let started = Instant::now();

    let mut templater = Templater::new();
    templater.add("", globals);
    templater.add("", &suite.vars);

    let mut stopped_after = None;
    for index in 0..suite.test_cases.len() {
        if suite.test_cases[index].is_skipped() {
            suite.skipped += suite.test_cases[index].skipped.len();
            continue;
        }

        run_case(
            registry,
            bus,
            config.step_timeout,
            &suite.name,
            &mut templater,
            &mut suite.test_cases[index],
        )
        .await;

        let case = &suite.test_cases[index];
        suite.failures += case.failures.len();
        suite.errors += case.errors.len();
        suite.skipped += case.skipped.len();

        if config.stop_on_failure && case.has_failed() {
            stopped_after = Some(index + 1);
            break;
        }
    }

    if let Some(from) = stopped_after {
        if config.unexecuted == UnexecutedPolicy::Skip {
            for case in suite.test_cases[from..].iter_mut() {
                if !case.is_skipped() {
                    case.skipped
                        .push(Failure::new("not executed: suite stopped on failure"));
                }
            }
            for case in &suite.test_cases[from..] {
                suite.skipped += case.skipped.len();
            }
        }
    }

    let state = if suite.has_failed() {
        EventState::Failure
    } else {
        EventState::Success
    };
    bus.publish(Event::suite(state, &suite.name));
    suite.time = started.elapsed();
    suite.templater = templater;
    tracing::info!(
        suite = %suite.name,
        failures = suite.failures,
        errors = suite.errors,
        skipped = suite.skipped,
        state = %state,
        "test suite finished"
    );
}
