// Progress renderer: an event sink printing state transitions as they
// happen. The engine publishes from whichever task transitions state, so
// rendering state lives behind a mutex.

use std::io::Write;

use parking_lot::Mutex;

use verdict_core::{Event, EventKind, EventSink, EventState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Details {
    /// No progress output during the run.
    Low,
    /// Suite transitions only.
    Medium,
    /// Suite, case, and step transitions.
    High,
}

pub struct ProgressRenderer {
    details: Details,
    output: Mutex<Box<dyn Write + Send>>,
}

impl ProgressRenderer {
    pub fn new(details: Details) -> Self {
        Self {
            details,
            output: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    #[cfg(test)]
    fn with_output(details: Details, output: Box<dyn Write + Send>) -> Self {
        Self {
            details,
            output: Mutex::new(output),
        }
    }

    fn line(&self, event: &Event) -> Option<String> {
        match event.kind {
            EventKind::TestSuite if self.details >= Details::Medium => {
                Some(format!("{} {}", event.state, event.suite))
            }
            EventKind::TestCase if self.details >= Details::High => {
                let name = event.case.as_ref().map(|c| c.name.as_str()).unwrap_or("");
                Some(format!("    {} {}", event.state, name))
            }
            EventKind::TestStep if self.details >= Details::High => {
                // step RUN lines add noise without information
                if event.state == EventState::Run {
                    return None;
                }
                let step = event.step.as_deref().unwrap_or("");
                Some(format!("        {} {}", event.state, step))
            }
            _ => None,
        }
    }
}

impl EventSink for ProgressRenderer {
    fn on_event(&self, event: &Event) {
        if let Some(line) = self.line(event) {
            let mut output = self.output.lock();
            let _ = writeln!(output, "{line}");
        }
    }
}
