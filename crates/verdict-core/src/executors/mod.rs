// Built-in executors. Each performs one kind of local interaction and
// returns a flat result map; protocol clients live in external crates that
// register themselves the same way.

pub mod exec;
pub mod readfile;
pub mod sleep;

use std::sync::Arc;

use crate::registry::Registry;

/// Register every built-in executor.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_executor(exec::NAME, Arc::new(exec::ExecExecutor));
    registry.register_executor(readfile::NAME, Arc::new(readfile::ReadFileExecutor));
    registry.register_executor(sleep::NAME, Arc::new(sleep::SleepExecutor));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let mut registry = Registry::new();
        register_builtins(&mut registry);
        assert!(registry.executor("exec").is_ok());
        assert!(registry.executor("readfile").is_ok());
        assert!(registry.executor("sleep").is_ok());
    }
}
