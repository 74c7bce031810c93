//! Fan-out output

use crate::core::{log::Log, output::Output};
use std::sync::Arc;

/// Output that forwards every log to each of its outputs in order.
///
/// Each output receives its own copy of the log.
#[derive(Default)]
pub struct MultiOutput {
    outputs: Vec<Arc<dyn Output>>,
}

impl MultiOutput {
    pub fn new(outputs: impl IntoIterator<Item = Arc<dyn Output>>) -> Self {
        Self {
            outputs: outputs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: Arc<dyn Output>) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn push(&mut self, output: Arc<dyn Output>) {
        self.outputs.push(output);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl Output for MultiOutput {
    fn log(&self, log: Log) {
        let Some((last, rest)) = self.outputs.split_last() else {
            return;
        };
        for output in rest {
            output.log(log.clone());
        }
        last.log(log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{field::Field, severity::Severity};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MutatingOutput {
        logs: Mutex<Vec<Log>>,
    }

    impl Output for MutatingOutput {
        fn log(&self, mut log: Log) {
            log.message.push_str(" (seen)");
            log.fields.push(Field::new("seen", true));
            self.logs.lock().push(log);
        }
    }

    #[test]
    fn test_each_output_owns_its_copy() {
        let first = Arc::new(MutatingOutput::default());
        let second = Arc::new(MutatingOutput::default());
        let multi = MultiOutput::new([first.clone() as Arc<dyn Output>])
            .with_output(second.clone());
        assert_eq!(multi.len(), 2);

        multi.log(Log::new(Severity::Info, "hello"));

        for output in [&first, &second] {
            let logs = output.logs.lock();
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].message, "hello (seen)");
            assert_eq!(logs[0].fields.len(), 1);
        }
    }

    #[test]
    fn test_empty_multi_output() {
        let multi = MultiOutput::default();
        assert!(multi.is_empty());
        multi.log(Log::new(Severity::Error, "goes nowhere"));
    }
}
