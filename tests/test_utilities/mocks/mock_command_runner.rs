use async_trait::async_trait;
use deptrace::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Mock CommandRunner that returns canned output per command-line prefix
/// and records every invocation
#[derive(Default)]
pub struct MockCommandRunner {
    responses: HashMap<String, String>,
    pub invocations: Arc<Mutex<Vec<String>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, command_prefix: &str, output: &str) -> Self {
        self.responses
            .insert(command_prefix.to_string(), output.to_string());
        self
    }

    pub fn get_invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run_captured(
        &self,
        program: &str,
        args: &[String],
        _working_dir: Option<&Path>,
    ) -> Result<String> {
        let invocation = format!("{} {}", program, args.join(" "));
        self.invocations.lock().unwrap().push(invocation.clone());
        self.responses
            .iter()
            .find(|(prefix, _)| invocation.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| anyhow::anyhow!("No canned output for command: {}", invocation))
    }
}
