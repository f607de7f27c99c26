//! Shared test doubles for workflow tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use codectx_bridge::{
    CommandFailure, CommandInvocation, CommandOutcome, Notifier, ProcessRunner, ResultSink,
    StatusSink, StatusState,
};

struct Rule {
    prefix: Vec<String>,
    outcomes: VecDeque<CommandOutcome>,
}

/// Runner that answers from a script keyed by argument prefix and records
/// every invocation. The last scripted outcome of a rule repeats; calls
/// with no matching rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    gates: Mutex<Vec<(Vec<String>, Arc<Notify>)>>,
    calls: Mutex<Vec<CommandInvocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, prefix: &[&str], outcome: CommandOutcome) -> &Self {
        let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        let mut rules = self.rules.lock().unwrap();
        match rules.iter_mut().find(|rule| rule.prefix == prefix) {
            Some(rule) => rule.outcomes.push_back(outcome),
            None => rules.push(Rule {
                prefix,
                outcomes: VecDeque::from([outcome]),
            }),
        }
        self
    }

    pub fn succeed(&self, prefix: &[&str], stdout: &str) -> &Self {
        self.respond(prefix, CommandOutcome::success(stdout))
    }

    pub fn fail(&self, prefix: &[&str], code: i32, stderr: &str) -> &Self {
        self.respond(prefix, CommandOutcome::Failure(CommandFailure::exited(code, stderr)))
    }

    /// Calls matching `prefix` wait for `gate` before answering.
    pub fn hold(&self, prefix: &[&str], gate: Arc<Notify>) -> &Self {
        let prefix = prefix.iter().map(|s| s.to_string()).collect();
        self.gates.lock().unwrap().push((prefix, gate));
        self
    }

    pub fn calls(&self) -> Vec<CommandInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Argument vectors of every call, joined with spaces.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call.args().join(" "))
            .collect()
    }

    fn next_outcome(&self, args: &[String]) -> CommandOutcome {
        let mut rules = self.rules.lock().unwrap();
        let Some(rule) = rules
            .iter_mut()
            .find(|rule| args.starts_with(&rule.prefix))
        else {
            return CommandOutcome::success("");
        };

        if rule.outcomes.len() > 1 {
            rule.outcomes.pop_front().unwrap()
        } else {
            rule.outcomes.front().cloned().unwrap()
        }
    }

    fn gate_for(&self, args: &[String]) -> Option<Arc<Notify>> {
        self.gates
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| args.starts_with(prefix))
            .map(|(_, gate)| gate.clone())
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &CommandInvocation) -> CommandOutcome {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(gate) = self.gate_for(invocation.args()) {
            gate.notified().await;
        }
        self.next_outcome(invocation.args())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warn(String),
    Error(String),
    Prompt(String),
}

/// Records notices and answers prompts with a fixed reply.
pub struct RecordingNotifier {
    pub accept_prompts: bool,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            accept_prompts: true,
            notices: Mutex::new(Vec::new()),
        })
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            accept_prompts: false,
            notices: Mutex::new(Vec::new()),
        })
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> usize {
        self.notices()
            .iter()
            .filter(|notice| matches!(notice, Notice::Prompt(_)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Warn(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Error(message.to_string()));
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.notices.lock().unwrap().push(Notice::Prompt(prompt.to_string()));
        self.accept_prompts
    }
}

#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl ResultSink for RecordingSink {
    fn publish(&self, title: &str, content: &str) {
        self.published
            .lock()
            .unwrap()
            .push((title.to_string(), content.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingStatus {
    states: Mutex<Vec<StatusState>>,
}

impl RecordingStatus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<StatusState> {
        self.states.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingStatus {
    fn render(&self, state: &StatusState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

pub const NOT_READY: &str = r#"[{"name":"config","status":"ok"},{"name":"index","status":"error","message":"no index"}]"#;
pub const READY: &str = r#"[{"name":"config","status":"ok"},{"name":"index","status":"warning"}]"#;
