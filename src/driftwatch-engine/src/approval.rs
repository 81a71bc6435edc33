//! Approval gate.
//!
//! Every novel or quarantined entity is put to an [`ApprovalSource`]. The
//! production source is [`PromptApproval`] on stdin/stdout; tests drive the
//! engine with [`ScriptedApproval`].

use crate::stdin::{ChannelReader, spawn_stdin_reader};
use async_trait::async_trait;
use driftwatch_baseline::Domain;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdout};
use tracing::warn;

/// Question printed before every read.
pub const APPROVAL_PROMPT: &str = "Approval? (y/n): ";

/// Outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Parse an operator answer; `None` for anything but y/n.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" => Some(Decision::Approved),
            "n" => Some(Decision::Rejected),
            _ => None,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Why an entity needs a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Unknown entity.
    Novel,
    /// File whose extension is outside the allow-list.
    Quarantine,
}

/// An entity awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub domain: Domain,
    pub kind: RequestKind,
    /// Baseline key the entity is recorded under if approved.
    pub key: String,
    /// Line shown to the operator.
    pub description: String,
}

impl ApprovalRequest {
    pub fn new(
        domain: Domain,
        kind: RequestKind,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            kind,
            key: key.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Something that can answer approval requests.
#[async_trait]
pub trait ApprovalSource: Send {
    /// Decide on `request`. Must not fail: any problem is a rejection.
    async fn decide(&mut self, request: &ApprovalRequest) -> Decision;
}

/// Line-oriented interactive prompt.
pub struct PromptApproval<R, W> {
    reader: R,
    writer: W,
}

impl PromptApproval<BufReader<ChannelReader>, Stdout> {
    /// Prompt on the process's stdin and stdout.
    ///
    /// A pending read does not hold up shutdown.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(spawn_stdin_reader()), tokio::io::stdout())
    }
}

impl<R, W> PromptApproval<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn ask(&mut self, request: &ApprovalRequest) -> std::io::Result<Decision> {
        self.write(&format!("\n{}\n", request.description)).await?;
        let mut line = String::new();
        loop {
            self.write(APPROVAL_PROMPT).await?;
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                self.write("Error reading input.\n").await?;
                return Ok(Decision::Rejected);
            }
            match Decision::parse(&line) {
                Some(decision) => return Ok(decision),
                None => self.write("Invalid input. Please enter 'y' or 'n'.\n").await?,
            }
        }
    }
}

#[async_trait]
impl<R, W> ApprovalSource for PromptApproval<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn decide(&mut self, request: &ApprovalRequest) -> Decision {
        match self.ask(request).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Approval prompt failed, rejecting {}: {}", request.key, e);
                Decision::Rejected
            }
        }
    }
}

/// Answers from a fixed script and records every request it sees.
///
/// Once the script runs out every further request is rejected.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApproval {
    answers: Arc<Mutex<VecDeque<Decision>>>,
    seen: Arc<Mutex<Vec<ApprovalRequest>>>,
}

impl ScriptedApproval {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            seen: Arc::default(),
        }
    }

    /// Queue more answers.
    pub fn push(&self, decision: Decision) {
        self.answers.lock().push_back(decision);
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.seen.lock().clone()
    }

    /// Number of requests received so far.
    pub fn prompt_count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl ApprovalSource for ScriptedApproval {
    async fn decide(&mut self, request: &ApprovalRequest) -> Decision {
        self.seen.lock().push(request.clone());
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(Decision::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new(
            Domain::Processes,
            RequestKind::Novel,
            "nc",
            "Detect new process nc",
        )
    }

    async fn answer(input: &str) -> (Decision, String) {
        let mut gate = PromptApproval::new(input.as_bytes(), Vec::new());
        let decision = gate.decide(&request()).await;
        (decision, String::from_utf8(gate.into_writer()).unwrap())
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Decision::parse("y"), Some(Decision::Approved));
        assert_eq!(Decision::parse("Y\n"), Some(Decision::Approved));
        assert_eq!(Decision::parse(" N \r\n"), Some(Decision::Rejected));
        assert_eq!(Decision::parse("yes"), None);
        assert_eq!(Decision::parse(""), None);
    }

    #[tokio::test]
    async fn test_prompt_accepts_y() {
        let (decision, out) = answer("y\n").await;
        assert_eq!(decision, Decision::Approved);
        assert_eq!(out, "\nDetect new process nc\nApproval? (y/n): ");
    }

    #[tokio::test]
    async fn test_prompt_retries_on_invalid_input() {
        let (decision, out) = answer("maybe\n\nN\n").await;
        assert_eq!(decision, Decision::Rejected);
        assert_eq!(out.matches(APPROVAL_PROMPT).count(), 3);
        assert_eq!(out.matches("Invalid input").count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_eof_rejects() {
        let (decision, out) = answer("what\n").await;
        assert_eq!(decision, Decision::Rejected);
        assert!(out.ends_with("Error reading input.\n"));
    }

    #[tokio::test]
    async fn test_scripted_runs_out_to_rejection() {
        let mut gate = ScriptedApproval::new([Decision::Approved]);
        let observer = gate.clone();
        assert_eq!(gate.decide(&request()).await, Decision::Approved);
        assert_eq!(gate.decide(&request()).await, Decision::Rejected);
        assert_eq!(observer.prompt_count(), 2);
        assert_eq!(observer.requests()[0].key, "nc");
    }
}
