//! Background execution of assistant requests
//!
//! Requests run on a small tokio runtime owned by [`AssistantWorker`];
//! replies come back over a std channel that the UI loop drains without
//! blocking. Each request carries a generation issued by
//! [`RequestGenerations`] so that an analysis or generation overtaken by a
//! newer request of the same kind can be recognized and dropped. Chat
//! replies are never dropped: the session records every turn in order.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{Assistant, AssistantConfig, AssistantError, ChatSession, GeminiAssistant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Explain,
    Generate,
    Chat,
}

impl RequestKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            RequestKind::Explain => 0,
            RequestKind::Generate => 1,
            RequestKind::Chat => 2,
        }
    }
}

/// A finished request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub generation: u64,
    pub kind: RequestKind,
    pub text: String,
}

/// Monotonic generation counter per request kind
#[derive(Debug, Clone, Default)]
pub struct RequestGenerations {
    latest: [u64; RequestKind::COUNT],
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the generation for a new request of `kind`
    pub fn issue(&mut self, kind: RequestKind) -> u64 {
        let slot = &mut self.latest[kind.slot()];
        *slot += 1;
        *slot
    }

    /// Make every outstanding request of `kind` stale
    pub fn invalidate(&mut self, kind: RequestKind) {
        self.issue(kind);
    }

    pub fn is_current(&self, kind: RequestKind, generation: u64) -> bool {
        self.latest[kind.slot()] == generation
    }

    /// Whether `reply` should be applied: chat replies always are, others
    /// only when they answer the newest request of their kind
    pub fn accepts(&self, reply: &AssistantReply) -> bool {
        reply.kind == RequestKind::Chat || self.is_current(reply.kind, reply.generation)
    }
}

/// Runs assistant requests off the calling thread
pub struct AssistantWorker {
    runtime: tokio::runtime::Runtime,
    assistant: Arc<dyn Assistant>,
    session: Arc<Mutex<ChatSession>>,
    sender: Sender<AssistantReply>,
    receiver: Receiver<AssistantReply>,
}

impl std::fmt::Debug for AssistantWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantWorker").finish_non_exhaustive()
    }
}

impl AssistantWorker {
    pub fn new(assistant: Arc<dyn Assistant>) -> Result<Self, AssistantError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("assistant")
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::channel();
        Ok(AssistantWorker {
            runtime,
            assistant,
            session: Arc::new(Mutex::new(ChatSession::new())),
            sender,
            receiver,
        })
    }

    /// Worker backed by Gemini; fails when no API key is configured
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let assistant = GeminiAssistant::from_config(config)?;
        Self::new(Arc::new(assistant))
    }

    pub fn explain(&self, generation: u64, code: String) {
        let assistant = Arc::clone(&self.assistant);
        self.spawn(RequestKind::Explain, generation, async move {
            assistant.explain(&code).await
        });
    }

    pub fn generate(&self, generation: u64, prompt: String) {
        let assistant = Arc::clone(&self.assistant);
        self.spawn(RequestKind::Generate, generation, async move {
            assistant.generate(&prompt).await
        });
    }

    /// Chat turns are applied to the shared session one at a time
    pub fn chat(&self, generation: u64, message: String) {
        let assistant = Arc::clone(&self.assistant);
        let session = Arc::clone(&self.session);
        self.spawn(RequestKind::Chat, generation, async move {
            let mut session = session.lock().await;
            assistant.chat(&mut session, &message).await
        });
    }

    fn spawn<F>(&self, kind: RequestKind, generation: u64, request: F)
    where
        F: std::future::Future<Output = String> + Send + 'static,
    {
        debug!(?kind, generation, "assistant request queued");
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let text = request.await;
            // The receiver is gone once the worker is dropped
            if sender
                .send(AssistantReply {
                    generation,
                    kind,
                    text,
                })
                .is_err()
            {
                trace!(?kind, generation, "assistant reply discarded");
            }
        });
    }

    /// Next finished reply, if any, without blocking
    pub fn try_recv(&self) -> Option<AssistantReply> {
        match self.receiver.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::prompts;
    use crate::assistant::tests::ScriptedAssistant;
    use std::time::Duration;

    fn next_reply(worker: &AssistantWorker) -> AssistantReply {
        worker
            .receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("no assistant reply within 5s")
    }

    #[test]
    fn test_generations_are_per_kind() {
        let mut generations = RequestGenerations::new();
        let first = generations.issue(RequestKind::Explain);
        let chat = generations.issue(RequestKind::Chat);
        assert!(generations.is_current(RequestKind::Explain, first));

        let second = generations.issue(RequestKind::Explain);
        assert!(second > first);
        assert!(!generations.is_current(RequestKind::Explain, first));
        assert!(generations.is_current(RequestKind::Chat, chat));

        generations.invalidate(RequestKind::Explain);
        assert!(!generations.is_current(RequestKind::Explain, second));
    }

    #[test]
    fn test_stale_reply_is_rejected() {
        let mut generations = RequestGenerations::new();
        let old = generations.issue(RequestKind::Generate);
        let new = generations.issue(RequestKind::Generate);
        let reply = |generation| AssistantReply {
            generation,
            kind: RequestKind::Generate,
            text: String::new(),
        };
        assert!(!generations.accepts(&reply(old)));
        assert!(generations.accepts(&reply(new)));
    }

    #[test]
    fn test_chat_replies_are_always_accepted() {
        let mut generations = RequestGenerations::new();
        let first = generations.issue(RequestKind::Chat);
        let _second = generations.issue(RequestKind::Chat);
        assert!(generations.accepts(&AssistantReply {
            generation: first,
            kind: RequestKind::Chat,
            text: "answer one".to_string(),
        }));
    }

    #[test]
    fn test_worker_delivers_replies() {
        let assistant = ScriptedAssistant::new(vec![Ok("analysis".to_string())]);
        let worker = AssistantWorker::new(Arc::new(assistant)).unwrap();

        worker.explain(7, "function sort() {}".to_string());
        let reply = next_reply(&worker);
        assert_eq!(
            reply,
            AssistantReply {
                generation: 7,
                kind: RequestKind::Explain,
                text: "analysis".to_string(),
            }
        );

        // scripted replies are exhausted: the chat degrades to its placeholder
        worker.chat(1, "hi".to_string());
        let reply = next_reply(&worker);
        assert_eq!(reply.text, prompts::NO_CHAT_REPLY);
        assert!(worker.try_recv().is_none());
    }
}
