//! Conversation session: ordered history plus transient loading/error status.
//!
//! A send is a two-phase append. The user turn is committed before the
//! network call, the assistant turn (or an error) after it resolves. All
//! state lives in a [`watch`] channel so presentation code can render from
//! [`ConversationSession::snapshot`] or react to [`ConversationSession::subscribe`]
//! while a request is outstanding.
//!
//! Only the text being sent is transmitted; earlier turns are not replayed as
//! context. Overlapping sends are allowed under [`SendPolicy::Concurrent`], in
//! which case assistant turns land in completion order, not issue order.

use crate::core::completion::{CompletionClient, CompletionError};
use crate::core::constants::{
    API_KEY_SECRET, MISSING_CREDENTIAL_MESSAGE, UNKNOWN_FAILURE_MESSAGE,
};
use crate::core::message::Message;
use crate::core::secrets::{SecretStore, SecretStoreError};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// What to do when `send_message` is called while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPolicy {
    /// Issue the request anyway. Callers are expected to gate sends on
    /// `is_loading` themselves.
    #[default]
    Concurrent,
    /// Refuse the send and leave all state untouched.
    RejectWhileLoading,
}

#[derive(Debug)]
pub enum SendError {
    CredentialMissing,
    Completion(CompletionError),
    /// Failures outside the completion call, such as the secret store being
    /// unreachable.
    Unknown(String),
}

impl SendError {
    /// The text stored in the session's `error` field.
    pub fn status_message(&self) -> String {
        match self {
            SendError::CredentialMissing => MISSING_CREDENTIAL_MESSAGE.to_string(),
            SendError::Completion(err) => wrap_failure(err.user_message()),
            SendError::Unknown(detail) => wrap_failure(detail),
        }
    }
}

fn wrap_failure(detail: &str) -> String {
    let detail = detail.trim();
    let detail = if detail.is_empty() {
        UNKNOWN_FAILURE_MESSAGE
    } else {
        detail
    };
    format!("Error: {detail}. Please try again.")
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_message())
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SendError::Completion(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SecretStoreError> for SendError {
    fn from(err: SecretStoreError) -> Self {
        SendError::Unknown(err.to_string())
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input; nothing changed.
    Ignored,
    /// Rejected under [`SendPolicy::RejectWhileLoading`]; nothing changed.
    Busy,
    /// An assistant turn was appended.
    Replied,
    Failed(SendError),
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub history: Vec<Message>,
    pub error: Option<String>,
    in_flight: usize,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

pub struct ConversationSession {
    secrets: Arc<dyn SecretStore>,
    client: Arc<dyn CompletionClient>,
    policy: SendPolicy,
    state: watch::Sender<SessionState>,
}

impl ConversationSession {
    pub fn new(secrets: Arc<dyn SecretStore>, client: Arc<dyn CompletionClient>) -> Self {
        Self::with_policy(secrets, client, SendPolicy::default())
    }

    pub fn with_policy(
        secrets: Arc<dyn SecretStore>,
        client: Arc<dyn CompletionClient>,
        policy: SendPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            secrets,
            client,
            policy,
            state,
        }
    }

    pub fn policy(&self) -> SendPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn history(&self) -> Vec<Message> {
        self.state.borrow().history.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self.rejects_overlap() && self.is_loading() {
            debug!("send rejected while a request is in flight");
            return SendOutcome::Busy;
        }

        self.state.send_modify(|state| state.error = None);

        let credential = match self.lookup_credential() {
            Ok(credential) => credential,
            Err(err) => {
                debug!(error = %err, "send stopped before the request");
                let message = err.status_message();
                self.state.send_modify(|state| state.error = Some(message));
                return SendOutcome::Failed(err);
            }
        };

        let Some(in_flight) = self.begin_request(text) else {
            return SendOutcome::Busy;
        };

        let result = self.client.complete(text, &credential).await;

        match result {
            Ok(reply) => {
                debug!(reply_len = reply.len(), "completion received");
                in_flight.finish(|state| state.history.push(Message::assistant(reply)));
                SendOutcome::Replied
            }
            Err(err) => {
                let err = SendError::Completion(err);
                debug!(error = %err, "completion failed");
                let message = err.status_message();
                in_flight.finish(|state| state.error = Some(message));
                SendOutcome::Failed(err)
            }
        }
    }

    fn rejects_overlap(&self) -> bool {
        self.policy == SendPolicy::RejectWhileLoading
    }

    fn lookup_credential(&self) -> Result<String, SendError> {
        self.secrets
            .get(API_KEY_SECRET)?
            .filter(|key| !key.trim().is_empty())
            .ok_or(SendError::CredentialMissing)
    }

    /// Append the user turn and mark a request in flight in one step.
    fn begin_request(&self, text: &str) -> Option<InFlight<'_>> {
        let reject = self.rejects_overlap();
        let mut admitted = false;
        self.state.send_modify(|state| {
            if reject && state.is_loading() {
                return;
            }
            state.history.push(Message::user(text));
            state.in_flight += 1;
            admitted = true;
        });
        admitted.then(|| InFlight {
            state: &self.state,
            armed: true,
        })
    }
}

/// Clears one unit of in-flight status when the request resolves, or when
/// the send future is dropped or unwinds before it does.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
    armed: bool,
}

impl InFlight<'_> {
    fn finish(mut self, update: impl FnOnce(&mut SessionState)) {
        self.armed = false;
        self.state.send_modify(|state| {
            update(state);
            state.in_flight = state.in_flight.saturating_sub(1);
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .send_modify(|state| state.in_flight = state.in_flight.saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TranscriptRole;
    use crate::core::secrets::MemorySecretStore;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Answers from a script and records what it was asked.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            prompt: &str,
            credential: &str,
        ) -> Result<String, CompletionError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), credential.to_string()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected completion call")
        }
    }

    /// Each call waits for the next queued oneshot to be resolved by the test.
    #[derive(Default)]
    struct GatedClient {
        gates: Mutex<VecDeque<oneshot::Receiver<Result<String, CompletionError>>>>,
    }

    impl GatedClient {
        fn with_gates(
            count: usize,
        ) -> (
            Arc<Self>,
            Vec<oneshot::Sender<Result<String, CompletionError>>>,
        ) {
            let mut senders = Vec::new();
            let mut receivers = VecDeque::new();
            for _ in 0..count {
                let (tx, rx) = oneshot::channel();
                senders.push(tx);
                receivers.push_back(rx);
            }
            (
                Arc::new(Self {
                    gates: Mutex::new(receivers),
                }),
                senders,
            )
        }
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn complete(&self, _prompt: &str, _credential: &str) -> Result<String, CompletionError> {
            let gate = self
                .gates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected completion call");
            gate.await.unwrap_or(Err(CompletionError::MalformedResponse))
        }
    }

    fn transport(message: &str) -> CompletionError {
        CompletionError::Transport {
            status: Some(StatusCode::BAD_REQUEST),
            message: message.to_string(),
        }
    }

    fn with_key(key: &str) -> Arc<dyn SecretStore> {
        Arc::new(MemorySecretStore::with_secret(API_KEY_SECRET, key))
    }

    async fn wait_until_loading(session: &ConversationSession, loading: bool) {
        let mut rx = session.subscribe();
        rx.wait_for(|state| state.is_loading() == loading)
            .await
            .expect("session dropped");
    }

    #[tokio::test]
    async fn reply_appends_user_then_assistant_turn() {
        let client = ScriptedClient::new(vec![Ok("Hi there".to_string())]);
        let session = ConversationSession::new(with_key("k1"), client.clone());

        let outcome = session.send_message("Hello").await;

        assert!(matches!(outcome, SendOutcome::Replied));
        assert_eq!(
            session.history(),
            vec![Message::user("Hello"), Message::assistant("Hi there")]
        );
        assert_eq!(session.error(), None);
        assert!(!session.is_loading());
        assert_eq!(client.calls(), vec![("Hello".to_string(), "k1".to_string())]);
    }

    #[tokio::test]
    async fn missing_credential_leaves_history_untouched() {
        let client = ScriptedClient::new(Vec::new());
        let session =
            ConversationSession::new(Arc::new(MemorySecretStore::new()), client.clone());

        let outcome = session.send_message("Hello").await;

        assert!(matches!(
            outcome,
            SendOutcome::Failed(SendError::CredentialMissing)
        ));
        assert!(session.history().is_empty());
        assert_eq!(session.error().as_deref(), Some(MISSING_CREDENTIAL_MESSAGE));
        assert!(!session.is_loading());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_stored_credential_counts_as_missing() {
        let session =
            ConversationSession::new(with_key(""), ScriptedClient::new(Vec::new()));

        session.send_message("Hello").await;

        assert_eq!(session.error().as_deref(), Some(MISSING_CREDENTIAL_MESSAGE));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn failed_completion_keeps_only_the_user_turn() {
        let client = ScriptedClient::new(vec![Err(transport("API key not valid"))]);
        let session = ConversationSession::new(with_key("k1"), client);

        let outcome = session.send_message("Hello").await;

        assert!(matches!(outcome, SendOutcome::Failed(SendError::Completion(_))));
        assert_eq!(session.history(), vec![Message::user("Hello")]);
        let error = session.error().expect("error should be set");
        assert!(error.contains("API key not valid"), "error: {error}");
        assert_eq!(error, "Error: API key not valid. Please try again.");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn repeated_failures_report_only_the_latest() {
        let client = ScriptedClient::new(vec![
            Err(transport("first failure")),
            Err(transport("second failure")),
            Err(transport("third failure")),
        ]);
        let session = ConversationSession::new(with_key("k1"), client);

        for text in ["one", "two", "three"] {
            session.send_message(text).await;
        }

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|turn| turn.role == TranscriptRole::User));
        let error = session.error().expect("error should be set");
        assert!(error.contains("third failure"));
        assert!(!error.contains("second failure"));
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let client = ScriptedClient::new(vec![Err(transport("boom"))]);
        let session = ConversationSession::new(with_key("k1"), client.clone());
        session.send_message("x").await;
        let before = session.snapshot();

        for text in ["", "   ", "\n\t"] {
            assert!(matches!(session.send_message(text).await, SendOutcome::Ignored));
        }

        assert_eq!(session.snapshot(), before);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_response_sets_error_without_assistant_turn() {
        let client = ScriptedClient::new(vec![Err(CompletionError::MalformedResponse)]);
        let session = ConversationSession::new(with_key("k1"), client);

        session.send_message("Hello").await;

        assert_eq!(session.history(), vec![Message::user("Hello")]);
        assert_eq!(
            session.error().as_deref(),
            Some("Error: Invalid response format from API. Please try again.")
        );
    }

    #[tokio::test]
    async fn new_send_clears_previous_error() {
        let client = ScriptedClient::new(vec![Err(transport("boom")), Ok("fine".to_string())]);
        let session = ConversationSession::new(with_key("k1"), client);

        session.send_message("first").await;
        assert!(session.error().is_some());
        session.send_message("second").await;

        assert_eq!(session.error(), None);
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn only_the_latest_text_is_sent_as_prompt() {
        let client = ScriptedClient::new(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let session = ConversationSession::new(with_key("k1"), client.clone());

        session.send_message("first question").await;
        session.send_message("follow up").await;

        let prompts: Vec<String> = client.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(prompts, vec!["first question", "follow up"]);
    }

    #[tokio::test]
    async fn secret_store_failure_is_reported_as_unknown() {
        struct BrokenStore;

        impl SecretStore for BrokenStore {
            fn get(&self, _name: &str) -> Result<Option<String>, SecretStoreError> {
                Err(SecretStoreError::Storage("backend offline".to_string()))
            }

            fn set(&self, _name: &str, _value: &str) -> Result<(), SecretStoreError> {
                Ok(())
            }

            fn delete(&self, _name: &str) -> Result<(), SecretStoreError> {
                Ok(())
            }
        }

        let session = ConversationSession::new(Arc::new(BrokenStore), ScriptedClient::new(Vec::new()));

        let outcome = session.send_message("Hello").await;

        assert!(matches!(outcome, SendOutcome::Failed(SendError::Unknown(_))));
        assert!(session.history().is_empty());
        assert!(session.error().unwrap().contains("backend offline"));
        assert!(!session.is_loading());
    }

    #[test]
    fn unknown_failure_without_detail_uses_generic_text() {
        assert_eq!(
            SendError::Unknown(String::new()).status_message(),
            "Error: An unknown error occurred. Please try again."
        );
        assert_eq!(
            SendError::Unknown("disk full".to_string()).status_message(),
            "Error: disk full. Please try again."
        );
    }

    #[tokio::test]
    async fn loading_is_set_while_request_is_outstanding() {
        let (client, mut gates) = GatedClient::with_gates(1);
        let session = Arc::new(ConversationSession::new(with_key("k1"), client));

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_message("Hello").await })
        };
        wait_until_loading(&session, true).await;
        assert_eq!(session.history(), vec![Message::user("Hello")]);

        gates.remove(0).send(Ok("Hi".to_string())).unwrap();
        task.await.unwrap();

        assert!(!session.is_loading());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_sends_resolve_in_completion_order() {
        let (client, mut gates) = GatedClient::with_gates(2);
        let session = Arc::new(ConversationSession::new(with_key("k1"), client));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_message("first").await })
        };
        wait_until_loading(&session, true).await;
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_message("second").await })
        };
        let mut rx = session.subscribe();
        rx.wait_for(|state| state.history.len() == 2).await.unwrap();

        let first_gate = gates.remove(0);
        gates.remove(0).send(Ok("reply to second".to_string())).unwrap();
        second.await.unwrap();
        assert!(session.is_loading(), "first request is still in flight");

        first_gate.send(Ok("reply to first".to_string())).unwrap();
        first.await.unwrap();

        assert!(!session.is_loading());
        assert_eq!(
            session.history(),
            vec![
                Message::user("first"),
                Message::user("second"),
                Message::assistant("reply to second"),
                Message::assistant("reply to first"),
            ]
        );
    }

    #[tokio::test]
    async fn reject_policy_refuses_overlapping_sends() {
        let (client, mut gates) = GatedClient::with_gates(1);
        let session = Arc::new(ConversationSession::with_policy(
            with_key("k1"),
            client,
            SendPolicy::RejectWhileLoading,
        ));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_message("first").await })
        };
        wait_until_loading(&session, true).await;

        let outcome = session.send_message("second").await;
        assert!(matches!(outcome, SendOutcome::Busy));
        assert_eq!(session.history(), vec![Message::user("first")]);

        gates.remove(0).send(Ok("done".to_string())).unwrap();
        first.await.unwrap();
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn dropping_the_send_future_clears_loading() {
        let (client, _gates) = GatedClient::with_gates(1);
        let session = ConversationSession::new(with_key("k1"), client);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), session.send_message("Hello")).await;

        assert!(timed_out.is_err());
        assert!(!session.is_loading());
        assert_eq!(session.history(), vec![Message::user("Hello")]);
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn subscribers_observe_each_phase() {
        let (client, mut gates) = GatedClient::with_gates(1);
        let session = Arc::new(ConversationSession::new(with_key("k1"), client));
        let mut rx = session.subscribe();

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_message("Hello").await })
        };

        let pending = rx.wait_for(|state| state.is_loading()).await.unwrap().clone();
        assert_eq!(pending.history, vec![Message::user("Hello")]);

        gates.remove(0).send(Ok("Hi".to_string())).unwrap();
        let done = rx
            .wait_for(|state| !state.is_loading())
            .await
            .unwrap()
            .clone();
        assert_eq!(done.history.len(), 2);
        task.await.unwrap();
    }
}
