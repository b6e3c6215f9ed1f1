//! Question dispatch and the processing gate.
//!
//! A turn is split around its single network call: [`Session::begin_query`]
//! closes the gate and updates the transcript, the caller performs the
//! request, and [`Session::complete_query`] folds the outcome back in. The
//! event loop runs the request on a tokio task through [`QueryService`];
//! one-shot callers use [`send_query`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{DispatchError, MedAssistBackend, QueryRequest, QueryResponse};
use crate::core::constants::{CONNECTIVITY_ERROR, GENERIC_APPLICATION_ERROR};
use crate::core::credentials::SettingsStore;
use crate::core::message::{MessageId, Source, TranscriptRole};
use crate::core::session::Session;

/// Identifies an outstanding query so its outcome can be matched back to the
/// conversation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub generation: u64,
    pub loading_id: MessageId,
}

/// How a completed turn ended, for callers that report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered(MessageId),
    Failed(MessageId),
    /// The conversation was reset while the query was in flight.
    Discarded,
}

impl Session {
    /// Start a turn from the current input.
    ///
    /// Returns `None` without touching anything when the trimmed input is
    /// empty or another query is outstanding.
    pub fn begin_query(&mut self, store: &SettingsStore) -> Option<(QueryTicket, QueryRequest)> {
        let question = self.input.text.trim().to_string();
        if question.is_empty() {
            return None;
        }
        if self.processing {
            debug!("query refused; another one is in flight");
            return None;
        }

        self.processing = true;
        self.welcome_visible = false;
        self.transcript
            .add_message(TranscriptRole::User, question.clone(), None);
        self.input.clear();
        let loading_id = self.transcript.add_loading();

        let request = QueryRequest {
            question,
            api_key: store.credential_or_none(),
        };
        info!(
            chars = request.question.chars().count(),
            with_key = request.api_key.is_some(),
            "dispatching query"
        );

        Some((
            QueryTicket {
                generation: self.generation,
                loading_id,
            },
            request,
        ))
    }

    /// Fold the result of a query back into the session and release the gate.
    pub fn complete_query(
        &mut self,
        ticket: QueryTicket,
        result: Result<QueryResponse, DispatchError>,
    ) -> TurnOutcome {
        self.processing = false;
        self.input_focused = true;

        if ticket.generation != self.generation {
            debug!(
                issued = ticket.generation,
                current = self.generation,
                "dropping completion from a previous conversation"
            );
            return TurnOutcome::Discarded;
        }

        self.transcript.remove_message(&ticket.loading_id);

        match result {
            Ok(response) => {
                let sources: Vec<Source> = response.sources.into_iter().map(Source::from).collect();
                info!(sources = sources.len(), "query answered");
                let id = self
                    .transcript
                    .add_answer(response.answer, response.answer_raw, sources);
                TurnOutcome::Answered(id)
            }
            Err(err) => {
                warn!(%err, "query failed");
                let id = self.transcript.add_notice(notice_for(&err));
                TurnOutcome::Failed(id)
            }
        }
    }
}

/// User-facing text for a failed query.
pub fn notice_for(err: &DispatchError) -> String {
    match err {
        DispatchError::Application { .. } => err
            .server_message()
            .unwrap_or(GENERIC_APPLICATION_ERROR)
            .to_string(),
        DispatchError::Transport { .. } => CONNECTIVITY_ERROR.to_string(),
    }
}

/// Run one full turn in place. Returns `None` when the gate refused it.
pub async fn send_query(
    session: &mut Session,
    backend: &dyn MedAssistBackend,
    store: &SettingsStore,
) -> Option<TurnOutcome> {
    let (ticket, request) = session.begin_query(store)?;
    let result = backend.query(&request).await;
    Some(session.complete_query(ticket, result))
}

#[derive(Debug)]
pub struct QueryCompletion {
    pub ticket: QueryTicket,
    pub result: Result<QueryResponse, DispatchError>,
}

/// Runs queries off the event loop and reports each outcome on a channel.
#[derive(Clone)]
pub struct QueryService {
    backend: Arc<dyn MedAssistBackend>,
    tx: mpsc::UnboundedSender<QueryCompletion>,
}

impl QueryService {
    pub fn new(
        backend: Arc<dyn MedAssistBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<QueryCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { backend, tx }, rx)
    }

    pub fn spawn(&self, ticket: QueryTicket, request: QueryRequest) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = backend.query(&request).await;
            let _ = tx.send(QueryCompletion { ticket, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiSource, HealthResponse};
    use crate::core::credentials::MemoryBackend;
    use crate::core::message::MessageKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted query results and records every request it sees.
    struct FakeBackend {
        results: Mutex<Vec<Result<QueryResponse, DispatchError>>>,
        requests: Mutex<Vec<QueryRequest>>,
    }

    impl FakeBackend {
        fn new(results: Vec<Result<QueryResponse, DispatchError>>) -> Self {
            Self {
                results: Mutex::new(results),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<QueryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MedAssistBackend for FakeBackend {
        async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError> {
            self.requests.lock().unwrap().push(request.clone());
            self.results.lock().unwrap().remove(0)
        }

        async fn health(&self) -> Result<HealthResponse, DispatchError> {
            Err(DispatchError::transport("not scripted"))
        }
    }

    fn answer(similarity: f64, text: &str) -> QueryResponse {
        QueryResponse {
            answer: "<p>Hemophilia A is a clotting factor VIII deficiency.</p>".to_string(),
            answer_raw: Some("Hemophilia A is a clotting factor VIII deficiency.".to_string()),
            sources: vec![ApiSource {
                source: "hematology.pdf".to_string(),
                page: serde_json::json!(12),
                similarity,
                text: text.to_string(),
            }],
            question: None,
        }
    }

    fn session_with_input(text: &str) -> Session {
        let mut session = Session::new();
        session.input.set_text(text);
        session
    }

    fn assert_gate_released(session: &Session) {
        assert!(!session.is_processing());
        assert!(session.submit_enabled());
        assert!(session.input_focused());
        assert!(!session.transcript().has_loading());
    }

    #[test]
    fn blank_input_is_ignored() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("   \n ");
        assert!(session.begin_query(&store).is_none());
        assert!(session.transcript().is_empty());
        assert!(session.welcome_visible());
        assert!(!session.is_processing());
    }

    #[test]
    fn begin_query_appends_question_then_placeholder() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("  What is hemophilia A?  ");

        let (ticket, request) = session.begin_query(&store).unwrap();

        assert!(session.is_processing());
        assert!(!session.submit_enabled());
        assert!(!session.welcome_visible());
        assert!(session.input.text.is_empty());
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user());
        assert_eq!(messages[0].content, "What is hemophilia A?");
        assert_eq!(messages[1].id, ticket.loading_id);
        assert!(messages[1].is_loading());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "question": "What is hemophilia A?" })
        );
    }

    #[test]
    fn stored_key_is_sent_with_the_question() {
        let store = SettingsStore::new(Box::new(MemoryBackend::with_value("gsk_abc")));
        let mut session = session_with_input("q");
        let (_, request) = session.begin_query(&store).unwrap();
        assert_eq!(request.api_key.as_deref(), Some("gsk_abc"));
    }

    #[test]
    fn second_submission_is_refused_while_processing() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("first");
        let (ticket, _) = session.begin_query(&store).unwrap();

        session.input.set_text("second");
        assert!(session.begin_query(&store).is_none());
        assert_eq!(session.input.text, "second");
        assert_eq!(session.transcript().len(), 2);

        session.complete_query(ticket, Ok(answer(0.5, "x")));
        assert!(session.begin_query(&store).is_some());
    }

    #[test]
    fn success_replaces_placeholder_with_answer() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("What is hemophilia A?");
        let (ticket, _) = session.begin_query(&store).unwrap();

        let outcome = session.complete_query(ticket.clone(), Ok(answer(0.842, "factor VIII")));

        assert_gate_released(&session);
        assert!(session.transcript().get(&ticket.loading_id).is_none());
        let last = session.transcript().last().unwrap();
        assert_eq!(outcome, TurnOutcome::Answered(last.id.clone()));
        assert_eq!(last.kind, MessageKind::Text);
        assert!(last.content.starts_with("<p>Hemophilia A"));
        assert_eq!(last.sources.len(), 1);
        assert_eq!(last.sources[0].page, Some(12));
        assert!(last.plain.is_some());
    }

    #[test]
    fn application_error_shows_server_message() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("q");
        let (ticket, _) = session.begin_query(&store).unwrap();

        let outcome = session.complete_query(
            ticket,
            Err(DispatchError::Application {
                status: 500,
                message: Some("index unavailable".to_string()),
            }),
        );

        assert_gate_released(&session);
        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        let last = session.transcript().last().unwrap();
        assert!(last.is_notice());
        assert!(last.content.contains("index unavailable"));
    }

    #[test]
    fn application_error_without_message_uses_generic_text() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("q");
        let (ticket, _) = session.begin_query(&store).unwrap();
        session.complete_query(
            ticket,
            Err(DispatchError::Application {
                status: 400,
                message: Some("   ".to_string()),
            }),
        );
        assert_eq!(
            session.transcript().last().unwrap().content,
            GENERIC_APPLICATION_ERROR
        );
    }

    #[test]
    fn transport_error_shows_connectivity_notice() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("q");
        let (ticket, _) = session.begin_query(&store).unwrap();
        session.complete_query(ticket, Err(DispatchError::transport("connection refused")));

        assert_gate_released(&session);
        assert_eq!(session.transcript().last().unwrap().content, CONNECTIVITY_ERROR);
    }

    #[test]
    fn completion_after_new_chat_only_releases_the_gate() {
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("old question");
        let (ticket, _) = session.begin_query(&store).unwrap();

        session.start_new_chat();
        assert!(session.is_processing());
        assert!(session.begin_query(&store).is_none());

        let outcome = session.complete_query(ticket, Ok(answer(0.9, "stale")));
        assert_eq!(outcome, TurnOutcome::Discarded);
        assert!(session.transcript().is_empty());
        assert!(session.welcome_visible());
        assert_gate_released(&session);
    }

    #[tokio::test]
    async fn send_query_runs_exactly_one_request_per_turn() {
        let backend = FakeBackend::new(vec![
            Ok(answer(0.7, "a")),
            Err(DispatchError::transport("timed out")),
        ]);
        let store = SettingsStore::in_memory();
        let mut session = Session::new();

        session.input.set_text("first");
        let first = send_query(&mut session, &backend, &store).await;
        assert!(matches!(first, Some(TurnOutcome::Answered(_))));

        session.input.set_text("second");
        let second = send_query(&mut session, &backend, &store).await;
        assert!(matches!(second, Some(TurnOutcome::Failed(_))));

        assert!(send_query(&mut session, &backend, &store).await.is_none());

        let questions: Vec<_> = backend
            .requests()
            .into_iter()
            .map(|request| request.question)
            .collect();
        assert_eq!(questions, vec!["first", "second"]);
        assert_eq!(session.transcript().len(), 4);
        assert_gate_released(&session);
    }

    #[tokio::test]
    async fn query_service_reports_completion_on_its_channel() {
        let backend = Arc::new(FakeBackend::new(vec![Ok(answer(0.6, "b"))]));
        let (service, mut rx) = QueryService::new(backend.clone());
        let store = SettingsStore::in_memory();
        let mut session = session_with_input("async question");

        let (ticket, request) = session.begin_query(&store).unwrap();
        service.spawn(ticket.clone(), request);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.ticket, ticket);
        session.complete_query(completion.ticket, completion.result);

        assert_gate_released(&session);
        assert_eq!(backend.requests().len(), 1);
        assert_eq!(session.transcript().len(), 2);
    }
}
