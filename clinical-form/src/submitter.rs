//! Query submission.
//!
//! A submission moves the form `Idle -> InFlight -> Idle`. The in-flight flag
//! is owned by [`InFlightGuard`], so every exit path (answer, failure, or the
//! future being dropped) clears it, and clearing it is always the last write.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::PredictionClient;
use crate::form::{Begin, ClinicalForm, WeakForm};
use crate::models::PredictRequest;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a medical query.";
pub const REQUEST_FAILED_MESSAGE: &str = "Could not get suggestions. Please try again.";

/// How a call to submit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Trimmed query was empty; no request was made.
    EmptyQuery,
    /// Another submission was still outstanding; nothing changed.
    Busy,
    /// The service answered and the response text was replaced.
    Answered,
    /// The request failed and the fixed error text was shown.
    Failed,
    /// The form was dropped before the request settled.
    Detached,
}

pub struct QuerySubmitter<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> Clone for QuerySubmitter<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: PredictionClient> QuerySubmitter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl<C: PredictionClient + ?Sized + 'static> QuerySubmitter<C> {
    pub fn from_arc(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Submits the form's current query and waits for it to settle.
    pub async fn submit(&self, form: &ClinicalForm) -> Submission {
        match form.try_begin(EMPTY_QUERY_MESSAGE) {
            Begin::Busy => {
                debug!("Submission already in flight");
                Submission::Busy
            }
            Begin::EmptyQuery => Submission::EmptyQuery,
            Begin::Started(query) => {
                settle(self.client.as_ref(), InFlightGuard::new(form), query).await
            }
        }
    }

    /// Starts a submission in the background.
    ///
    /// The flag is set before this returns, so the caller can render the
    /// loading state and refuse further submits immediately. The task only
    /// holds a weak handle to the form.
    pub fn spawn(&self, form: &ClinicalForm) -> JoinHandle<Submission> {
        match form.try_begin(EMPTY_QUERY_MESSAGE) {
            Begin::Busy => tokio::spawn(std::future::ready(Submission::Busy)),
            Begin::EmptyQuery => tokio::spawn(std::future::ready(Submission::EmptyQuery)),
            Begin::Started(query) => {
                let client = self.client.clone();
                let guard = InFlightGuard::new(form);
                tokio::spawn(async move { settle(client.as_ref(), guard, query).await })
            }
        }
    }
}

/// Created as soon as the flag is set, so even a task cancelled before its
/// first poll releases it.
struct InFlightGuard {
    form: WeakForm,
}

impl InFlightGuard {
    fn new(form: &ClinicalForm) -> Self {
        Self {
            form: form.downgrade(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(form) = self.form.upgrade() {
            form.finish();
        }
    }
}

async fn settle<C: PredictionClient + ?Sized>(
    client: &C,
    guard: InFlightGuard,
    query: String,
) -> Submission {
    info!("Requesting suggestions");
    let (text, outcome) = match client.predict(&PredictRequest { query }).await {
        Ok(response) => (response.response, Submission::Answered),
        Err(e) => {
            error!("Error fetching suggestions: {}", e);
            (REQUEST_FAILED_MESSAGE.to_string(), Submission::Failed)
        }
    };

    let result = match guard.form.upgrade() {
        Some(form) => {
            form.set_response(text);
            outcome
        }
        None => {
            debug!("Form closed before the request settled; discarding result");
            Submission::Detached
        }
    };
    drop(guard);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpPredictionClient;
    use crate::error::ClientError;
    use crate::models::PredictResponse;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns a canned answer, records every query and whether the form was
    /// in flight while the request was outstanding.
    struct StubClient {
        answer: Option<String>,
        observed: Option<ClinicalForm>,
        queries: Mutex<Vec<String>>,
        in_flight_during_call: Mutex<Vec<bool>>,
    }

    impl StubClient {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                observed: None,
                queries: Mutex::new(Vec::new()),
                in_flight_during_call: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                ..Self::answering("")
            }
        }

        fn observing(mut self, form: &ClinicalForm) -> Self {
            self.observed = Some(form.clone());
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PredictionClient for StubClient {
        async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ClientError> {
            self.queries.lock().unwrap().push(request.query.clone());
            if let Some(form) = &self.observed {
                self.in_flight_during_call
                    .lock()
                    .unwrap()
                    .push(form.is_in_flight());
            }
            match &self.answer {
                Some(answer) => Ok(PredictResponse {
                    response: answer.clone(),
                }),
                None => Err(ClientError::Status {
                    status: StatusCode::BAD_GATEWAY,
                    body: "upstream timed out".to_string(),
                }),
            }
        }
    }

    /// Blocks every request until the gate is opened.
    struct GatedClient {
        gate: Arc<Notify>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionClient for GatedClient {
        async fn predict(&self, _request: &PredictRequest) -> Result<PredictResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(PredictResponse {
                response: "done".to_string(),
            })
        }
    }

    fn gated() -> (QuerySubmitter<GatedClient>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let submitter = QuerySubmitter::new(GatedClient {
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        });
        (submitter, gate)
    }

    #[tokio::test]
    async fn test_whitespace_queries_never_reach_the_service() {
        for query in ["", "  ", "\t", " \n \r\n "] {
            let form = ClinicalForm::new();
            form.set_query(query);
            let submitter = QuerySubmitter::new(StubClient::answering("unused").observing(&form));

            let outcome = submitter.submit(&form).await;

            assert_eq!(outcome, Submission::EmptyQuery);
            assert_eq!(form.response(), EMPTY_QUERY_MESSAGE);
            assert!(!form.is_in_flight());
            assert!(submitter.client().queries().is_empty());
        }
    }

    #[tokio::test]
    async fn test_successful_submission_replaces_response() {
        let form = ClinicalForm::new();
        form.set_query("fever and cough");
        let submitter =
            QuerySubmitter::new(StubClient::answering("Consider viral infection.").observing(&form));

        let outcome = submitter.submit(&form).await;

        assert_eq!(outcome, Submission::Answered);
        assert_eq!(form.response(), "Consider viral infection.");
        assert_eq!(submitter.client().queries(), vec!["fever and cough"]);
        assert_eq!(
            *submitter.client().in_flight_during_call.lock().unwrap(),
            vec![true]
        );
        assert!(!form.is_in_flight());
    }

    #[tokio::test]
    async fn test_failed_submission_shows_fixed_error() {
        let form = ClinicalForm::new();
        form.set_query("chest pain");
        let submitter = QuerySubmitter::new(StubClient::failing().observing(&form));

        let outcome = submitter.submit(&form).await;

        assert_eq!(outcome, Submission::Failed);
        assert_eq!(form.response(), REQUEST_FAILED_MESSAGE);
        assert_eq!(
            *submitter.client().in_flight_during_call.lock().unwrap(),
            vec![true]
        );
        assert!(!form.is_in_flight());
    }

    #[tokio::test]
    async fn test_query_is_sent_untrimmed() {
        let form = ClinicalForm::new();
        form.set_query("  chest pain\n");
        let submitter = QuerySubmitter::new(StubClient::answering("ok"));

        submitter.submit(&form).await;

        assert_eq!(submitter.client().queries(), vec!["  chest pain\n"]);
    }

    #[tokio::test]
    async fn test_each_answer_overwrites_the_previous_one() {
        let form = ClinicalForm::new();
        form.set_query("first");
        QuerySubmitter::new(StubClient::answering("one"))
            .submit(&form)
            .await;
        form.set_query("second");
        QuerySubmitter::new(StubClient::answering("two"))
            .submit(&form)
            .await;

        assert_eq!(form.response(), "two");
    }

    #[tokio::test]
    async fn test_form_usable_after_failure() {
        let form = ClinicalForm::new();
        form.set_query("chest pain");
        QuerySubmitter::new(StubClient::failing())
            .submit(&form)
            .await;

        let outcome = QuerySubmitter::new(StubClient::answering("Rest and fluids."))
            .submit(&form)
            .await;

        assert_eq!(outcome, Submission::Answered);
        assert_eq!(form.response(), "Rest and fluids.");
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_refused() {
        let (submitter, gate) = gated();
        let form = ClinicalForm::new();
        form.set_query("dizziness");

        let first = submitter.spawn(&form);
        assert!(form.is_in_flight());

        let second = submitter.submit(&form).await;
        assert_eq!(second, Submission::Busy);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Submission::Answered);
        assert_eq!(submitter.client().calls.load(Ordering::SeqCst), 1);
        assert!(!form.is_in_flight());
        assert_eq!(form.response(), "done");
    }

    #[tokio::test]
    async fn test_dropped_form_discards_result() {
        let (submitter, gate) = gated();
        let form = ClinicalForm::new();
        form.set_query("blurred vision");

        let handle = submitter.spawn(&form);
        drop(form);
        gate.notify_one();

        assert_eq!(handle.await.unwrap(), Submission::Detached);
    }

    #[tokio::test]
    async fn test_cancelled_submission_clears_flag() {
        let (submitter, _gate) = gated();
        let form = ClinicalForm::new();
        form.set_query("back pain");

        let handle = submitter.spawn(&form);
        assert!(form.is_in_flight());
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert!(!form.is_in_flight());
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "query": "fever and cough" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "response": "Consider viral infection."
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let form = ClinicalForm::new();
        form.set_query("fever and cough");
        let submitter =
            QuerySubmitter::new(HttpPredictionClient::new(format!("{}/predict", mock_server.uri())));

        assert_eq!(submitter.submit(&form).await, Submission::Answered);
        assert_eq!(form.response(), "Consider viral infection.");
    }

    #[tokio::test]
    async fn test_end_to_end_service_down() {
        let form = ClinicalForm::new();
        form.set_query("chest pain");
        let submitter = QuerySubmitter::new(HttpPredictionClient::new("http://127.0.0.1:1/predict"));

        assert_eq!(submitter.submit(&form).await, Submission::Failed);
        assert_eq!(form.response(), REQUEST_FAILED_MESSAGE);
        assert!(!form.is_in_flight());
    }
}
