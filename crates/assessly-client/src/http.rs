//! HTTP backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use assessly_core::error::BackendError;
use assessly_core::model::{route_id, Answers, Assessment, SubmitRequest, SubmitResponse, Submission};
use assessly_core::traits::{AssessmentBackend, FeedbackUpdate};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend reached over the platform's REST API.
pub struct HttpBackend {
    access_token: String,
    base_url: reqwest::Url,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        access_token: &str,
        timeout_secs: Option<u64>,
    ) -> Result<Self, BackendError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| BackendError::InvalidRequest(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidRequest(format!(
                "base URL {base_url} cannot take a path"
            )));
        }
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            access_token: access_token.to_string(),
            base_url,
            timeout_secs,
            client,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can take a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let start = Instant::now();
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout_secs)
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        tracing::debug!(
            status,
            latency_ms = start.elapsed().as_millis() as u64,
            "backend responded"
        );
        if status < 400 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(match status {
            400 | 422 => BackendError::InvalidRequest(message),
            401 | 403 => BackendError::Unauthorized(message),
            404 => BackendError::NotFound(message),
            409 => BackendError::AlreadySubmitted(message),
            _ => BackendError::Api { status, message },
        })
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("failed to parse response: {e}")))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct AssessmentList {
    #[serde(default)]
    assessments: Vec<Assessment>,
}

#[derive(Deserialize)]
struct AssessmentEnvelope {
    assessment: Assessment,
}

#[derive(Deserialize)]
struct SubmissionList {
    #[serde(default)]
    submissions: Vec<Submission>,
}

#[async_trait]
impl AssessmentBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn list_assessments(&self) -> Result<Vec<Assessment>, BackendError> {
        let response = self.send(self.client.get(self.url(&["assessments"]))).await?;
        let list: AssessmentList = Self::json(response).await?;
        Ok(list.assessments)
    }

    #[instrument(skip(self))]
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment, BackendError> {
        let response = self
            .send(
                self.client
                    .get(self.url(&["assessments", route_id(id)])),
            )
            .await?;
        let envelope: AssessmentEnvelope = Self::json(response).await?;
        Ok(envelope.assessment)
    }

    #[instrument(skip(self, answers), fields(answered = answers.len()))]
    async fn submit(
        &self,
        assessment_id: &str,
        answers: &Answers,
    ) -> Result<SubmitResponse, BackendError> {
        let body = SubmitRequest {
            answers: answers.clone(),
        };
        let response = self
            .send(
                self.client
                    .post(self.url(&["assessments", route_id(assessment_id), "submit"]))
                    .json(&body),
            )
            .await?;
        let result: SubmitResponse = Self::json(response).await?;
        if result.score > result.total_questions {
            return Err(BackendError::InvalidResponse(format!(
                "score {} exceeds total questions {}",
                result.score, result.total_questions
            )));
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn list_submissions(&self) -> Result<Vec<Submission>, BackendError> {
        let response = self.send(self.client.get(self.url(&["submissions"]))).await?;
        let list: SubmissionList = Self::json(response).await?;
        Ok(list.submissions)
    }

    #[instrument(skip(self, update))]
    async fn save_feedback(
        &self,
        submission_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<(), BackendError> {
        self.send(
            self.client
                .put(self.url(&["submissions", submission_id, "feedback"]))
                .json(update),
        )
        .await?;
        Ok(())
    }
}
