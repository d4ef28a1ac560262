use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use vocab_utils::Card;
use vocab_utils::prompt::{PromptKind, VocabularyPair, compose_prompt, parse_vocabulary_lines};
use vocab_utils::relay::{AnswerRequest, AnswerResponse};
use vocab_utils::story::{StoryResponse, parse_story};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const NO_ANSWER: &str = "No answer returned";
pub const NO_SENTENCE_FEEDBACK: &str = "Sorry, I could not get a response.";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Network response was not ok ({0})")]
    Status(reqwest::StatusCode),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(reqwest::Error),

    #[error("could not read the relay response: {0}")]
    Decode(reqwest::Error),

    #[error("superseded by a newer request")]
    Superseded,
}

/// Talks to the relay's `getAnswer` route.
///
/// Clones share a request counter: when a request finishes after a newer one has been started,
/// its result is dropped as [`RelayError::Superseded`] so a stale answer never replaces a fresh
/// one.
#[derive(Clone, Debug)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    latest: Arc<AtomicU64>,
}

impl RelayClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one prompt and returns the `answer` field, which the relay may leave out.
    pub async fn send(&self, prompt: &str) -> Result<Option<String>, RelayError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.post(prompt).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            log::debug!("Dropping relay response {ticket}, a newer request is in flight");
            return Err(RelayError::Superseded);
        }
        result
    }

    async fn post(&self, prompt: &str) -> Result<Option<String>, RelayError> {
        let request = AnswerRequest {
            question: prompt.to_string(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            log::warn!("Relay answered with status {}", response.status());
            return Err(RelayError::Status(response.status()));
        }

        let body: AnswerResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Timeout(self.timeout)
            } else {
                RelayError::Decode(e)
            }
        })?;
        Ok(body.answer)
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            log::warn!("Relay request timed out after {:?}", self.timeout);
            RelayError::Timeout(self.timeout)
        } else {
            log::warn!("Relay request failed: {e}");
            RelayError::Transport(e)
        }
    }

    /// Like [`send`](Self::send), but an absent or empty answer becomes `fallback`.
    pub async fn send_with_fallback(
        &self,
        prompt: &str,
        fallback: &str,
    ) -> Result<String, RelayError> {
        let answer = self.send(prompt).await?;
        Ok(answer
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| fallback.to_string()))
    }

    /// Asks for feedback on a sentence written with `card`'s word.
    pub async fn check_sentence(&self, card: &Card, sentence: &str) -> Result<String, RelayError> {
        let prompt = vocab_utils::prompt::sentence_check_prompt(card, sentence);
        self.send_with_fallback(&prompt, NO_SENTENCE_FEEDBACK).await
    }

    /// Asks for a short story using every `german - english` line of `vocabulary`.
    pub async fn generate_story(&self, vocabulary: &str) -> Result<StoryAnswer, RelayError> {
        let prompt = compose_prompt(&PromptKind::Story { vocabulary });
        let answer = self.send_with_fallback(&prompt, NO_ANSWER).await?;
        Ok(StoryAnswer::from_answer(answer, &parse_vocabulary_lines(vocabulary)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryAnswer {
    Parsed {
        story: StoryResponse,
        missing: Vec<VocabularyPair>,
    },
    /// The model did not answer with usable JSON; show its text as-is.
    Raw { text: String },
}

impl StoryAnswer {
    fn from_answer(answer: String, vocabulary: &[VocabularyPair]) -> Self {
        match parse_story(&answer) {
            Ok(story) => {
                let missing = story
                    .missing_vocabulary(vocabulary)
                    .into_iter()
                    .cloned()
                    .collect();
                StoryAnswer::Parsed { story, missing }
            }
            Err(e) => {
                log::info!("Showing the story answer as plain text: {e}");
                StoryAnswer::Raw { text: answer }
            }
        }
    }
}

/// The text a page shows for a finished relay call.
pub fn display_text(result: &Result<String, RelayError>) -> String {
    match result {
        Ok(answer) => answer.clone(),
        Err(e) => format!("Error: {e}"),
    }
}
