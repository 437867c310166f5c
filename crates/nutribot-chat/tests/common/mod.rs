//! Fakes for the session's collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use nutribot_chat::ChatSession;
use nutribot_core::events::EventBus;
use nutribot_core::types::{Citation, LanguageCode};
use nutribot_search::{Answer, AnswerClient, QueryFailed};
use nutribot_speech::{PlaybackController, PlaybackError, SpeechEngine, Utterance, UtteranceSignals, Voice};
use nutribot_translate::{Translation, TranslationClient, TranslationError};

pub fn code(s: &str) -> LanguageCode {
    LanguageCode::new(s).unwrap()
}

// =============================================================================
// Translation
// =============================================================================

/// Forward translations (into the canonical language) return `forward`;
/// every other target returns `back`. Like the real service, a source hint
/// equal to the target is treated as "already translated" and echoed back.
pub struct FakeTranslator {
    pub forward: Result<Translation, TranslationError>,
    pub back: Result<String, TranslationError>,
    pub calls: Mutex<Vec<(String, LanguageCode, Option<LanguageCode>)>>,
}

impl FakeTranslator {
    pub fn detecting(lang: &str, canonical_text: &str) -> Self {
        Self {
            forward: Ok(Translation {
                text: canonical_text.to_string(),
                detected_source: code(lang),
            }),
            back: Ok("translated answer".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_back(mut self, back: Result<String, TranslationError>) -> Self {
        self.back = back;
        self
    }

    pub fn failing() -> Self {
        Self {
            forward: Err(TranslationError::Transport("connection reset".into())),
            back: Err(TranslationError::Transport("connection reset".into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target, _)| target.to_string())
            .collect()
    }

    /// Source hint of each call, in order.
    pub fn hints(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, hint)| hint.as_ref().map(|h| h.to_string()))
            .collect()
    }
}

#[async_trait]
impl TranslationClient for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        target: &LanguageCode,
        source_hint: Option<&LanguageCode>,
    ) -> Result<Translation, TranslationError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target.clone(), source_hint.cloned()));
        if source_hint == Some(target) {
            return Ok(Translation {
                text: text.to_string(),
                detected_source: target.clone(),
            });
        }
        if target.is_canonical() {
            self.forward.clone()
        } else {
            self.back.clone().map(|text| Translation {
                text,
                detected_source: LanguageCode::canonical(),
            })
        }
    }
}

// =============================================================================
// Answering service
// =============================================================================

pub struct FakeAnswers {
    pub result: Result<Answer, QueryFailed>,
    pub reset_result: Result<(), QueryFailed>,
    pub queries: Mutex<Vec<String>>,
    pub resets: AtomicUsize,
    /// When set, the next query waits for a notification before answering.
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeAnswers {
    pub fn answering(text: &str, titles: &[&str]) -> Self {
        Self::with_result(Ok(Answer {
            text: text.to_string(),
            sources: titles.iter().map(|t| Citation::titled(*t)).collect(),
        }))
    }

    pub fn with_result(result: Result<Answer, QueryFailed>) -> Self {
        Self {
            result,
            reset_result: Ok(()),
            queries: Mutex::new(Vec::new()),
            resets: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    /// Hold the next query until the returned handle is notified.
    pub fn gate_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerClient for FakeAnswers {
    async fn query(&self, text: &str) -> Result<Answer, QueryFailed> {
        self.queries.lock().unwrap().push(text.to_string());
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.result.clone()
    }

    async fn notify_reset(&self) -> Result<(), QueryFailed> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.reset_result.clone()
    }
}

// =============================================================================
// Speech
// =============================================================================

#[derive(Default)]
pub struct FakeSpeech {
    pub spoken: Mutex<Vec<Utterance>>,
    pub signals: Mutex<Vec<UtteranceSignals>>,
    pub cancels: AtomicUsize,
}

impl SpeechEngine for FakeSpeech {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("Google US English", "en-US"),
            Voice::new("Google हिन्दी", "hi-IN"),
        ]
    }

    fn speak(&self, utterance: Utterance, signals: UtteranceSignals) -> Result<(), PlaybackError> {
        self.spoken.lock().unwrap().push(utterance);
        self.signals.lock().unwrap().push(signals);
        Ok(())
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct Harness {
    pub session: Arc<ChatSession>,
    pub translator: Arc<FakeTranslator>,
    pub answers: Arc<FakeAnswers>,
    pub speech: Arc<FakeSpeech>,
    pub events: EventBus,
}

pub fn harness(translator: FakeTranslator, answers: FakeAnswers) -> Harness {
    let translator = Arc::new(translator);
    let answers = Arc::new(answers);
    let speech = Arc::new(FakeSpeech::default());
    let events = EventBus::new(64);
    let playback = PlaybackController::new(
        speech.clone(),
        vec!["Google".to_string(), "Natural".to_string()],
        events.clone(),
    );
    let session = ChatSession::new(translator.clone(), answers.clone(), playback, events.clone());
    Harness {
        session: Arc::new(session),
        translator,
        answers,
        speech,
        events,
    }
}

/// English speaker, answering service returns one answer with two citations.
pub fn english_harness() -> Harness {
    harness(
        FakeTranslator::detecting("en", "Suggest a high protein lunch."),
        FakeAnswers::answering("Try grilled chicken with quinoa.", &["Chicken", "Quinoa"]),
    )
}

/// Wait until the answering service has received `n` queries.
pub async fn wait_for_queries(answers: &FakeAnswers, n: usize) {
    while answers.query_count() < n {
        tokio::task::yield_now().await;
    }
}
