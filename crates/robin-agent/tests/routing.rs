// Routing behaviour of `Robin` against stub collaborators.
// Each stub counts its calls so tests can assert which branch ran.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use robin_agent::classifier::NeedClassifier;
use robin_agent::context::ContextExtractor;
use robin_agent::follow_up::FollowUpDecider;
use robin_agent::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};
use robin_agent::strategy::{ContextualReplier, DirectResponder, InvestigationReplier};
use robin_agent::{
    CompletionClient, CompletionReplier, ConversationHistory, HistoryContextExtractor,
    KeywordClassifier, ReplyStrategies, Robin, RuleFollowUpDecider,
};
use robin_core::config::FollowUpConfig;
use robin_core::{Context, Decision, Message, Reply, Result, RobinError, SessionId, Turn};

/// Classifier with fixed answers, ignoring the message.
struct FixedClassifier {
    investigate: bool,
    automatable: bool,
}

impl NeedClassifier for FixedClassifier {
    fn needs_investigation(&self, _message: &Message) -> bool {
        self.investigate
    }
    fn context_is_automatable(&self, _message: &Message) -> bool {
        self.automatable
    }
}

#[derive(Default)]
struct StubExtractor {
    calls: AtomicUsize,
    context: Option<Context>,
}

#[async_trait]
impl ContextExtractor for StubExtractor {
    async fn extract_context(&self, _message: &Message) -> Result<Context> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.context
            .clone()
            .ok_or_else(|| RobinError::ExtractionFailed("prior turn unavailable".into()))
    }
}

#[derive(Default)]
struct StubStrategies {
    contextual: AtomicUsize,
    investigation: AtomicUsize,
    direct: AtomicUsize,
    seen_context: Mutex<Option<Context>>,
}

#[async_trait]
impl ContextualReplier for StubStrategies {
    async fn generate_with_context(&self, _message: &Message, context: &Context) -> Result<Reply> {
        self.contextual.fetch_add(1, Ordering::SeqCst);
        *self.seen_context.lock().unwrap() = Some(context.clone());
        let prior = context.prior_turn.clone().unwrap_or_default();
        Ok(Reply::new(format!("You asked: {prior}")))
    }
}

#[async_trait]
impl InvestigationReplier for StubStrategies {
    async fn generate_without_context(&self, _message: &Message) -> Result<Reply> {
        self.investigation.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::new("I've flagged this for a human."))
    }
}

#[async_trait]
impl DirectResponder for StubStrategies {
    async fn generate_response(&self, _message: &Message) -> Result<Reply> {
        self.direct.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::new("It is sunny."))
    }
}

#[derive(Default)]
struct CountingFollowUp {
    calls: AtomicUsize,
}

#[async_trait]
impl FollowUpDecider for CountingFollowUp {
    async fn maybe_add_follow_up(&self, reply: Reply, _message: &Message) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(reply)
    }
}

struct Harness {
    robin: Robin,
    extractor: Arc<StubExtractor>,
    strategies: Arc<StubStrategies>,
    follow_up: Arc<CountingFollowUp>,
}

impl Harness {
    fn new(investigate: bool, automatable: bool, context: Option<Context>) -> Self {
        let extractor = Arc::new(StubExtractor {
            calls: AtomicUsize::new(0),
            context,
        });
        let strategies = Arc::new(StubStrategies::default());
        let follow_up = Arc::new(CountingFollowUp::default());
        let robin = Robin::new(
            Arc::new(FixedClassifier {
                investigate,
                automatable,
            }),
            extractor.clone(),
            ReplyStrategies {
                contextual: strategies.clone(),
                investigation: strategies.clone(),
                direct: strategies.clone(),
            },
            follow_up.clone(),
        );
        Self {
            robin,
            extractor,
            strategies,
            follow_up,
        }
    }

    fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.extractor.calls.load(Ordering::SeqCst),
            self.strategies.contextual.load(Ordering::SeqCst),
            self.strategies.investigation.load(Ordering::SeqCst),
            self.strategies.direct.load(Ordering::SeqCst),
        )
    }
}

#[tokio::test]
async fn direct_message_only_uses_direct_strategy() {
    let h = Harness::new(false, false, Some(Context::with_prior_turn("unused")));
    let msg = Message::new("What's the weather?");

    let reply = h.robin.generate_reply(&msg).await.unwrap();

    assert_eq!(reply, Reply::new("It is sunny."));
    assert_eq!(h.counts(), (0, 0, 0, 1));
    assert_eq!(h.follow_up.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.robin.decide(&msg).unwrap(), Decision::Direct);
}

#[tokio::test]
async fn automated_message_passes_extracted_context_through() {
    let ctx = Context::with_prior_turn("X");
    let h = Harness::new(true, true, Some(ctx.clone()));
    let msg = Message::new("What did I ask you yesterday?");

    let reply = h.robin.generate_reply(&msg).await.unwrap();

    assert_eq!(reply.text, "You asked: X");
    assert_eq!(h.counts(), (1, 1, 0, 0));
    assert_eq!(h.strategies.seen_context.lock().unwrap().as_ref(), Some(&ctx));
    assert_eq!(h.follow_up.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn manual_message_never_extracts_context() {
    let h = Harness::new(true, false, Some(Context::with_prior_turn("unused")));
    let msg = Message::new("Can you escalate this to support?");

    let reply = h.robin.generate_reply(&msg).await.unwrap();

    assert_eq!(reply.text, "I've flagged this for a human.");
    assert_eq!(h.counts(), (0, 0, 1, 0));
    assert_eq!(h.robin.decide(&msg).unwrap(), Decision::Manual);
}

#[tokio::test]
async fn extraction_failure_propagates_without_manual_fallback() {
    let h = Harness::new(true, true, None);
    let msg = Message::new("What did I ask you yesterday?");

    let err = h.robin.generate_reply(&msg).await.unwrap_err();

    assert!(matches!(err, RobinError::ExtractionFailed(_)));
    assert_eq!(h.counts(), (1, 0, 0, 0));
    assert_eq!(h.follow_up.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn strategy_failure_propagates() {
    struct Broken;

    #[async_trait]
    impl DirectResponder for Broken {
        async fn generate_response(&self, _message: &Message) -> Result<Reply> {
            Err(RobinError::GenerationFailed("backend down".into()))
        }
    }

    let stubs = Arc::new(StubStrategies::default());
    let robin = Robin::new(
        Arc::new(FixedClassifier {
            investigate: false,
            automatable: false,
        }),
        Arc::new(StubExtractor::default()),
        ReplyStrategies {
            contextual: stubs.clone(),
            investigation: stubs.clone(),
            direct: Arc::new(Broken),
        },
        Arc::new(CountingFollowUp::default()),
    );

    let err = robin
        .generate_reply(&Message::new("What's the weather?"))
        .await
        .unwrap_err();
    assert!(matches!(err, RobinError::GenerationFailed(_)));
}

#[test]
fn can_automate_context_rejects_direct_messages() {
    let classifier = FixedClassifier {
        investigate: false,
        automatable: true,
    };
    for text in ["What's the weather?", "", "hello"] {
        let err = classifier
            .can_automate_context(&Message::new(text))
            .unwrap_err();
        assert!(matches!(err, RobinError::InvalidState(_)));
    }
}

#[tokio::test]
async fn follow_up_decider_is_idempotent_through_the_router() {
    let decider = RuleFollowUpDecider::new(&FollowUpConfig::default());
    let msg = Message::new("What's the weather?");
    let once = decider
        .maybe_add_follow_up(Reply::new("It is sunny."), &msg)
        .await
        .unwrap();
    let twice = decider.maybe_add_follow_up(once.clone(), &msg).await.unwrap();
    assert_eq!(once, twice);
    assert!(once.has_follow_up());
}

/// Provider that echoes the system prompt back, so tests can see which
/// strategy prompt (and context) reached the model.
struct EchoSystem;

#[async_trait]
impl LlmProvider for EchoSystem {
    fn name(&self) -> &str {
        "echo-system"
    }
    async fn send(&self, req: &ChatRequest) -> std::result::Result<ChatResponse, ProviderError> {
        Ok(ChatResponse {
            content: req.system.clone(),
            model: req.model.clone(),
            tokens_in: 0,
            tokens_out: 0,
            stop_reason: "stop".to_string(),
        })
    }
}

#[tokio::test]
async fn end_to_end_with_bundled_collaborators() {
    let history = Arc::new(ConversationHistory::new(20));
    let session = SessionId::from("alice");
    history.record(&session, Turn::user("Recommend a restaurant in Lisbon"));
    history.record(&session, Turn::assistant("Try Cervejaria Ramiro."));

    let replier = Arc::new(CompletionReplier::new(CompletionClient::new(
        Arc::new(EchoSystem),
        "llama3.2",
        64,
    )));
    let robin = Robin::new(
        Arc::new(KeywordClassifier::default()),
        Arc::new(HistoryContextExtractor::new(history.clone(), 6)),
        ReplyStrategies {
            contextual: replier.clone(),
            investigation: replier.clone(),
            direct: replier,
        },
        Arc::new(RuleFollowUpDecider::new(&FollowUpConfig::default())),
    );

    let msg = Message::new("What did I ask you yesterday?").with_session("alice");
    let reply = robin.generate_reply(&msg).await.unwrap();
    assert!(reply.text.contains("Previous request: Recommend a restaurant in Lisbon"));
    assert!(reply.has_follow_up());

    // same question from a session with no history cannot be automated
    let msg = Message::new("What did I ask you yesterday?").with_session("bob");
    let err = robin.generate_reply(&msg).await.unwrap_err();
    assert!(matches!(err, RobinError::ExtractionFailed(_)));

    let msg = Message::new("Can you escalate this to support?").with_session("bob");
    let reply = robin.generate_reply(&msg).await.unwrap();
    assert!(reply.text.contains("flagged for a human"));
}
