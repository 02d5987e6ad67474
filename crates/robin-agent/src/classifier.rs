use robin_core::config::ClassifierConfig;
use robin_core::{Decision, Message, Result, RobinError};

/// Decides whether a message needs investigation and, if so, whether the
/// investigation can be automated from extractable context.
///
/// Implementations must be pure: the same message always yields the same
/// answers, and neither method may block.
pub trait NeedClassifier: Send + Sync {
    /// True when the fixed response policy alone can't answer the message.
    fn needs_investigation(&self, message: &Message) -> bool;

    /// Whether context extraction should suffice. Only consulted for messages
    /// that need investigation; call `can_automate_context` instead.
    fn context_is_automatable(&self, message: &Message) -> bool;

    /// Checked form of `context_is_automatable`. Fails with `InvalidState`
    /// for a message that does not need investigation. Implementors that
    /// override this must keep the check; `classify` and the router only
    /// call it once `needs_investigation` has returned true.
    fn can_automate_context(&self, message: &Message) -> Result<bool> {
        if !self.needs_investigation(message) {
            return Err(RobinError::InvalidState(
                "can_automate_context called for a message that needs no investigation".into(),
            ));
        }
        Ok(self.context_is_automatable(message))
    }
}

/// Run both classifier steps and fold them into a `Decision`.
pub fn classify(classifier: &dyn NeedClassifier, message: &Message) -> Result<Decision> {
    if !classifier.needs_investigation(message) {
        return Decision::from_flags(false, None);
    }
    let automatable = classifier.can_automate_context(message)?;
    Decision::from_flags(true, Some(automatable))
}

/// Rule-based classifier over configurable marker phrases.
///
/// - prior-state marker and no escalation marker: automated
/// - escalation or lookup marker: manual
/// - short message leaning on a bare pronoun: manual
/// - anything else: direct
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    prior_state: Vec<String>,
    escalation: Vec<String>,
    lookup: Vec<String>,
    pronouns: Vec<String>,
    min_direct_words: usize,
}

impl KeywordClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let normalize_all = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            prior_state: normalize_all(&config.prior_state_markers),
            escalation: normalize_all(&config.escalation_markers),
            lookup: normalize_all(&config.lookup_markers),
            pronouns: normalize_all(&config.ambiguous_pronouns),
            min_direct_words: config.min_direct_words,
        }
    }

    fn is_ambiguous(&self, padded: &str) -> bool {
        let words = padded.split_whitespace().count();
        words < self.min_direct_words && contains_any(padded, &self.pronouns)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl NeedClassifier for KeywordClassifier {
    fn needs_investigation(&self, message: &Message) -> bool {
        let padded = padded(&message.text);
        contains_any(&padded, &self.prior_state)
            || contains_any(&padded, &self.escalation)
            || contains_any(&padded, &self.lookup)
            || self.is_ambiguous(&padded)
    }

    fn context_is_automatable(&self, message: &Message) -> bool {
        let padded = padded(&message.text);
        contains_any(&padded, &self.prior_state) && !contains_any(&padded, &self.escalation)
    }
}

/// Lowercase, keep letters/digits/apostrophes, collapse everything else to
/// single spaces.
fn normalize(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' {
            mapped.extend(c.to_lowercase());
        } else {
            mapped.push(' ');
        }
    }
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Space-padded so markers only match on word boundaries.
fn padded(text: &str) -> String {
    format!(" {} ", normalize(text))
}

fn contains_any(padded: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|p| padded.contains(&format!(" {p} ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(text: &str) -> Decision {
        classify(&KeywordClassifier::default(), &Message::new(text)).unwrap()
    }

    #[test]
    fn plain_question_is_direct() {
        assert_eq!(decide("What's the weather?"), Decision::Direct);
        assert_eq!(decide("Tell me a joke about cats"), Decision::Direct);
    }

    #[test]
    fn prior_turn_reference_is_automated() {
        assert_eq!(decide("What did I ask you yesterday?"), Decision::Automated);
        assert_eq!(decide("Can you repeat what you said earlier"), Decision::Automated);
    }

    #[test]
    fn escalation_is_manual() {
        assert_eq!(decide("Can you escalate this to support?"), Decision::Manual);
        // escalation wins over a prior-state reference
        assert_eq!(
            decide("I asked yesterday, now I want a human"),
            Decision::Manual
        );
    }

    #[test]
    fn lookup_is_manual() {
        assert_eq!(decide("What is the status of my order?"), Decision::Manual);
    }

    #[test]
    fn short_pronoun_message_is_ambiguous() {
        assert_eq!(decide("Fix it"), Decision::Manual);
        assert_eq!(decide("Fix it for me please now"), Decision::Direct);
    }

    #[test]
    fn markers_match_whole_words_only() {
        // "supported" must not trigger "support", "beforehand" must not trigger "before"
        assert_eq!(decide("Which formats are supported beforehand?"), Decision::Direct);
    }

    #[test]
    fn matching_ignores_case_and_punctuation() {
        assert_eq!(decide("ESCALATE!!!"), Decision::Manual);
        assert_eq!(decide("last-time you told me"), Decision::Automated);
    }

    #[test]
    fn can_automate_without_investigation_is_invalid_state() {
        let classifier = KeywordClassifier::default();
        for text in ["What's the weather?", "Hello my good friend", "Tell me a story"] {
            let msg = Message::new(text);
            assert!(!classifier.needs_investigation(&msg));
            assert!(matches!(
                classifier.can_automate_context(&msg),
                Err(RobinError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let config = ClassifierConfig {
            prior_state_markers: vec!["gestern".into()],
            escalation_markers: vec![],
            lookup_markers: vec![],
            ambiguous_pronouns: vec![],
            min_direct_words: 0,
        };
        let classifier = KeywordClassifier::new(&config);
        let msg = Message::new("Was habe ich gestern gefragt?");
        assert_eq!(classify(&classifier, &msg).unwrap(), Decision::Automated);
        let msg = Message::new("What did I ask yesterday?");
        assert_eq!(classify(&classifier, &msg).unwrap(), Decision::Direct);
    }

    #[test]
    fn markers_match_non_ascii_case_insensitively() {
        let config = ClassifierConfig {
            prior_state_markers: vec!["früher".into(), "vorhin".into()],
            escalation_markers: vec!["ÉQUIPE".into()],
            lookup_markers: vec![],
            ambiguous_pronouns: vec![],
            min_direct_words: 0,
        };
        let classifier = KeywordClassifier::new(&config);
        let decide = |text: &str| classify(&classifier, &Message::new(text)).unwrap();

        assert_eq!(decide("FRÜHER gefragt, weißt du noch?"), Decision::Automated);
        assert_eq!(decide("Was hast du Vorhin gesagt"), Decision::Automated);
        assert_eq!(decide("früher, mais je veux une Équipe"), Decision::Manual);
        assert_eq!(decide("Grüße aus Köln"), Decision::Direct);
    }

    /// Skips the precondition and counts how often it is asked.
    struct Unchecked {
        automate_calls: std::sync::atomic::AtomicUsize,
    }

    impl NeedClassifier for Unchecked {
        fn needs_investigation(&self, message: &Message) -> bool {
            message.text.contains('?')
        }

        fn context_is_automatable(&self, _message: &Message) -> bool {
            true
        }

        fn can_automate_context(&self, message: &Message) -> Result<bool> {
            self.automate_calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.context_is_automatable(message))
        }
    }

    #[test]
    fn classify_never_asks_automation_for_direct_messages() {
        let classifier = Unchecked {
            automate_calls: Default::default(),
        };
        let calls = || classifier.automate_calls.load(std::sync::atomic::Ordering::SeqCst);

        assert_eq!(
            classify(&classifier, &Message::new("good morning")).unwrap(),
            Decision::Direct
        );
        assert_eq!(calls(), 0);

        assert_eq!(
            classify(&classifier, &Message::new("what did I say?")).unwrap(),
            Decision::Automated
        );
        assert_eq!(calls(), 1);
    }
}
