use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Top-level config (robin.toml + ROBIN_* env overrides).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobinConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub follow_up: FollowUpConfig,
}

/// Text completion capability used by the reply strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Model identifier; selects the backend model.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bounds how long a single completion request may block.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Extra attempts per provider slot before failing over.
    #[serde(default)]
    pub max_retries: u32,
    /// Models tried in order (same endpoint) when the primary model fails.
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: 0,
            fallback_models: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

/// Marker lists for the keyword classifier. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Phrases that point back at earlier conversation state.
    #[serde(default = "default_prior_state_markers")]
    pub prior_state_markers: Vec<String>,
    /// Phrases that call for a human or an outside system.
    #[serde(default = "default_escalation_markers")]
    pub escalation_markers: Vec<String>,
    /// Phrases that ask for a lookup the fixed policy can't answer.
    #[serde(default = "default_lookup_markers")]
    pub lookup_markers: Vec<String>,
    #[serde(default = "default_ambiguous_pronouns")]
    pub ambiguous_pronouns: Vec<String>,
    /// Messages shorter than this that lean on a bare pronoun are ambiguous.
    #[serde(default = "default_min_direct_words")]
    pub min_direct_words: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            prior_state_markers: default_prior_state_markers(),
            escalation_markers: default_escalation_markers(),
            lookup_markers: default_lookup_markers(),
            ambiguous_pronouns: default_ambiguous_pronouns(),
            min_direct_words: default_min_direct_words(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Turns kept per session; oldest are evicted first.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Turns copied into an extracted Context.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            context_turns: default_context_turns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_follow_up_question")]
    pub question: String,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            question: default_follow_up_question(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}
fn default_min_direct_words() -> usize {
    4
}
fn default_max_turns() -> usize {
    50
}
fn default_context_turns() -> usize {
    6
}
fn default_follow_up_question() -> String {
    "Is there anything else I can help you with?".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_prior_state_markers() -> Vec<String> {
    strings(&[
        "yesterday",
        "earlier",
        "before",
        "last time",
        "previous",
        "previously",
        "you said",
        "i asked",
        "i said",
        "remember",
        "again",
    ])
}

fn default_escalation_markers() -> Vec<String> {
    strings(&[
        "escalate",
        "support",
        "human",
        "manager",
        "complaint",
        "refund",
        "agent",
    ])
}

fn default_lookup_markers() -> Vec<String> {
    strings(&["look up", "lookup", "find out", "check on", "status of", "order"])
}

fn default_ambiguous_pronouns() -> Vec<String> {
    strings(&["it", "that", "this", "those", "them", "there"])
}

impl RobinConfig {
    /// Load config from a TOML file with ROBIN_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.robin/robin.toml
    ///
    /// A missing file is not an error; defaults fill every section.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::RobinError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(RobinConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ROBIN_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.robin/robin.toml", home)
}
