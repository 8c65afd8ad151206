use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::DomainError;

pub const CONFIG_DIR_ENV: &str = "PROMPT_CHAIN_CONFIG_DIR";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.0,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 20,
            top_k: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 15 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub knowledge_base: KnowledgeBaseToolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseToolConfig {
    pub name: String,
    pub description: String,
    pub no_results_message: String,
}

impl Default for KnowledgeBaseToolConfig {
    fn default() -> Self {
        Self {
            name: "lcel_search".to_string(),
            description: "Use this tool when searching for information about LangChain Expression Language (LCEL). For any questions about LCEL, you must use this tool!".to_string(),
            no_results_message: "No relevant documents found.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub agent_system: String,
    pub comedian: String,
    pub synonyms: String,
    pub extractor: String,
    pub bare_question: String,
    pub encyclopedia: String,
    pub context_system: String,
    pub conversation: String,
    pub joke_teller: String,
    pub joke_evaluator: String,
    pub sql_generator: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            agent_system: "You are a helpful assistant called Max.\n\nYour goal is to answer the user question and assist the user's need. No yapping.".to_string(),
            comedian: "You are an excellent comedian. Your jokes are short but meaningful.\nTell a joke based on the following word provided by the user.".to_string(),
            synonyms: "You are a dictionary.\nProvide 5 synonyms, separated by commas, for the following word provided by the user.".to_string(),
            extractor: "You are an information extracting expert. Your goal is to extract information correctly.\n\nExtract information from the following phrase.\nIf there is no information about a property, say \"null\". DO NOT make up information. No yapping.\n\nFormatting instruction: {format_instruction}\nPhrase: {phrase}".to_string(),
            bare_question: "Answer the user's question.\n\nQuestion: {input}.".to_string(),
            encyclopedia: "You are an encyclopedia, you know all the answers.\n\nYour goal is to answer the user's question.\nDo not make up information. No yapping.\n\nContext: {context}.\nQuestion: {input}.".to_string(),
            context_system: "Answer the user's question based on the following context: {context}.".to_string(),
            conversation: "You are a helpful assistant called MaxZap.\n\nYour goal is to help answering user question.\n\nHistory: {history}\n\nUser question: {input}.".to_string(),
            joke_teller: "You are a comedian called Cody Mike.\n\nYour goal is to tell short but funny joke (1 joke per request) based on the provided topic by the user. No yapping.\n\nUser topic: {input}.".to_string(),
            joke_evaluator: "You are a joke evaluator called Jake Eval.\n\nYour goals:\n- Evaluate the provided joke whether it is funny or not.\n- Give explanation on the joke.\n- Suggest a joke that improved on the original joke.\n\nJoke: {joke}.".to_string(),
            sql_generator: "You are a MySQL expert.\n\nYour goal is to generate syntax correct MySQL \"SELECT\" queries based on the given MySQL schemas.\nYou need to follow these rules and guidelines. No yapping.\n\nRules and Guidelines:\n- DO:\n  -- Display from minimum 3 to maximum 5 properties in the \"SELECT\" queries.\n  -- The schema's primary key(s) must always be used in \"SELECT\" queries.\n  -- If there are tables that need to be joined, always use 'JOIN' to join tables.\n  -- Always use 'LIMIT' to limit the output to 20 rows.\n- DO NOT:\n  -- Use '*' when generating \"SELECT\" queries.\n\nGiven the MySQL database schema: {schema}.\nGenerate MySQL \"SELECT\" query based on the following user input: {user_input}.\nDisplay the following column(s): {column}.".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, DomainError> {
        let dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        Self::load_from(&dir)
    }

    /// Missing files fall back to defaults; unreadable, malformed or out-of-range files are errors.
    pub fn load_from(dir: &Path) -> Result<Self, DomainError> {
        let config: Config = read_yaml(&dir.join("config.yaml"))?;
        config.validate()?;

        Ok(Self {
            config,
            prompts: read_yaml(&dir.join("prompts.yaml"))?,
        })
    }
}

impl Config {
    fn validate(&self) -> Result<(), DomainError> {
        let limits = [
            ("agent.max_iterations", self.agent.max_iterations),
            ("rag.top_k", self.rag.top_k),
            ("rag.chunk_size", self.rag.chunk_size),
        ];
        match limits.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(DomainError::configuration(format!(
                "{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DomainError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_yaml::from_str(&raw)
            .map_err(|e| DomainError::configuration(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(DomainError::configuration(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}

/// The Gemini key from `GEMINI_API_KEY`, else `GOOGLE_API_KEY`. Blank values count as unset.
pub fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>) -> Result<String, DomainError> {
    [API_KEY_ENV, FALLBACK_API_KEY_ENV]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "LLM API key not found: set {API_KEY_ENV} or {FALLBACK_API_KEY_ENV}"
            ))
        })
}

fn pending_api_key(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<String>, DomainError> {
    let key = resolve_api_key(&lookup)?;
    Ok((lookup(API_KEY_ENV).as_deref() != Some(key.as_str())).then_some(key))
}

/// Exposes the resolved key as `GEMINI_API_KEY`, where the provider client reads it.
/// Must run before the async runtime or any other thread starts.
pub fn ensure_api_key() -> Result<(), DomainError> {
    if let Some(key) = pending_api_key(|name| std::env::var(name).ok())? {
        std::env::set_var(API_KEY_ENV, key);
    }
    Ok(())
}
