use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Recipe Source Args ---
    /// API key for the Spoonacular recipe API.
    #[arg(long, env = "SPOONACULAR_API_KEY", default_value = "", hide_env_values = true)]
    pub spoonacular_api_key: String,

    /// Base URL of the Spoonacular API.
    #[arg(long, env = "SPOONACULAR_BASE_URL", default_value = "https://api.spoonacular.com")]
    pub spoonacular_base_url: String,

    /// Fallback JSON file holding SPOONACULAR_API_KEY / CHAT_API_KEY when they are not set.
    #[arg(long, env = "SECRETS_PATH", default_value = "json/secrets.json")]
    pub secrets_path: String,

    /// Maximum number of search hits to fetch details for.
    #[arg(long, env = "RECIPE_LIMIT", default_value = "10")]
    pub recipe_limit: usize,

    /// How many recipe detail requests may be in flight at once (1 = sequential).
    #[arg(long, env = "DETAIL_CONCURRENCY", default_value = "4")]
    pub detail_concurrency: usize,

    /// How many random recipes to try before giving up on "surprise me".
    #[arg(long, env = "RANDOM_MAX_ATTEMPTS", default_value = "10")]
    pub random_max_attempts: usize,

    /// Timeout in seconds applied to every outgoing API call.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "15")]
    pub request_timeout_secs: u64,

    // --- Dietary Args ---
    /// Dietary profile applied to every result (halal, none, or a name from DIET_PROFILES_PATH).
    #[arg(long, env = "DIET_PROFILE", default_value = "halal")]
    pub diet_profile: String,

    /// Optional JSON file with additional dietary profiles.
    #[arg(long, env = "DIET_PROFILES_PATH")]
    pub diet_profiles_path: Option<String>,

    /// Require suggested recipes to use at least one of the ingredients the user listed.
    #[arg(long, env = "MATCH_INGREDIENTS", default_value = "true", action = clap::ArgAction::Set)]
    pub match_ingredients: bool,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (gemini, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., Gemini, OpenAI)
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-1.5-pro, gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Prefix chat prompts with the session's recent conversation.
    #[arg(long, env = "INCLUDE_HISTORY", default_value = "true", action = clap::ArgAction::Set)]
    pub include_history: bool,

    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the HTTP API. The HTTP API is disabled when unset.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Optional shared secret. When set, WebSocket clients must sign the handshake with it.
    #[arg(long, env = "SERVER_API_KEY", hide_env_values = true)]
    pub server_api_key: Option<String>,
}
