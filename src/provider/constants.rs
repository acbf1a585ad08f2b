pub mod openai {
    pub const ID: &str = "openai";
    pub const API_BASE: &str = "https://api.openai.com/v1";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
    pub const EMBEDDINGS_ENDPOINT: &str = "/embeddings";
    pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
    pub const ORGANIZATION_ENV_VAR: &str = "OPENAI_ORG_ID";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;
    pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
    pub const EMBEDDING_DIMENSIONS: u32 = 1536;
}

pub mod gemini {
    pub const ID: &str = "gemini";
    pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
    pub const API_KEY_HEADER: &str = "x-goog-api-key";
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
    pub const EMBEDDING_MODEL: &str = "gemini-embedding-001";
    pub const EMBEDDING_DIMENSIONS: u32 = 3072;
}

pub mod anthropic {
    pub const ID: &str = "anthropic";
    pub const API_BASE: &str = "https://api.anthropic.com/v1";
    pub const MESSAGES_ENDPOINT: &str = "/messages";
    pub const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";
    pub const API_KEY_HEADER: &str = "x-api-key";
    pub const API_VERSION: &str = "2023-06-01";
    pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
}
