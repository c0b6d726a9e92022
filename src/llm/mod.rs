//! 对话补全后端 (OpenRouter)

pub mod openrouter;

use crate::error::QueryError;
use async_trait::async_trait;
use std::fmt;

pub use openrouter::OpenRouterClient;

/// 可选模型 (第一个为默认)
pub const AVAILABLE_MODELS: [&str; 6] = [
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3-haiku",
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "google/gemini-pro",
    "meta-llama/llama-3.1-8b-instruct",
];

pub const DEFAULT_MODEL: &str = AVAILABLE_MODELS[0];

/// 固定低温度
pub const TEMPERATURE: f32 = 0.1;
/// 最大输出 token
pub const MAX_TOKENS: u32 = 2000;

pub fn is_supported_model(model: &str) -> bool {
    AVAILABLE_MODELS.contains(&model)
}

/// 单条 user 消息的补全请求
#[derive(Clone)]
pub struct ChatRequest {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("prompt_len", &self.prompt.len())
            .finish()
    }
}

/// 补全后端：请求进，文本或错误出
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, QueryError>;
}
