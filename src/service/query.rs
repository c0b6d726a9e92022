use crate::error::QueryError;
use crate::llm::{ChatBackend, ChatRequest};
use crate::models::InvoiceData;
use crate::service::stats::{basic_stats_text, data_info, data_sample};
use std::sync::Arc;

/// 示例问题：财务分析
pub const FINANCIAL_EXAMPLES: [&str; 4] = [
    "Which supplier had the highest billing?",
    "What is the average invoice value?",
    "What are the 5 most expensive items?",
    "How is billing distributed per month?",
];

/// 示例问题：运营分析
pub const OPERATIONAL_EXAMPLES: [&str; 4] = [
    "How many invoices per supplier?",
    "Which product had the highest volume?",
    "How many invoices are pending?",
    "Which category represents the largest spend?",
];

/// 构建提示词：表结构 + 基础统计 + 数据预览 + 用户问题
pub fn build_prompt(data: &InvoiceData, question: &str) -> String {
    format!(
        "You are a data analyst specialized in invoices (notas fiscais). You have access to the following data:

{info}

BASIC STATISTICS:
{stats}

DATA SAMPLE:
{sample}

USER QUESTION: {question}

Please analyze the data and answer the question clearly and in detail.
If needed, provide calculations, percentages and relevant insights.
If the question involves specific analyses that require calculations, explain the reasoning.

Answer format:
- Answer directly and clearly
- Use specific figures whenever possible
- Provide additional insights if relevant
- Use markdown formatting for readability
",
        info = data_info(data),
        stats = basic_stats_text(data),
        sample = data_sample(data),
        question = question.trim(),
    )
}

/// 面向用户的错误文本
pub fn error_text(err: &QueryError) -> String {
    format!("❌ {}", err)
}

/// 查询编排：组装请求、调用后端、收敛错误
#[derive(Clone)]
pub struct QueryService {
    backend: Arc<dyn ChatBackend>,
}

impl QueryService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// 组装请求 (同步部分，可在持有会话时调用)
    pub fn build_request(
        data: Option<&InvoiceData>,
        question: &str,
        api_key: &str,
        model: &str,
    ) -> Result<ChatRequest, QueryError> {
        let data = data.ok_or(QueryError::NoData)?;
        Ok(ChatRequest {
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompt: build_prompt(data, question),
        })
    }

    /// 单次请求-响应，不重试
    pub async fn answer(&self, request: &ChatRequest) -> Result<String, QueryError> {
        tracing::info!("Sending question to {}", request.model);
        match self.backend.complete(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                Err(e)
            }
        }
    }

    /// 完整查询：返回模型回答或 "❌ " 开头的错误文本
    pub async fn query_data(
        &self,
        data: Option<&InvoiceData>,
        question: &str,
        api_key: &str,
        model: &str,
    ) -> String {
        let request = match Self::build_request(data, question, api_key, model) {
            Ok(request) => request,
            Err(e) => return error_text(&e),
        };
        match self.answer(&request).await {
            Ok(text) => text,
            Err(e) => error_text(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::sample::create_sample_data;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录请求并返回固定结果的后端
    struct StubBackend {
        reply: Result<String, (u16, String)>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl StubBackend {
        fn new(reply: Result<String, (u16, String)>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<String, QueryError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err((status, body)) => Err(QueryError::Api {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    #[test]
    fn test_prompt_embeds_context_and_question() {
        let data = create_sample_data().unwrap();
        let prompt = build_prompt(&data, "  Which supplier sold most?  ");

        assert!(prompt.contains("HEADER DATA (100 records):"));
        assert!(prompt.contains("BASIC STATISTICS:"));
        assert!(prompt.contains("NF000001"));
        assert!(prompt.contains("USER QUESTION: Which supplier sold most?\n"));
    }

    #[tokio::test]
    async fn test_query_returns_backend_answer_verbatim() {
        let backend = StubBackend::new(Ok("## Answer\n42".to_string()));
        let service = QueryService::new(backend.clone());
        let data = create_sample_data().unwrap();

        let answer = service
            .query_data(Some(&data), "How many?", "sk-test", "openai/gpt-4o")
            .await;

        assert_eq!(answer, "## Answer\n42");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].api_key, "sk-test");
        assert_eq!(seen[0].model, "openai/gpt-4o");
    }

    #[tokio::test]
    async fn test_query_error_status_in_text() {
        let backend = StubBackend::new(Err((401, "unauthorized".to_string())));
        let service = QueryService::new(backend);
        let data = create_sample_data().unwrap();

        let answer = service
            .query_data(Some(&data), "How many?", "bad", "openai/gpt-4o")
            .await;

        assert!(answer.starts_with("❌ "));
        assert!(answer.contains("401"));
        assert!(answer.contains("unauthorized"));
    }

    #[tokio::test]
    async fn test_query_without_data_skips_backend() {
        let backend = StubBackend::new(Ok("unused".to_string()));
        let service = QueryService::new(backend.clone());

        let answer = service.query_data(None, "How many?", "k", "openai/gpt-4o").await;

        assert_eq!(answer, "❌ No data loaded. Load the CSV files first.");
        assert!(backend.seen.lock().unwrap().is_empty());
    }
}
