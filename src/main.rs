use nf_analyzer::{router, AppConfig, AppState, OpenRouterClient, QueryService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // OpenRouter 客户端 + 查询服务
    let client = OpenRouterClient::new(config.openrouter.clone())?;
    info!("OpenRouter endpoint: {}", client.endpoint());
    let state = AppState::new(QueryService::new(Arc::new(client)));

    let app = router(state, config.server.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/sessions                 - create session (api_key, model)");
    info!("  POST /api/sessions/:id/upload      - upload header/items CSV files");
    info!("  POST /api/sessions/:id/sample      - load sample data");
    info!("  GET  /api/sessions/:id/summary     - data summary");
    info!("  POST /api/sessions/:id/query       - ask a question");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
