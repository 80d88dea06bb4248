use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripwise_tools=info".into()),
        )
        .init();

    let host = std::env::var("TOOLS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("TOOLS_PORT").unwrap_or_else(|_| "8090".into());
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Travel tool server listening on {addr}");
    axum::serve(listener, tripwise_tools::router()).await
}
