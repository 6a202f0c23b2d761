use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use brand_gen::brand::{BrandFlow, Publisher, TracingPublisher, flow_routes};
use brand_gen::channels::CliChannel;
use brand_gen::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...   (or BRAND_GEN_BACKEND=openai + OPENAI_API_KEY)");
            std::process::exit(1);
        }
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "brand-gen.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    let interactive = config.interactive(std::io::stdin().is_terminal());

    eprintln!("✨ brand-gen v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {} (model: {})", config.llm.backend, config.llm.model);
    if let Some(port) = config.http_port {
        eprintln!("   HTTP API: http://0.0.0.0:{port}/api/sessions/{{identity}}");
    }
    if let Some(dir) = &config.log_dir {
        eprintln!("   Logs: {}", dir.display());
    }
    if interactive {
        eprintln!("   Type a number to pick a menu entry. /quit to exit.\n");
    }

    let publisher: Arc<dyn Publisher> = Arc::new(TracingPublisher);
    let flow = Arc::new(
        BrandFlow::from_config(&config, publisher).context("failed to create LLM provider")?,
    );

    let server = match config.http_port {
        Some(port) => {
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("failed to bind HTTP port {port}"))?;
            let app = flow_routes(Arc::clone(&flow));
            Some(tokio::spawn(async move {
                tracing::info!(port = port, "HTTP server started");
                axum::serve(listener, app).await
            }))
        }
        None => None,
    };

    if interactive {
        CliChannel::new()
            .run(&flow)
            .await
            .context("CLI channel failed")?;
    } else if let Some(server) = server {
        tracing::info!("stdin is not a terminal, serving HTTP only");
        server
            .await
            .context("HTTP server task panicked")?
            .context("HTTP server stopped")?;
    }

    eprintln!("👋 Bye!");
    Ok(())
}
