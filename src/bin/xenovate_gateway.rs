//! xenovate-gateway：代码分析网关服务进程
//!
//! Usage:
//!   xenovate-gateway              Serve until Ctrl-C
//!   xenovate-gateway --version    Show version information
//!   xenovate-gateway --help       Show configuration variables

use anyhow::Context;
use tracing::info;
use xenovate::config::GatewayConfig;

fn print_usage() {
    println!(
        r#"xenovate-gateway: code analysis gateway

USAGE:
    xenovate-gateway [--help | --version]

ENVIRONMENT:
    GOOGLE_API_KEY / GEMINI_API_KEY   Model credential (fallback mode when absent)
    XENOVATE_MODEL                    Model identifier
    XENOVATE_GEMINI_BASE_URL          Model API base URL
    XENOVATE_HTTP_TIMEOUT_SECS        Model call timeout
    XENOVATE_PROXY_URL                Outbound proxy
    XENOVATE_CONFIG                   Optional YAML config file
    HOST / PORT                       Bind address (default 0.0.0.0:8000)
    CORS_ORIGINS                      Comma-separated origins (default *)
    SUPABASE_URL / SUPABASE_KEY       Persistence store
    RUST_LOG                          Log filter (default info)"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::args().nth(1).as_deref() {
        Some("--help" | "-h" | "help") => {
            print_usage();
            return Ok(());
        }
        Some("--version" | "-V" | "version") => {
            println!("xenovate-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown argument: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
        None => {}
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    let config = GatewayConfig::from_env().context("loading gateway configuration")?;
    info!(
        address = %config.bind_address(),
        model = %config.model.model,
        store = config.store.is_some(),
        "starting xenovate gateway"
    );
    xenovate::gateway::serve(config)
        .await
        .context("gateway server failed")?;
    Ok(())
}
