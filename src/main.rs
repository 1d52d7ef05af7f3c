mod client;
mod config;
mod converters;
mod dispatch;
mod error;
mod llm_client;
mod logging;
mod model_checks;
mod models;
mod reactions;
mod request_id;
mod router;
mod state;

use anyhow::Context;
use clap::{Parser, Subcommand};
use client::{GatewayClient, PanelUpdate};
use config::{Config, Provider};
use dispatch::Dispatcher;
use llm_client::LlmClient;
use models::{CallStatus, PromptRequest};
use reactions::MemoryReactionStore;
use state::AppState;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "llm-fanout")]
#[command(about = "Sends one prompt to Gemini, Groq and OpenAI at once")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, default_value = "0.0.0.0", global = true)]
    ip: String,

    #[arg(short, long, env = "PORT", default_value = "3000", global = true)]
    port: u16,

    /// Path to provider config (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Also log to this file, capped at 10 MiB
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long, global = true)]
    proxy: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default)
    Serve,
    /// Ask a running gateway and print each provider's answer as it arrives
    Ask {
        prompt: String,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long, default_value = "http://localhost:3000")]
        gateway: String,
    },
    /// Send a one-token prompt to every configured provider
    Check,
}

fn load_config(path: Option<&str>) -> anyhow::Result<Arc<Config>> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.unwrap_or("<defaults>")))?
        .with_credentials_from_env();
    if let Some(p) = path {
        info!("Configuration loaded successfully from: {}", p);
    }
    for provider in Provider::ALL {
        let settings = config.settings(provider);
        if settings.api_key.is_none() {
            warn!("{} not set; /api/{} will answer 500", settings.api_key_env, provider);
        }
    }
    Ok(Arc::new(config))
}

fn build_http_client(proxy: Option<&str>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy).context("invalid proxy url")?);
    }
    builder.build().context("failed to build HTTP client")
}

async fn serve(ip: &str, port: u16, config: Arc<Config>, http_client: reqwest::Client) -> anyhow::Result<()> {
    let llm_client = Arc::new(LlmClient::new(Arc::new(http_client), config));
    let app_state = AppState::new(
        Dispatcher::new(llm_client),
        Arc::new(MemoryReactionStore::new()),
    );
    let app = router::build_router(app_state);

    let bind_address = format!("{}:{}", ip, port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

fn print_update(update: &PanelUpdate) {
    let ms = update.duration_ms.unwrap_or(0);
    match update.status {
        CallStatus::Running => println!("[{}] running...", update.provider),
        CallStatus::Done => println!(
            "[{}] done in {} ms\n{}\n",
            update.provider,
            ms,
            update.text.as_deref().unwrap_or_default()
        ),
        CallStatus::Error => println!(
            "[{}] error after {} ms: {}\n",
            update.provider,
            ms,
            update.error.as_deref().unwrap_or_default()
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref());
    logging::install_panic_hook();

    let http_client = build_http_client(args.proxy.as_deref())?;

    match args.command.take().unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = load_config(args.config.as_deref())?;
            serve(&args.ip, args.port, config, http_client).await
        }
        Command::Ask {
            prompt,
            temperature,
            max_tokens,
            gateway,
        } => {
            let mut request = PromptRequest::new(prompt);
            if let Some(t) = temperature {
                request = request.with_temperature(t);
            }
            if let Some(m) = max_tokens {
                request = request.with_max_tokens(m);
            }
            request.validate()?;

            let client = GatewayClient::new(http_client, gateway);
            match client.ask_all(&request, print_update).await {
                CallStatus::Done => println!("all providers answered"),
                _ => println!("some providers failed"),
            }
            Ok(())
        }
        Command::Check => {
            let config = load_config(args.config.as_deref())?;
            let llm_client = Arc::new(LlmClient::new(Arc::new(http_client), config));
            model_checks::perform_provider_checks(&llm_client).await;
            Ok(())
        }
    }
}
