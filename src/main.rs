//! Model Router
//!
//! Routes prompts to AWS Bedrock or Azure OpenAI behind one request and
//! response shape, retrying once on a fallback model.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use model_router::{
    config::{Environment, LogFormat, Settings},
    logging::init_tracing,
    schemas::{InferenceParams, ModelRequest},
    server::App,
    services::ModelRouter,
    tools::catalog,
};

/// Model Router
///
/// One request shape for Bedrock and Azure OpenAI models, with fallback.
#[derive(Parser, Debug)]
#[command(name = "model-router")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (overrides LOG_FORMAT env var)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
    #[arg(short, long, global = true)]
    env: Option<Environment>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides PORT env var)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides HOST env var)
        #[arg(long)]
        host: Option<String>,
    },

    /// Route a single prompt and print the response JSON
    Ask {
        /// Model alias or provider model id
        #[arg(short, long)]
        model: String,

        /// User prompt
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<i32>,

        /// Catalog tool modules or function names to offer the model
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,

        /// Fail instead of retrying on the fallback model
        #[arg(long)]
        no_fallback: bool,
    },

    /// Print registered models grouped by provider
    Models,

    /// Print the tool catalog schemas
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load()?;

    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(log_format) = args.log_format {
        settings.log_format = log_format;
    }
    if let Some(env) = args.env {
        settings.environment = env;
    }

    init_tracing(&settings.log_level, settings.log_format);

    match args.command {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(host) = host {
                settings.host = host;
            }
            settings.validate()?;
            serve(settings).await
        }
        Command::Ask {
            model,
            prompt,
            system,
            temperature,
            max_tokens,
            tools,
            no_fallback,
        } => {
            if no_fallback {
                settings.fallback_enabled = false;
            }
            settings.validate()?;

            let mut params = InferenceParams::new();
            if let Some(temperature) = temperature {
                params = params.with_temperature(temperature);
            }
            if let Some(max_tokens) = max_tokens {
                params = params.with_max_tokens(max_tokens);
            }

            let mut request = ModelRequest::new(model, prompt).with_params(params);
            if let Some(system) = system {
                request = request.with_system_prompt(system);
            }
            if !tools.is_empty() {
                request = request.with_tools(catalog::select(&tools)?);
            }

            ask(&settings, request).await
        }
        Command::Models => {
            let router = ModelRouter::from_settings(&settings).await?;
            let listing = serde_json::json!({
                "models": router.list_models().await,
                "fallback_model": router.policy().default_model,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
        Command::Tools => {
            let tools = catalog::all()?;
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        environment = %settings.environment,
        host = %settings.host,
        port = %settings.port,
        "Starting application"
    );

    let app = App::new(settings).await?;
    app.run_with_graceful_shutdown().await?;

    tracing::info!("Application shutdown complete");
    Ok(())
}

async fn ask(settings: &Settings, request: ModelRequest) -> Result<()> {
    let router = ModelRouter::from_settings(settings).await?;
    tracing::debug!(
        fallback_enabled = router.policy().enabled,
        fallback_model = %router.policy().default_model,
        "Routing single request"
    );

    let response = router
        .route(request)
        .await
        .context("Request could not be routed")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
