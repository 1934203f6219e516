use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::ServerConfig;
use letterpdf_core::config::{flag_from_env_value, resolve_template_path};
use letterpdf_core::{chromium_generator, ChromiumConfig, CoreConfig, Letterhead};

/// Main entry point for the letterpdf server
///
/// Loads `.env`, resolves configuration from the environment and serves the REST API
/// and the letter form.
///
/// # Environment Variables
/// - `PORT`: listening port (default: 3000)
/// - `LETTERPDF_REST_ADDR`: full listen address, overrides `PORT` (default: "0.0.0.0:$PORT")
/// - `ACCESS_PASSWORD`: shared password for the letter form (required)
/// - `LETTERPDF_TEMPLATE_PATH`: letter template (default: "templates/letter.html")
/// - `LETTERPDF_LOGO_PATH`, `LETTERPDF_SIGNATURE_PATH`: letterhead images
/// - `LETTERPDF_SENDER_NAME`, `LETTERPDF_SENDER_TITLE`: default sender block
/// - `LETTERPDF_TEMP_DIR`: root for per-request working directories (default: "temp")
/// - `LETTERPDF_PUBLIC_DIR`: static files (default: "public")
/// - `CHROME_EXECUTABLE`: browser binary, searched for when unset
/// - `LETTERPDF_CHROME_SANDBOX`: keep Chrome's sandbox on (default: false)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("letterpdf_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("letterpdf_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let access_password = std::env::var("ACCESS_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .context("ACCESS_PASSWORD must be set")?;

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let rest_addr =
        std::env::var("LETTERPDF_REST_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{port}"));

    let template_path =
        resolve_template_path(std::env::var("LETTERPDF_TEMPLATE_PATH").ok().map(PathBuf::from))?;
    tracing::info!("letter template: {}", template_path.display());

    let defaults = Letterhead::default();
    let letterhead = Letterhead {
        logo_path: env_path("LETTERPDF_LOGO_PATH").unwrap_or(defaults.logo_path),
        signature_path: env_path("LETTERPDF_SIGNATURE_PATH").unwrap_or(defaults.signature_path),
        sender_name: std::env::var("LETTERPDF_SENDER_NAME").unwrap_or(defaults.sender_name),
        sender_title: std::env::var("LETTERPDF_SENDER_TITLE").unwrap_or(defaults.sender_title),
    };

    let chromium = ChromiumConfig {
        executable: env_path("CHROME_EXECUTABLE"),
        sandbox: flag_from_env_value(std::env::var("LETTERPDF_CHROME_SANDBOX").ok(), false),
        request_timeout: Duration::from_secs(30),
    };

    let core = CoreConfig::new(template_path, letterhead, chromium);
    let generator = chromium_generator(&core);

    api_rest::serve(
        ServerConfig {
            addr: rest_addr,
            access_password,
            temp_dir: env_path("LETTERPDF_TEMP_DIR").unwrap_or_else(|| PathBuf::from("temp")),
            public_dir: env_path("LETTERPDF_PUBLIC_DIR").unwrap_or_else(|| PathBuf::from("public")),
            letterhead: core.letterhead().clone(),
        },
        generator,
    )
    .await
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
