use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use super::AppHandle;

use crate::core::{
    app::App, config::data::Config, gemini::GeminiProvider, transcript::TranscriptController,
};
use crate::ui::theme::Theme;

/// Build the application state for the chat loop.
///
/// Provider failures are reported on stderr before the terminal is taken
/// over, and end the process.
pub async fn bootstrap_app(
    model: Option<String>,
    env_only: bool,
) -> Result<AppHandle, Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let provider = GeminiProvider::from_config(&config, model.as_deref(), env_only);
    let started = provider.and_then(|provider| {
        let model = provider.model().to_string();
        TranscriptController::new(Arc::new(provider), config.system_instruction_or_default())
            .map(|controller| (controller, model))
    });

    let (controller, model) = match started {
        Ok(started) => started,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    info!(%model, "starting chat session");
    let theme = Theme::from_name(config.theme_name());
    let app = App::new(controller, model, theme, config.markdown_enabled());
    Ok(AppHandle::new(Arc::new(Mutex::new(app))))
}
