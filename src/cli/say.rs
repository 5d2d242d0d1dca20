//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::data::Config;
use crate::core::gemini::GeminiProvider;
use crate::core::transcript::TranscriptController;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExchangeOutcome {
    Completed,
    /// The reply failed; `notice` is what the user should see.
    Failed { notice: String },
    Rejected,
}

pub async fn run_say(
    prompt: Vec<String>,
    model: Option<String>,
    env_only: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: gemini-chat say <prompt>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let controller = GeminiProvider::from_config(&config, model.as_deref(), env_only)
        .and_then(|provider| {
            TranscriptController::new(
                Arc::new(provider),
                config.system_instruction_or_default(),
            )
        });
    let mut controller = match controller {
        Ok(controller) => controller,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    let mut stdout = io::stdout();
    match run_exchange(&mut controller, &prompt, &mut stdout).await? {
        ExchangeOutcome::Completed => Ok(()),
        ExchangeOutcome::Failed { notice } => {
            eprintln!("{notice}");
            std::process::exit(1);
        }
        ExchangeOutcome::Rejected => {
            eprintln!("Usage: gemini-chat say <prompt>");
            std::process::exit(1);
        }
    }
}

/// Runs one user/model exchange, echoing fragments to `out` as they arrive.
pub(crate) async fn run_exchange<W: Write>(
    controller: &mut TranscriptController,
    prompt: &str,
    out: &mut W,
) -> io::Result<ExchangeOutcome> {
    if !controller.append_user_turn(prompt).is_accepted() {
        return Ok(ExchangeOutcome::Rejected);
    }

    let Some(stream_id) = controller.begin_streaming() else {
        return Ok(ExchangeOutcome::Rejected);
    };
    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(StreamParams {
        session: controller.session(),
        user_text: prompt.to_string(),
        stream_id,
    });
    drop(stream_service);

    let mut wrote_any = false;
    let mut failure = None;
    while let Some((message, id)) = rx.recv().await {
        if !controller.is_current_response(id) {
            continue;
        }
        match message {
            StreamMessage::Chunk(content) => {
                controller.consume_fragment(&content);
                write!(out, "{content}")?;
                out.flush()?;
                wrote_any = true;
            }
            StreamMessage::Error(err) => {
                controller.end_streaming(Some(&err));
                failure = Some(err);
            }
            StreamMessage::End => {
                controller.end_streaming(None);
            }
        }
    }

    if wrote_any {
        writeln!(out)?;
    }

    Ok(match failure {
        None => ExchangeOutcome::Completed,
        // Without partial output the controller has added a synthetic turn.
        Some(_) if !wrote_any => ExchangeOutcome::Failed {
            notice: controller
                .last_turn()
                .map(|turn| turn.text.clone())
                .unwrap_or_default(),
        },
        Some(err) => ExchangeOutcome::Failed {
            notice: err.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Turn;
    use crate::core::transcript::STREAM_ERROR_TEXT;
    use crate::utils::test_utils::{ScriptStep, ScriptedProvider};

    fn controller(steps: Vec<ScriptStep>) -> TranscriptController {
        TranscriptController::new(Arc::new(ScriptedProvider::new(steps)), "be brief")
            .expect("controller")
    }

    #[tokio::test]
    async fn streams_fragments_to_output() {
        let mut controller = controller(vec![
            ScriptStep::fragment("Hel"),
            ScriptStep::fragment("lo!"),
        ]);
        let mut out = Vec::new();

        let outcome = run_exchange(&mut controller, "Hi", &mut out)
            .await
            .expect("exchange");

        assert_eq!(outcome, ExchangeOutcome::Completed);
        assert_eq!(String::from_utf8(out).expect("utf8"), "Hello!\n");
        assert_eq!(
            controller.turns(),
            &[Turn::user("Hi"), Turn::model("Hello!")]
        );
        assert!(!controller.is_in_flight());
    }

    #[tokio::test]
    async fn failure_without_output_reports_synthetic_turn() {
        let mut controller = controller(vec![ScriptStep::fail("offline")]);
        let mut out = Vec::new();

        let outcome = run_exchange(&mut controller, "Hi", &mut out)
            .await
            .expect("exchange");

        assert_eq!(
            outcome,
            ExchangeOutcome::Failed {
                notice: STREAM_ERROR_TEXT.to_string()
            }
        );
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn failure_after_output_reports_error() {
        let mut controller = controller(vec![
            ScriptStep::fragment("Par"),
            ScriptStep::fail("offline"),
        ]);
        let mut out = Vec::new();

        let outcome = run_exchange(&mut controller, "Hi", &mut out)
            .await
            .expect("exchange");

        assert_eq!(
            outcome,
            ExchangeOutcome::Failed {
                notice: "Stream error: offline".to_string()
            }
        );
        assert_eq!(controller.turns().len(), 2);
        assert_eq!(controller.turns()[1], Turn::model("Par"));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let mut controller = controller(Vec::new());
        let outcome = run_exchange(&mut controller, "  ", &mut Vec::new())
            .await
            .expect("exchange");
        assert_eq!(outcome, ExchangeOutcome::Rejected);
        assert!(controller.is_empty());
    }
}
