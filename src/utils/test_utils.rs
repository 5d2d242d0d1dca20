use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{stream, StreamExt};

use crate::core::app::App;
use crate::core::session::{
    FragmentStream, ProviderError, SessionHandle, SessionProvider, StreamError,
};
use crate::core::transcript::TranscriptController;
use crate::ui::theme::Theme;

/// One step of a scripted model response.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    Fragment(String),
    Fail(String),
}

impl ScriptStep {
    pub fn fragment(text: &str) -> Self {
        ScriptStep::Fragment(text.to_string())
    }

    pub fn fail(message: &str) -> Self {
        ScriptStep::Fail(message.to_string())
    }
}

/// Provider double that replays the same script for every response.
pub struct ScriptedProvider {
    steps: Vec<ScriptStep>,
    unavailable: Mutex<Option<String>>,
    created: AtomicUsize,
    last_instruction: Mutex<Option<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            unavailable: Mutex::new(None),
            created: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(fragments.into_iter().map(ScriptStep::fragment).collect())
    }

    pub fn unavailable(reason: &str) -> Self {
        let provider = Self::new(Vec::new());
        provider.fail_sessions(reason);
        provider
    }

    /// Makes every later `create_session` call fail.
    pub fn fail_sessions(&self, reason: &str) {
        *self.unavailable.lock().expect("lock") = Some(reason.to_string());
    }

    /// A session that bypasses the availability check.
    pub fn session(&self) -> Arc<dyn SessionHandle> {
        Arc::new(ScriptedSession {
            steps: self.steps.clone(),
            prompts: Arc::clone(&self.prompts),
        })
    }

    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction.lock().expect("lock").clone()
    }

    /// User texts sent to any session, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

impl SessionProvider for ScriptedProvider {
    fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Arc<dyn SessionHandle>, ProviderError> {
        if let Some(reason) = self.unavailable.lock().expect("lock").clone() {
            return Err(ProviderError::unavailable(reason));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_instruction.lock().expect("lock") = Some(system_instruction.to_string());
        Ok(self.session())
    }
}

struct ScriptedSession {
    steps: Vec<ScriptStep>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl SessionHandle for ScriptedSession {
    fn stream_response(&self, user_text: &str) -> FragmentStream {
        self.prompts
            .lock()
            .expect("lock")
            .push(user_text.to_string());
        let items: Vec<Result<String, StreamError>> = self
            .steps
            .iter()
            .map(|step| match step {
                ScriptStep::Fragment(text) => Ok(text.clone()),
                ScriptStep::Fail(message) => Err(StreamError::new(message.clone())),
            })
            .collect();
        stream::iter(items).boxed()
    }
}

pub fn create_test_controller() -> TranscriptController {
    let provider = Arc::new(ScriptedProvider::replying(["Hello!"]));
    TranscriptController::new(provider, "test instruction").expect("controller")
}

pub fn create_test_app() -> App {
    create_test_app_with(Arc::new(ScriptedProvider::replying(["Hello!"])))
}

pub fn create_test_app_with(provider: Arc<ScriptedProvider>) -> App {
    let controller = TranscriptController::new(provider, "test instruction").expect("controller");
    App::new(controller, "test-model".to_string(), Theme::dark_default(), true)
}
