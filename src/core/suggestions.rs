/// A canned prompt offered on the welcome screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub const WELCOME_HEADING: &str = "Hello, how can I help?";
pub const WELCOME_BLURB: &str =
    "I am a large language model, trained by Google. Start a conversation or try one of these prompts.";

pub const WELCOME_SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        title: "Explain a concept",
        prompt: "Explain quantum computing in simple terms",
    },
    Suggestion {
        title: "Write a creative piece",
        prompt: "Write a short story about a robot who discovers music",
    },
    Suggestion {
        title: "Provide code",
        prompt: "Show me a Python code snippet for a web scraper",
    },
    Suggestion {
        title: "Plan a trip",
        prompt: "What are some must-see places for a 3-day trip to Tokyo?",
    },
];

pub fn suggestion(index: usize) -> Option<&'static Suggestion> {
    WELCOME_SUGGESTIONS.get(index)
}
