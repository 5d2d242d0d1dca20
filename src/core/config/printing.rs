use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.summary_lines() {
            println!("  {line}");
        }
    }

    pub(crate) fn summary_lines(&self) -> Vec<String> {
        let or_default = |value: &Option<String>, default: &str| match value {
            Some(value) => value.clone(),
            None => format!("{default} (default)"),
        };
        vec![
            format!("model: {}", or_default(&self.model, self.model_or_default())),
            format!(
                "base-url: {}",
                or_default(&self.base_url, self.base_url_or_default())
            ),
            format!(
                "system-instruction: {}",
                or_default(
                    &self.system_instruction,
                    self.system_instruction_or_default()
                )
            ),
            format!("theme: {}", or_default(&self.theme, self.theme_name())),
            match self.markdown_enabled() {
                true => "markdown: on".to_string(),
                false => "markdown: off".to_string(),
            },
        ]
    }
}
