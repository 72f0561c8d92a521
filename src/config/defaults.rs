use anyhow::Result;

use crate::config::Settings;

pub struct DefaultConfig;

impl DefaultConfig {
    pub fn create_default_config_file() -> Result<String> {
        let body = toml::to_string_pretty(&Settings::default())?;
        Ok(format!(
            "# argoagent settings\n\
             #\n\
             # [api] url and user may also come from ARGO_URL / ARGO_USER;\n\
             # command-line flags override everything in this file.\n\n\
             {body}"
        ))
    }

    /// Sample task written by `argoagent init` so the format is discoverable.
    pub fn example_task() -> &'static str {
        r#"description: Review the attached code and list the most important fixes
goal: a prioritised list of defects with suggested patches
system_prompt: code_review
user_prompt: |
  Review the following code. Focus on {goal}.

  {context}
"#
    }
}
