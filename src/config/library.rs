use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("code_review", include_str!("../../prompts/code_review.txt")),
    ("debugging", include_str!("../../prompts/debugging.txt")),
    ("documentation", include_str!("../../prompts/documentation.txt")),
    ("linux_help", include_str!("../../prompts/linux_help.txt")),
    ("linux_quick", include_str!("../../prompts/linux_quick.txt")),
    ("markdown_expert", include_str!("../../prompts/markdown_expert.txt")),
    ("text_summary", include_str!("../../prompts/text_summary.txt")),
];

/// A named bundle of a system prompt reference and a default user prompt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskDefinition {
    pub name: String,
    pub description: String,
    pub goal: String,
    /// Name of a system prompt, or the literal prompt text when no such name exists.
    pub system_prompt: String,
    /// May contain `{context}` and `{goal}` placeholders.
    pub user_prompt: String,
}

/// Named system prompts and tasks, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    prompts: BTreeMap<String, String>,
    tasks: BTreeMap<String, TaskDefinition>,
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

impl PromptLibrary {
    pub fn builtin() -> Self {
        let prompts = BUILTIN_PROMPTS
            .iter()
            .map(|(name, text)| (name.to_string(), text.trim().to_string()))
            .collect();
        Self {
            prompts,
            tasks: BTreeMap::new(),
        }
    }

    /// Built-in prompts overlaid with `*.txt`/`*.md` files from `prompts_dir`, plus
    /// `*.yaml`/`*.yml` tasks from `tasks_dir`. Missing directories are not an error;
    /// unreadable entries are skipped with a warning.
    pub fn load(prompts_dir: &Path, tasks_dir: &Path) -> Self {
        let mut library = Self::builtin();

        if prompts_dir.is_dir() {
            match sorted_entries(prompts_dir) {
                Ok(paths) => {
                    for path in paths.iter().filter(|p| has_extension(p, &["txt", "md"])) {
                        if let Err(e) = library.add_prompt_file(path) {
                            warn!("Skipping system prompt {}: {e:#}", path.display());
                        }
                    }
                }
                Err(e) => warn!("{e:#}"),
            }
        }

        if tasks_dir.is_dir() {
            match sorted_entries(tasks_dir) {
                Ok(paths) => {
                    for path in paths.iter().filter(|p| has_extension(p, &["yaml", "yml"])) {
                        if let Err(e) = library.add_task_file(path) {
                            warn!("Skipping task {}: {e:#}", path.display());
                        }
                    }
                }
                Err(e) => warn!("{e:#}"),
            }
        }

        info!(
            "Loaded {} system prompts and {} tasks",
            library.prompts.len(),
            library.tasks.len()
        );
        library
    }

    fn add_prompt_file(&mut self, path: &Path) -> Result<()> {
        let name = stem(path).context("File name is not valid UTF-8")?;
        let text = fs::read_to_string(path)?;
        debug!("System prompt '{name}' from {}", path.display());
        self.prompts.insert(name, text.trim().to_string());
        Ok(())
    }

    fn add_task_file(&mut self, path: &Path) -> Result<()> {
        let name = stem(path).context("File name is not valid UTF-8")?;
        let content = fs::read_to_string(path)?;
        let mut task: TaskDefinition =
            serde_yaml::from_str(&content).context("Invalid task definition")?;
        if task.name.is_empty() {
            task.name = name.clone();
        }
        debug!("Task '{name}' from {}", path.display());
        self.tasks.insert(name, task);
        Ok(())
    }

    pub fn insert_task(&mut self, key: &str, task: TaskDefinition) {
        self.tasks.insert(key.to_string(), task);
    }

    pub fn system_prompt(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    pub fn task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    /// The system prompt a task refers to: a library prompt when the reference names
    /// one, the reference itself otherwise, nothing when it is blank.
    pub fn task_system_prompt<'a>(&'a self, task: &'a TaskDefinition) -> Option<&'a str> {
        let reference = task.system_prompt.trim();
        if reference.is_empty() {
            None
        } else {
            Some(self.system_prompt(reference).unwrap_or(reference))
        }
    }

    pub fn prompt_names(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&str, &TaskDefinition)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtins_are_always_present() {
        let library = PromptLibrary::builtin();
        assert!(library.system_prompt("code_review").is_some());
        assert!(library.prompt_names().any(|n| n == "linux_quick"));
        assert!(library.system_prompt("nope").is_none());
    }

    #[test]
    fn directory_files_add_and_override() {
        let prompts = TempDir::new().unwrap();
        let tasks = TempDir::new().unwrap();
        fs::write(prompts.path().join("pirate.txt"), "Talk like a pirate.\n").unwrap();
        fs::write(prompts.path().join("code_review.md"), "Be brief.").unwrap();
        fs::write(prompts.path().join("ignored.json"), "{}").unwrap();
        fs::write(
            tasks.path().join("summarize_paper.yaml"),
            "description: Summarize a paper\ngoal: a one-page brief\nsystem_prompt: text_summary\nuser_prompt: \"Summarize for {goal}:\\n{context}\"\n",
        )
        .unwrap();
        fs::write(tasks.path().join("broken.yaml"), "description: [unclosed").unwrap();

        let library = PromptLibrary::load(prompts.path(), tasks.path());

        assert_eq!(library.system_prompt("pirate"), Some("Talk like a pirate."));
        assert_eq!(library.system_prompt("code_review"), Some("Be brief."));
        assert!(library.system_prompt("ignored").is_none());

        let task = library.task("summarize_paper").unwrap();
        assert_eq!(task.name, "summarize_paper");
        assert_eq!(task.goal, "a one-page brief");
        assert_eq!(
            library.task_system_prompt(task),
            library.system_prompt("text_summary")
        );
        assert!(library.task("broken").is_none());
    }

    #[test]
    fn task_prompt_reference_falls_back_to_literal_text() {
        let library = PromptLibrary::builtin();
        let task = TaskDefinition {
            system_prompt: "You only answer in haiku.".to_string(),
            ..TaskDefinition::default()
        };
        assert_eq!(
            library.task_system_prompt(&task),
            Some("You only answer in haiku.")
        );
        assert_eq!(library.task_system_prompt(&TaskDefinition::default()), None);
    }

    #[test]
    fn missing_directories_leave_builtins() {
        let dir = TempDir::new().unwrap();
        let library = PromptLibrary::load(&dir.path().join("a"), &dir.path().join("b"));
        assert_eq!(library.tasks().count(), 0);
        assert_eq!(library.prompt_names().count(), BUILTIN_PROMPTS.len());
    }
}
