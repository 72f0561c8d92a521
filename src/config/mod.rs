pub mod defaults;
pub mod library;
pub mod settings;

pub use defaults::DefaultConfig;
pub use library::{PromptLibrary, TaskDefinition};
pub use settings::Settings;
