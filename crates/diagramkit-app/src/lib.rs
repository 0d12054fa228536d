//! DiagramKit Application
//!
//! The editor façade a host UI binds to, plus its configuration,
//! localization and keyboard shortcuts.

mod config;
mod editor;
mod i18n;
mod shortcuts;

pub use config::{ConfigError, EditorConfig, IdStrategy, Placement};
pub use editor::{Editor, EditorError, EditorResult};
pub use i18n::{Catalog, I18nError, Translator};
pub use shortcuts::{Command, Shortcut, ShortcutRegistry};
