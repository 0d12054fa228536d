//! UI label localization.
//!
//! The editor only ever holds a language key and label keys; turning them
//! into text is the job of a [`Translator`].

use std::collections::BTreeMap;
use thiserror::Error;

/// Localization errors.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Resolves label keys to text in the active language.
pub trait Translator {
    /// Switch the active language.
    fn use_language(&mut self, language: &str) -> Result<(), I18nError>;

    /// Active language key.
    fn language(&self) -> &str;

    /// Translated label, or the key itself when no translation exists.
    fn translate(&self, key: &str) -> String;
}

const FALLBACK_LANGUAGE: &str = "en";

const EN: &[(&str, &str)] = &[
    ("MENU_FILE", "File"),
    ("MENU_FILE_NEW", "New"),
    ("MENU_EDIT", "Edit"),
    ("MENU_EDIT_DELETE", "Delete"),
    ("MENU_VIEW", "View"),
    ("MENU_VIEW_GRID", "Show grid"),
    ("MENU_VIEW_SNAP", "Snap to grid"),
    ("MENU_INSERT", "Insert"),
    ("MENU_LANGUAGE", "Language"),
    ("MODE_POINTER", "Pointer"),
    ("MODE_CONNECTOR", "Connector"),
    ("SHAPE_RECT", "Rectangle"),
    ("SHAPE_ELLIPSE", "Ellipse"),
    ("SHAPE_LINE", "Line"),
    ("CONTAINER", "Container"),
];

const FR: &[(&str, &str)] = &[
    ("MENU_FILE", "Fichier"),
    ("MENU_FILE_NEW", "Nouveau"),
    ("MENU_EDIT", "Édition"),
    ("MENU_EDIT_DELETE", "Supprimer"),
    ("MENU_VIEW", "Affichage"),
    ("MENU_VIEW_GRID", "Afficher la grille"),
    ("MENU_VIEW_SNAP", "Aligner sur la grille"),
    ("MENU_INSERT", "Insertion"),
    ("MENU_LANGUAGE", "Langue"),
    ("MODE_POINTER", "Pointeur"),
    ("MODE_CONNECTOR", "Connecteur"),
    ("SHAPE_RECT", "Rectangle"),
    ("SHAPE_ELLIPSE", "Ellipse"),
    ("SHAPE_LINE", "Ligne"),
    ("CONTAINER", "Conteneur"),
];

/// In-memory translation catalog: language key -> label key -> text.
#[derive(Debug, Clone)]
pub struct Catalog {
    languages: BTreeMap<String, BTreeMap<String, String>>,
    current: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Built-in English and French labels, English active.
    pub fn builtin() -> Self {
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        let mut languages = BTreeMap::new();
        languages.insert("en".to_string(), table(EN));
        languages.insert("fr".to_string(), table(FR));
        Self {
            languages,
            current: FALLBACK_LANGUAGE.to_string(),
        }
    }

    /// Parse a catalog of the form `{"en": {"MENU_FILE": "File"}, ...}`.
    ///
    /// The fallback language is active if present, otherwise the first one.
    pub fn from_json(json: &str) -> Result<Self, I18nError> {
        let languages: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(json)?;
        let current = if languages.contains_key(FALLBACK_LANGUAGE) {
            FALLBACK_LANGUAGE.to_string()
        } else {
            languages.keys().next().cloned().unwrap_or_default()
        };
        Ok(Self { languages, current })
    }

    /// Add or replace one language's labels.
    pub fn insert_language(&mut self, language: impl Into<String>, labels: BTreeMap<String, String>) {
        self.languages.insert(language.into(), labels);
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }
}

impl Translator for Catalog {
    fn use_language(&mut self, language: &str) -> Result<(), I18nError> {
        if !self.languages.contains_key(language) {
            return Err(I18nError::UnknownLanguage(language.to_string()));
        }
        log::info!("language {} -> {language}", self.current);
        self.current = language.to_string();
        Ok(())
    }

    fn language(&self) -> &str {
        &self.current
    }

    fn translate(&self, key: &str) -> String {
        [self.current.as_str(), FALLBACK_LANGUAGE]
            .iter()
            .find_map(|lang| self.languages.get(*lang)?.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
