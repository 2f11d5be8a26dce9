//! Section registry: visibility, titles and ordering layered over the document.
//!
//! Built-in sections are fixed struct fields on [`CvDocument`]; dynamic sections are
//! entries in `custom_sections`. Every operation here validates before it mutates, so a
//! rejected call leaves the document exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cv::models::{
    BasicInfo, CvDocument, EducationEntry, ExperienceEntry, GenericItem, ProjectEntry,
    SkillEntry, Summary,
};

/// Top-level document fields a dynamic section may never shadow.
const RESERVED_FIELDS: &[&str] = &["activeTheme", "sectionConfig"];

#[derive(Debug, Error, PartialEq)]
pub enum SectionError {
    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Built-in section '{0}' cannot be removed")]
    BuiltInSection(String),

    #[error("A section with key '{0}' already exists")]
    DuplicateSection(String),

    #[error("Section title must contain at least one non-space character")]
    EmptyTitle,

    #[error("Section '{0}' has no title")]
    Untitled(String),

    #[error("Invalid section key '{0}'")]
    InvalidKey(String),

    #[error("Content for section '{key}' must be {expected}")]
    ContentMismatch { key: String, expected: &'static str },

    #[error("Inconsistent section configuration: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltInSection {
    BasicInfo,
    Summary,
    Experiences,
    Education,
    Skills,
    Projects,
}

impl BuiltInSection {
    pub const ALL: [BuiltInSection; 6] = [
        BuiltInSection::BasicInfo,
        BuiltInSection::Summary,
        BuiltInSection::Experiences,
        BuiltInSection::Education,
        BuiltInSection::Skills,
        BuiltInSection::Projects,
    ];

    /// Built-ins that take part in `order`; basic info is always the header.
    pub const ORDERABLE: [BuiltInSection; 5] = [
        BuiltInSection::Summary,
        BuiltInSection::Experiences,
        BuiltInSection::Education,
        BuiltInSection::Skills,
        BuiltInSection::Projects,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BuiltInSection::BasicInfo => "basicInfo",
            BuiltInSection::Summary => "summary",
            BuiltInSection::Experiences => "experiences",
            BuiltInSection::Education => "education",
            BuiltInSection::Skills => "skills",
            BuiltInSection::Projects => "projects",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            BuiltInSection::BasicInfo => "Basic Info",
            BuiltInSection::Summary => "Summary",
            BuiltInSection::Experiences => "Experience",
            BuiltInSection::Education => "Education",
            BuiltInSection::Skills => "Skills",
            BuiltInSection::Projects => "Projects",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// A section key: one of the built-ins or a user-defined dynamic section.
/// Serialized as the plain string key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SectionKey {
    BuiltIn(BuiltInSection),
    Custom(String),
}

impl SectionKey {
    pub fn as_str(&self) -> &str {
        match self {
            SectionKey::BuiltIn(section) => section.key(),
            SectionKey::Custom(key) => key,
        }
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, SectionKey::BuiltIn(_))
    }

    pub fn parse(key: &str) -> Result<Self, SectionError> {
        if key.trim().is_empty() || key.chars().any(char::is_whitespace) {
            return Err(SectionError::InvalidKey(key.to_string()));
        }
        Ok(match BuiltInSection::from_key(key) {
            Some(section) => SectionKey::BuiltIn(section),
            None => SectionKey::Custom(key.to_string()),
        })
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BuiltInSection> for SectionKey {
    fn from(section: BuiltInSection) -> Self {
        SectionKey::BuiltIn(section)
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        key.as_str().to_string()
    }
}

impl TryFrom<String> for SectionKey {
    type Error = SectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SectionKey::parse(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Swaps `items[index]` with its neighbour in `direction`. Returns false (and leaves
/// the slice alone) at either boundary or for an out-of-range index.
pub fn swap_adjacent<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    if index >= items.len() {
        return false;
    }
    let neighbour = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|&i| i < items.len()),
    };
    match neighbour {
        Some(other) => {
            items.swap(index, other);
            true
        }
        None => false,
    }
}

/// Presentation settings, decoupled from content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub visibility: BTreeMap<SectionKey, bool>,
    pub titles: BTreeMap<SectionKey, String>,
    pub order: Vec<SectionKey>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        let visibility = BuiltInSection::ALL
            .into_iter()
            .map(|s| (SectionKey::from(s), true))
            .collect();
        let titles = BuiltInSection::ORDERABLE
            .into_iter()
            .map(|s| (SectionKey::from(s), s.default_title().to_string()))
            .collect();
        let order = BuiltInSection::ORDERABLE
            .into_iter()
            .map(SectionKey::from)
            .collect();
        Self {
            visibility,
            titles,
            order,
        }
    }
}

impl SectionConfig {
    /// Missing visibility entries count as visible.
    pub fn is_visible(&self, key: &SectionKey) -> bool {
        self.visibility.get(key).copied().unwrap_or(true)
    }

    pub fn title_of<'a>(&'a self, key: &'a SectionKey) -> &'a str {
        match self.titles.get(key) {
            Some(title) => title,
            None => match key {
                SectionKey::BuiltIn(section) => section.default_title(),
                SectionKey::Custom(key) => key,
            },
        }
    }

    pub fn position(&self, key: &SectionKey) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }
}

/// Replacement content for a whole section, as accepted by [`CvDocument::set_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    BasicInfo(BasicInfo),
    Summary(Summary),
    Experiences(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Skills(Vec<SkillEntry>),
    Projects(Vec<ProjectEntry>),
    Items(Vec<GenericItem>),
}

impl SectionContent {
    /// Decodes JSON into the content kind `key` expects.
    pub fn from_json(key: &SectionKey, value: serde_json::Value) -> Result<Self, SectionError> {
        fn decode<T: serde::de::DeserializeOwned>(
            key: &SectionKey,
            value: serde_json::Value,
            expected: &'static str,
        ) -> Result<T, SectionError> {
            serde_json::from_value(value).map_err(|_| SectionError::ContentMismatch {
                key: key.to_string(),
                expected,
            })
        }

        Ok(match key {
            SectionKey::BuiltIn(BuiltInSection::BasicInfo) => {
                SectionContent::BasicInfo(decode(key, value, "a basic info object")?)
            }
            SectionKey::BuiltIn(BuiltInSection::Summary) => {
                SectionContent::Summary(decode(key, value, "a summary object")?)
            }
            SectionKey::BuiltIn(BuiltInSection::Experiences) => {
                SectionContent::Experiences(decode(key, value, "a list of experiences")?)
            }
            SectionKey::BuiltIn(BuiltInSection::Education) => {
                SectionContent::Education(decode(key, value, "a list of education entries")?)
            }
            SectionKey::BuiltIn(BuiltInSection::Skills) => {
                SectionContent::Skills(decode(key, value, "a list of skills")?)
            }
            SectionKey::BuiltIn(BuiltInSection::Projects) => {
                SectionContent::Projects(decode(key, value, "a list of projects")?)
            }
            SectionKey::Custom(_) => {
                SectionContent::Items(decode(key, value, "a list of {title, details} items")?)
            }
        })
    }
}

/// Derives a dynamic section key from its title: words concatenated, lower-cased.
pub fn derive_section_key(title: &str) -> String {
    title.split_whitespace().collect::<String>().to_lowercase()
}

impl CvDocument {
    /// Whether `key` names a section this document declares.
    pub fn has_section(&self, key: &SectionKey) -> bool {
        match key {
            SectionKey::BuiltIn(_) => true,
            SectionKey::Custom(name) => self.custom_sections.contains_key(name),
        }
    }

    fn require_section(&self, key: &SectionKey) -> Result<(), SectionError> {
        let registered = self.section_config().visibility.contains_key(key);
        if self.has_section(key) && (key.is_built_in() || registered) {
            Ok(())
        } else {
            Err(SectionError::UnknownSection(key.to_string()))
        }
    }

    fn key_is_taken(&self, candidate: &str) -> bool {
        let config = self.section_config();
        BuiltInSection::ALL
            .iter()
            .map(|s| s.key())
            .chain(RESERVED_FIELDS.iter().copied())
            .any(|k| k.eq_ignore_ascii_case(candidate))
            || self
                .custom_sections
                .keys()
                .any(|k| k.eq_ignore_ascii_case(candidate))
            || config
                .visibility
                .keys()
                .chain(config.titles.keys())
                .any(|k| k.as_str().eq_ignore_ascii_case(candidate))
    }

    /// Replaces the content of a declared section.
    pub fn set_field(
        &mut self,
        key: &SectionKey,
        content: SectionContent,
    ) -> Result<(), SectionError> {
        if !self.has_section(key) {
            return Err(SectionError::UnknownSection(key.to_string()));
        }
        match (key, content) {
            (SectionKey::BuiltIn(BuiltInSection::BasicInfo), SectionContent::BasicInfo(v)) => {
                self.basic_info = v
            }
            (SectionKey::BuiltIn(BuiltInSection::Summary), SectionContent::Summary(v)) => {
                self.summary = v
            }
            (SectionKey::BuiltIn(BuiltInSection::Experiences), SectionContent::Experiences(v)) => {
                self.experiences = v
            }
            (SectionKey::BuiltIn(BuiltInSection::Education), SectionContent::Education(v)) => {
                self.education = v
            }
            (SectionKey::BuiltIn(BuiltInSection::Skills), SectionContent::Skills(v)) => {
                self.skills = v
            }
            (SectionKey::BuiltIn(BuiltInSection::Projects), SectionContent::Projects(v)) => {
                self.projects = v
            }
            (SectionKey::Custom(name), SectionContent::Items(v)) => {
                self.custom_sections.insert(name.clone(), v);
            }
            (key, _) => {
                return Err(SectionError::ContentMismatch {
                    key: key.to_string(),
                    expected: "content of the section's own kind",
                })
            }
        }
        self.clear_current_end_dates();
        Ok(())
    }

    /// Adds an empty dynamic section and registers it as visible, titled and last in order.
    pub fn add_section(&mut self, title: &str) -> Result<SectionKey, SectionError> {
        let title = title.trim();
        let derived = derive_section_key(title);
        if derived.is_empty() {
            return Err(SectionError::EmptyTitle);
        }
        if self.key_is_taken(&derived) {
            return Err(SectionError::DuplicateSection(derived));
        }

        let key = SectionKey::Custom(derived.clone());
        self.custom_sections.insert(derived, Vec::new());
        let config = self.section_config_mut();
        config.visibility.insert(key.clone(), true);
        config.titles.insert(key.clone(), title.to_string());
        config.order.push(key.clone());
        Ok(key)
    }

    /// Removes a dynamic section together with its visibility, title and order entries.
    pub fn remove_section(&mut self, key: &SectionKey) -> Result<(), SectionError> {
        let name = match key {
            SectionKey::BuiltIn(section) => {
                return Err(SectionError::BuiltInSection(section.key().to_string()))
            }
            SectionKey::Custom(name) => name,
        };
        let registered = self.section_config().visibility.contains_key(key);
        if !self.custom_sections.contains_key(name) && !registered {
            return Err(SectionError::UnknownSection(name.clone()));
        }

        self.custom_sections.remove(name);
        if let Some(config) = self.section_config.as_mut() {
            config.visibility.remove(key);
            config.titles.remove(key);
            config.order.retain(|k| k != key);
        }
        Ok(())
    }

    /// Moves `key` one slot in `order`. Returns whether anything moved.
    pub fn move_section(
        &mut self,
        key: &SectionKey,
        direction: Direction,
    ) -> Result<bool, SectionError> {
        let index = self
            .section_config()
            .position(key)
            .ok_or_else(|| SectionError::UnknownSection(key.to_string()))?;
        Ok(self.move_section_at(index, direction))
    }

    /// Moves the section at `index` in `order`. Out-of-range indexes and boundaries are
    /// no-ops.
    pub fn move_section_at(&mut self, index: usize, direction: Direction) -> bool {
        let mut order = self.section_config().order.clone();
        if !swap_adjacent(&mut order, index, direction) {
            return false;
        }
        self.section_config_mut().order = order;
        true
    }

    /// Flips visibility. Content and order are untouched. Returns the new value.
    pub fn toggle_visibility(&mut self, key: &SectionKey) -> Result<bool, SectionError> {
        self.require_section(key)?;
        let config = self.section_config_mut();
        let visible = !config.is_visible(key);
        config.visibility.insert(key.clone(), visible);
        Ok(visible)
    }

    /// Sets a section's heading. Basic info has none and is rejected.
    pub fn rename_title(&mut self, key: &SectionKey, title: &str) -> Result<(), SectionError> {
        if *key == SectionKey::BuiltIn(BuiltInSection::BasicInfo) {
            return Err(SectionError::Untitled(key.to_string()));
        }
        self.require_section(key)?;
        self.section_config_mut()
            .titles
            .insert(key.clone(), title.to_string());
        Ok(())
    }

    /// Checks the cross-field invariants between `sectionConfig` and the document.
    /// Documents without a config are valid; the default applies at read time.
    pub fn validate_sections(&self) -> Result<(), SectionError> {
        let Some(config) = &self.section_config else {
            return Ok(());
        };

        let mut seen = Vec::with_capacity(config.order.len());
        for key in &config.order {
            if seen.contains(&key) {
                return Err(SectionError::Inconsistent(format!(
                    "'{key}' appears more than once in order"
                )));
            }
            seen.push(key);
            if *key == SectionKey::BuiltIn(BuiltInSection::BasicInfo) {
                return Err(SectionError::Inconsistent(
                    "basicInfo cannot be part of order".to_string(),
                ));
            }
            if !config.visibility.contains_key(key) {
                return Err(SectionError::Inconsistent(format!(
                    "'{key}' is ordered but has no visibility entry"
                )));
            }
            if !self.has_section(key) {
                return Err(SectionError::Inconsistent(format!(
                    "'{key}' is ordered but the document has no such field"
                )));
            }
        }

        for section in BuiltInSection::ALL {
            let key = SectionKey::from(section);
            if !config.visibility.contains_key(&key) {
                return Err(SectionError::Inconsistent(format!(
                    "built-in section '{key}' is missing from visibility"
                )));
            }
            if section != BuiltInSection::BasicInfo && !config.titles.contains_key(&key) {
                return Err(SectionError::Inconsistent(format!(
                    "built-in section '{key}' is missing a title"
                )));
            }
        }
        Ok(())
    }
}
