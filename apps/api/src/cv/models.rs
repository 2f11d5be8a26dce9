use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cv::rich_text::RichText;
use crate::cv::sections::SectionConfig;
use crate::render::themes::Theme;

/// Generates a fresh opaque entry id.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub name: String,
    pub role: String,
    pub location: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    /// Data URL of the uploaded photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub id: String,
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub achievements: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub id: String,
    pub degree: String,
    pub institute: String,
    #[serde(default)]
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub current: bool,
}

/// A `{title, details}` item. Backs the skills section and every dynamic section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericItem {
    pub id: String,
    pub title: String,
    pub details: String,
}

pub type SkillEntry = GenericItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// The whole CV. Dynamic sections live next to the built-in fields in the JSON form,
/// so they are flattened into the top-level object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvDocument {
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub experiences: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub active_theme: Theme,
    /// Absent on legacy documents; see [`CvDocument::section_config`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_config: Option<SectionConfig>,
    #[serde(flatten)]
    pub custom_sections: BTreeMap<String, Vec<GenericItem>>,
}

impl CvDocument {
    /// Section configuration as the renderer and editor should see it. Legacy documents
    /// without one get the default order; the fallback is never written back here.
    pub fn section_config(&self) -> Cow<'_, SectionConfig> {
        match &self.section_config {
            Some(config) => Cow::Borrowed(config),
            None => Cow::Owned(SectionConfig::default()),
        }
    }

    /// Mutable access for editing operations. Materializes the default config the first
    /// time a legacy document is edited.
    pub fn section_config_mut(&mut self) -> &mut SectionConfig {
        self.section_config.get_or_insert_with(SectionConfig::default)
    }

    /// An empty document with the default section configuration.
    pub fn blank() -> Self {
        Self {
            basic_info: BasicInfo::default(),
            summary: Summary::default(),
            experiences: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            projects: Vec::new(),
            active_theme: Theme::default(),
            section_config: Some(SectionConfig::default()),
            custom_sections: BTreeMap::new(),
        }
    }
}
