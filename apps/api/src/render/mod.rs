//! Renderer: a pure projection of a document onto ordered, visible, non-empty blocks.
//!
//! The renderer never mutates the document. Legacy documents without a section config
//! are rendered with the default order, all visible.

pub mod html;
pub mod themes;

use serde::Serialize;
use tracing::warn;

use crate::cv::models::{
    BasicInfo, CvDocument, EducationEntry, ExperienceEntry, GenericItem, ProjectEntry, SkillEntry,
};
use crate::cv::sections::{BuiltInSection, SectionKey};
use crate::render::themes::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoLayout {
    Left,
    Right,
    Top,
    Center,
    /// No photo; name and contacts only.
    Standard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header<'a> {
    pub info: &'a BasicInfo,
    pub layout: PhotoLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody<'a> {
    Summary(&'a str),
    Experiences(&'a [ExperienceEntry]),
    Education(&'a [EducationEntry]),
    Skills(&'a [SkillEntry]),
    Projects(&'a [ProjectEntry]),
    /// Generic `{title, details}` layout used by dynamic sections.
    Items(&'a [GenericItem]),
}

impl BlockBody<'_> {
    fn is_empty(&self) -> bool {
        match self {
            BlockBody::Summary(content) => content.trim().is_empty(),
            BlockBody::Experiences(items) => items.is_empty(),
            BlockBody::Education(items) => items.is_empty(),
            BlockBody::Skills(items) => items.is_empty(),
            BlockBody::Projects(items) => items.is_empty(),
            BlockBody::Items(items) => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block<'a> {
    pub key: SectionKey,
    pub title: String,
    pub body: BlockBody<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCv<'a> {
    pub theme: Theme,
    pub header: Header<'a>,
    pub blocks: Vec<Block<'a>>,
}

/// Renders `doc` with the given theme.
pub fn render(doc: &CvDocument, theme: Theme) -> RenderedCv<'_> {
    let config = doc.section_config();

    let layout = match &doc.basic_info.photo {
        Some(photo) if !photo.is_empty() => theme.photo_layout(),
        _ => PhotoLayout::Standard,
    };

    let mut blocks = Vec::with_capacity(config.order.len());
    for key in &config.order {
        if !config.is_visible(key) {
            continue;
        }
        let body = match key {
            SectionKey::BuiltIn(BuiltInSection::BasicInfo) => continue,
            SectionKey::BuiltIn(BuiltInSection::Summary) => BlockBody::Summary(&doc.summary.content),
            SectionKey::BuiltIn(BuiltInSection::Experiences) => BlockBody::Experiences(&doc.experiences),
            SectionKey::BuiltIn(BuiltInSection::Education) => BlockBody::Education(&doc.education),
            SectionKey::BuiltIn(BuiltInSection::Skills) => BlockBody::Skills(&doc.skills),
            SectionKey::BuiltIn(BuiltInSection::Projects) => BlockBody::Projects(&doc.projects),
            SectionKey::Custom(name) => match doc.custom_sections.get(name) {
                Some(items) => BlockBody::Items(items),
                None => {
                    warn!(section = %name, "ordered section has no content, skipping");
                    continue;
                }
            },
        };
        if body.is_empty() {
            continue;
        }
        blocks.push(Block {
            key: key.clone(),
            title: config.title_of(key).to_string(),
            body,
        });
    }

    RenderedCv {
        theme,
        header: Header {
            info: &doc.basic_info,
            layout,
        },
        blocks,
    }
}

/// Renders with the document's own active theme.
pub fn render_document(doc: &CvDocument) -> RenderedCv<'_> {
    render(doc, doc.active_theme)
}
