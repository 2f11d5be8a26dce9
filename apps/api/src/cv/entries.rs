//! List-entry operations shared by every list-valued section.
//!
//! Experiences, education, skills, projects and dynamic sections all support the same
//! four operations (append, remove, move, update). They are written once against the
//! [`ListEntry`] trait and dispatched on the section key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::cv::models::{
    new_entry_id, CvDocument, EducationEntry, ExperienceEntry, GenericItem, ProjectEntry,
};
use crate::cv::rich_text::RichText;
use crate::cv::sections::{swap_adjacent, BuiltInSection, Direction, SectionKey};

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Section '{0}' does not hold a list of entries")]
    NotAList(String),

    #[error("No entry with id '{id}' in '{section}'")]
    NotFound { section: String, id: String },

    #[error("{kind} entries have no field '{field}'")]
    UnknownField { kind: &'static str, field: String },

    #[error("Field 'id' cannot be changed")]
    ImmutableId,

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Entries in '{0}' have no bullet list")]
    NoBullets(String),

    #[error("Bullet index {index} is out of range ({len} bullets)")]
    BulletOutOfRange { index: usize, len: usize },
}

/// An item of a list-valued section.
pub trait ListEntry: Clone + Serialize + DeserializeOwned {
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// A new entry with empty fields.
    fn blank(id: String) -> Self;

    /// Sets one field, addressed by its JSON name.
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), EntryError> {
        *self = patch_field(self, Self::KIND, field, value)?;
        Ok(())
    }
}

/// Rewrites one field through the entry's JSON form so every field gets the same
/// type checking as a full document load.
fn patch_field<T: ListEntry>(
    entry: &T,
    kind: &'static str,
    field: &str,
    value: Value,
) -> Result<T, EntryError> {
    if field == "id" {
        return Err(EntryError::ImmutableId);
    }
    let mut object = match serde_json::to_value(entry) {
        Ok(Value::Object(object)) => object,
        _ => {
            return Err(EntryError::InvalidValue {
                field: field.to_string(),
                reason: "entry is not an object".to_string(),
            })
        }
    };
    match object.get_mut(field) {
        Some(slot) => *slot = value,
        None => {
            return Err(EntryError::UnknownField {
                kind,
                field: field.to_string(),
            })
        }
    }
    serde_json::from_value(Value::Object(object)).map_err(|e| EntryError::InvalidValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

impl ListEntry for ExperienceEntry {
    const KIND: &'static str = "Experience";

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            role: String::new(),
            company: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
            achievements: Vec::new(),
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), EntryError> {
        *self = patch_field(self, Self::KIND, field, value)?;
        if self.current {
            self.end_date.clear();
        }
        Ok(())
    }
}

impl ListEntry for EducationEntry {
    const KIND: &'static str = "Education";

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            degree: String::new(),
            institute: String::new(),
            location: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), EntryError> {
        *self = patch_field(self, Self::KIND, field, value)?;
        if self.current {
            self.end_date.clear();
        }
        Ok(())
    }
}

impl ListEntry for GenericItem {
    const KIND: &'static str = "Item";

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            title: String::new(),
            details: String::new(),
        }
    }
}

impl ListEntry for ProjectEntry {
    const KIND: &'static str = "Project";

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            company: String::new(),
            details: Vec::new(),
        }
    }
}

fn index_of<T: ListEntry>(list: &[T], section: &SectionKey, id: &str) -> Result<usize, EntryError> {
    list.iter()
        .position(|e| e.id() == id)
        .ok_or_else(|| EntryError::NotFound {
            section: section.to_string(),
            id: id.to_string(),
        })
}

pub fn append<T: ListEntry>(list: &mut Vec<T>) -> String {
    let id = new_entry_id();
    list.push(T::blank(id.clone()));
    id
}

pub fn remove<T: ListEntry>(list: &mut Vec<T>, section: &SectionKey, id: &str) -> Result<(), EntryError> {
    let index = index_of(list, section, id)?;
    list.remove(index);
    Ok(())
}

/// Swaps the entry with its neighbour. Returns false at either boundary.
pub fn move_by_id<T: ListEntry>(
    list: &mut [T],
    section: &SectionKey,
    id: &str,
    direction: Direction,
) -> Result<bool, EntryError> {
    let index = index_of(list, section, id)?;
    Ok(swap_adjacent(list, index, direction))
}

pub fn update<T: ListEntry>(
    list: &mut [T],
    section: &SectionKey,
    id: &str,
    field: &str,
    value: Value,
) -> Result<(), EntryError> {
    let index = index_of(list, section, id)?;
    list[index].set_field(field, value)
}

/// Entries carrying an ordered list of bullet points.
pub trait Bulleted {
    fn bullet_count(&self) -> usize;
    fn push_bullet(&mut self);
    fn set_bullet(&mut self, index: usize, text: &str);
    fn remove_bullet(&mut self, index: usize);
}

impl Bulleted for ExperienceEntry {
    fn bullet_count(&self) -> usize {
        self.achievements.len()
    }

    fn push_bullet(&mut self) {
        self.achievements.push(RichText::default());
    }

    fn set_bullet(&mut self, index: usize, text: &str) {
        self.achievements[index] = RichText::parse(text);
    }

    fn remove_bullet(&mut self, index: usize) {
        self.achievements.remove(index);
    }
}

impl Bulleted for ProjectEntry {
    fn bullet_count(&self) -> usize {
        self.details.len()
    }

    fn push_bullet(&mut self) {
        self.details.push(String::new());
    }

    fn set_bullet(&mut self, index: usize, text: &str) {
        self.details[index] = text.to_string();
    }

    fn remove_bullet(&mut self, index: usize) {
        self.details.remove(index);
    }
}

/// A bullet edit addressed by position.
#[derive(Debug, Clone, PartialEq)]
pub enum BulletEdit {
    Add,
    Update { index: usize, text: String },
    Remove { index: usize },
}

fn edit_bullets<T: ListEntry + Bulleted>(
    list: &mut [T],
    section: &SectionKey,
    id: &str,
    edit: BulletEdit,
) -> Result<(), EntryError> {
    let position = index_of(list, section, id)?;
    let entry = &mut list[position];
    let len = entry.bullet_count();
    match edit {
        BulletEdit::Add => entry.push_bullet(),
        BulletEdit::Update { index, text } => {
            if index >= len {
                return Err(EntryError::BulletOutOfRange { index, len });
            }
            entry.set_bullet(index, &text);
        }
        BulletEdit::Remove { index } => {
            if index >= len {
                return Err(EntryError::BulletOutOfRange { index, len });
            }
            entry.remove_bullet(index);
        }
    }
    Ok(())
}

/// Runs `$body` with `$list` bound to the entry list behind `$key`.
macro_rules! with_list {
    ($doc:expr, $key:expr, $list:ident => $body:expr) => {
        match $key {
            SectionKey::BuiltIn(BuiltInSection::Experiences) => {
                let $list = &mut $doc.experiences;
                $body
            }
            SectionKey::BuiltIn(BuiltInSection::Education) => {
                let $list = &mut $doc.education;
                $body
            }
            SectionKey::BuiltIn(BuiltInSection::Skills) => {
                let $list = &mut $doc.skills;
                $body
            }
            SectionKey::BuiltIn(BuiltInSection::Projects) => {
                let $list = &mut $doc.projects;
                $body
            }
            SectionKey::Custom(name) => match $doc.custom_sections.get_mut(name) {
                Some($list) => $body,
                None => Err(EntryError::UnknownSection(name.clone())),
            },
            other => Err(EntryError::NotAList(other.to_string())),
        }
    };
}

impl CvDocument {
    /// Empties `endDate` on every ongoing experience and education entry.
    pub fn clear_current_end_dates(&mut self) {
        for entry in self.experiences.iter_mut().filter(|e| e.current) {
            entry.end_date.clear();
        }
        for entry in self.education.iter_mut().filter(|e| e.current) {
            entry.end_date.clear();
        }
    }

    /// Appends a blank entry and returns its fresh id.
    pub fn append_entry(&mut self, key: &SectionKey) -> Result<String, EntryError> {
        with_list!(self, key, list => Ok(append(list)))
    }

    pub fn remove_entry(&mut self, key: &SectionKey, id: &str) -> Result<(), EntryError> {
        with_list!(self, key, list => remove(list, key, id))
    }

    pub fn move_entry(
        &mut self,
        key: &SectionKey,
        id: &str,
        direction: Direction,
    ) -> Result<bool, EntryError> {
        with_list!(self, key, list => move_by_id(list, key, id, direction))
    }

    pub fn update_entry(
        &mut self,
        key: &SectionKey,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), EntryError> {
        with_list!(self, key, list => update(list, key, id, field, value))
    }

    /// Marks an experience or education entry as ongoing. `true` also clears the end
    /// date; `false` does not bring it back.
    pub fn set_current(&mut self, key: &SectionKey, id: &str, current: bool) -> Result<(), EntryError> {
        match key {
            SectionKey::BuiltIn(BuiltInSection::Experiences | BuiltInSection::Education) => {
                self.update_entry(key, id, "current", Value::Bool(current))
            }
            other => Err(EntryError::UnknownField {
                kind: "Section",
                field: format!("{other}.current"),
            }),
        }
    }

    pub fn edit_bullets(
        &mut self,
        key: &SectionKey,
        id: &str,
        edit: BulletEdit,
    ) -> Result<(), EntryError> {
        match key {
            SectionKey::BuiltIn(BuiltInSection::Experiences) => {
                edit_bullets(&mut self.experiences, key, id, edit)
            }
            SectionKey::BuiltIn(BuiltInSection::Projects) => {
                edit_bullets(&mut self.projects, key, id, edit)
            }
            other => Err(EntryError::NoBullets(other.to_string())),
        }
    }
}
