use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cv::entries::{BulletEdit, EntryError};
use crate::cv::models::CvDocument;
use crate::cv::sections::{Direction, SectionContent, SectionError, SectionKey};
use crate::render::themes::Theme;

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("Basic info has no field '{0}'")]
    UnknownBasicInfoField(String),

    #[error("Command {index} failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<EditError>,
    },
}

/// One user edit. The wire form is tagged by `op`, e.g.
/// `{"op": "addSection", "title": "Certifications"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditCommand {
    SetField { key: SectionKey, value: Value },
    AddSection { title: String },
    RemoveSection { key: SectionKey },
    MoveSection { key: SectionKey, direction: Direction },
    MoveSectionAt { index: usize, direction: Direction },
    ToggleVisibility { key: SectionKey },
    RenameTitle { key: SectionKey, title: String },
    AddEntry { section: SectionKey },
    RemoveEntry { section: SectionKey, id: String },
    MoveEntry { section: SectionKey, id: String, direction: Direction },
    UpdateEntry { section: SectionKey, id: String, field: String, value: Value },
    SetCurrent { section: SectionKey, id: String, current: bool },
    AddBullet { section: SectionKey, id: String },
    UpdateBullet { section: SectionKey, id: String, index: usize, text: String },
    RemoveBullet { section: SectionKey, id: String, index: usize },
    UpdateBasicInfo { field: String, value: String },
    SetSummary { content: String },
    SetTheme { theme: Theme },
}

/// What a successful command did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_key: Option<SectionKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

/// Owns the document being edited and applies commands to it one at a time.
#[derive(Debug, Clone)]
pub struct EditorController {
    document: CvDocument,
    revision: u64,
}

impl EditorController {
    pub fn new(document: CvDocument) -> Self {
        Self {
            document,
            revision: 0,
        }
    }

    pub fn document(&self) -> &CvDocument {
        &self.document
    }

    pub fn into_document(self) -> CvDocument {
        self.document
    }

    /// Bumped on every command that changed the document.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swaps in a whole new document (e.g. after an import).
    pub fn replace(&mut self, document: CvDocument) {
        self.document = document;
        self.revision += 1;
    }

    /// Applies one command. On error the document is unchanged.
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, EditError> {
        self.apply_all(std::iter::once(command))
            .map_err(|e| match e {
                EditError::Batch { source, .. } => *source,
                other => other,
            })
    }

    /// Applies commands in order against a draft; the draft replaces the document only if
    /// every command succeeded.
    pub fn apply_all(
        &mut self,
        commands: impl IntoIterator<Item = EditCommand>,
    ) -> Result<EditOutcome, EditError> {
        let mut draft = self.document.clone();
        let mut outcome = EditOutcome::default();

        for (index, command) in commands.into_iter().enumerate() {
            debug!(?command, "applying edit");
            let step = apply_to(&mut draft, command).map_err(|e| EditError::Batch {
                index,
                source: Box::new(e),
            })?;
            outcome.created_key = step.created_key.or(outcome.created_key);
            outcome.created_id = step.created_id.or(outcome.created_id);
        }

        outcome.changed = draft != self.document;
        if outcome.changed {
            self.document = draft;
            self.revision += 1;
        }
        Ok(outcome)
    }
}

fn apply_to(doc: &mut CvDocument, command: EditCommand) -> Result<EditOutcome, EditError> {
    let mut outcome = EditOutcome::default();
    match command {
        EditCommand::SetField { key, value } => {
            let content = SectionContent::from_json(&key, value)?;
            doc.set_field(&key, content)?;
        }
        EditCommand::AddSection { title } => {
            outcome.created_key = Some(doc.add_section(&title)?);
        }
        EditCommand::RemoveSection { key } => doc.remove_section(&key)?,
        EditCommand::MoveSection { key, direction } => {
            doc.move_section(&key, direction)?;
        }
        EditCommand::MoveSectionAt { index, direction } => {
            doc.move_section_at(index, direction);
        }
        EditCommand::ToggleVisibility { key } => {
            doc.toggle_visibility(&key)?;
        }
        EditCommand::RenameTitle { key, title } => doc.rename_title(&key, &title)?,
        EditCommand::AddEntry { section } => {
            outcome.created_id = Some(doc.append_entry(&section)?);
        }
        EditCommand::RemoveEntry { section, id } => doc.remove_entry(&section, &id)?,
        EditCommand::MoveEntry {
            section,
            id,
            direction,
        } => {
            doc.move_entry(&section, &id, direction)?;
        }
        EditCommand::UpdateEntry {
            section,
            id,
            field,
            value,
        } => doc.update_entry(&section, &id, &field, value)?,
        EditCommand::SetCurrent {
            section,
            id,
            current,
        } => doc.set_current(&section, &id, current)?,
        EditCommand::AddBullet { section, id } => {
            doc.edit_bullets(&section, &id, BulletEdit::Add)?
        }
        EditCommand::UpdateBullet {
            section,
            id,
            index,
            text,
        } => doc.edit_bullets(&section, &id, BulletEdit::Update { index, text })?,
        EditCommand::RemoveBullet { section, id, index } => {
            doc.edit_bullets(&section, &id, BulletEdit::Remove { index })?
        }
        EditCommand::UpdateBasicInfo { field, value } => set_basic_info(doc, &field, value)?,
        EditCommand::SetSummary { content } => doc.summary.content = content,
        EditCommand::SetTheme { theme } => doc.active_theme = theme,
    }
    Ok(outcome)
}

fn set_basic_info(doc: &mut CvDocument, field: &str, value: String) -> Result<(), EditError> {
    let info = &mut doc.basic_info;
    let optional = (!value.trim().is_empty()).then(|| value.clone());
    match field {
        "name" => info.name = value,
        "role" => info.role = value,
        "location" => info.location = value,
        "email" => info.email = value,
        "website" => info.website = optional,
        "phone" => info.phone = optional,
        "github" => info.github = optional,
        "linkedin" => info.linkedin = optional,
        "photo" => info.photo = optional,
        other => return Err(EditError::UnknownBasicInfoField(other.to_string())),
    }
    Ok(())
}
