//! Editor session state
//!
//! The whole editor lives in one [`EditorState`] record. Every user action is
//! an [`Action`] and [`EditorState::apply`] is the only way to move from one
//! state to the next. Nothing here is persisted; the collection lasts as long
//! as the session.

use crate::filters::{FilterParam, FilterSettings};
use crate::models::{AnalysisResult, EncodedImage, SubjectType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Editor,
    Collection,
}

/// Remote operation currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analysis,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: Uuid,
    pub name: String,
    pub image: EncodedImage,
    pub settings: FilterSettings,
    pub created_at: DateTime<Utc>,
}

impl CollectionItem {
    pub fn new(name: impl Into<String>, image: EncodedImage, settings: FilterSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image,
            settings,
            created_at: Utc::now(),
        }
    }
}

/// One image ready to be written out by a batch export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub css_filter: String,
    #[serde(skip)]
    pub data: String,
}

#[derive(Debug, Clone)]
pub enum Action {
    SwitchView(View),
    LoadImage(EncodedImage),
    SetReference(Option<EncodedImage>),
    SetSubject(SubjectType),
    SetInstruction(String),
    AdjustFilter(FilterParam, f64),
    ResetFilters,
    BeginRequest(Operation),
    AnalysisCompleted(AnalysisResult),
    EditCompleted(EncodedImage),
    RequestFailed(String),
    /// The in-flight request was abandoned before it produced a result.
    CancelRequest,
    RevertToOriginal,
    AddToCollection(CollectionItem),
    RemoveFromCollection(Uuid),
    UpdateCollectionSettings(Uuid, FilterSettings),
    OpenFromCollection(Uuid),
    ImportBatch(Vec<CollectionItem>),
    ClearCollection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub view: View,
    /// Image as uploaded, before any generative edit.
    pub original: Option<EncodedImage>,
    /// Image currently shown; replaced by generative edits.
    pub current: Option<EncodedImage>,
    pub reference: Option<EncodedImage>,
    pub subject: SubjectType,
    pub instruction: String,
    pub settings: FilterSettings,
    pub reasoning: Option<String>,
    pub pending: Option<Operation>,
    pub error: Option<String>,
    pub collection: Vec<CollectionItem>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn css_filter(&self) -> String {
        self.settings.css()
    }

    pub fn collection_item(&self, id: Uuid) -> Option<&CollectionItem> {
        self.collection.iter().find(|item| item.id == id)
    }

    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::SwitchView(view) => self.view = view,
            Action::LoadImage(image) => {
                self.original = Some(image.clone());
                self.current = Some(image);
                self.settings = FilterSettings::default();
                self.reasoning = None;
                self.error = None;
                self.view = View::Editor;
            }
            Action::SetReference(reference) => self.reference = reference,
            Action::SetSubject(subject) => self.subject = subject,
            Action::SetInstruction(instruction) => self.instruction = instruction,
            Action::AdjustFilter(param, value) => self.settings.set(param, value),
            Action::ResetFilters => self.settings = FilterSettings::default(),
            Action::BeginRequest(operation) => {
                if self.pending.is_none() && self.current.is_some() {
                    self.pending = Some(operation);
                    self.error = None;
                }
            }
            Action::AnalysisCompleted(result) => {
                self.pending = None;
                self.settings = result.suggested_settings.clamped();
                self.reasoning = Some(result.reasoning);
            }
            Action::EditCompleted(image) => {
                self.pending = None;
                self.current = Some(image);
                self.settings = FilterSettings::default();
                self.reasoning = None;
            }
            Action::RequestFailed(message) => {
                self.pending = None;
                self.error = Some(message);
            }
            Action::CancelRequest => self.pending = None,
            Action::RevertToOriginal => {
                if self.original.is_some() {
                    self.current = self.original.clone();
                    self.settings = FilterSettings::default();
                    self.reasoning = None;
                }
            }
            Action::AddToCollection(item) => self.push_unique(item),
            Action::RemoveFromCollection(id) => self.collection.retain(|item| item.id != id),
            Action::UpdateCollectionSettings(id, settings) => {
                if let Some(item) = self.collection.iter_mut().find(|item| item.id == id) {
                    item.settings = settings.clamped();
                }
            }
            Action::OpenFromCollection(id) => {
                if let Some(item) = self.collection_item(id).cloned() {
                    self.original = Some(item.image.clone());
                    self.current = Some(item.image);
                    self.settings = item.settings;
                    self.reasoning = None;
                    self.error = None;
                    self.view = View::Editor;
                }
            }
            Action::ImportBatch(items) => {
                for item in items {
                    self.push_unique(item);
                }
            }
            Action::ClearCollection => self.collection.clear(),
        }
        self
    }

    fn push_unique(&mut self, item: CollectionItem) {
        if self.collection_item(item.id).is_none() {
            self.collection.push(item);
        }
    }

    /// Collection entries with unique, filesystem-safe file names.
    pub fn export_batch(&self) -> Vec<ExportEntry> {
        let mut used = HashSet::new();

        self.collection
            .iter()
            .map(|item| {
                let stem = sanitize_file_stem(&item.name);
                let extension = item.image.extension();
                let mut file_name = format!("{}.{}", stem, extension);
                let mut suffix = 2;
                while !used.insert(file_name.clone()) {
                    file_name = format!("{}-{}.{}", stem, suffix, extension);
                    suffix += 1;
                }

                ExportEntry {
                    id: item.id,
                    file_name,
                    mime_type: item.image.mime_type.clone(),
                    css_filter: item.settings.css(),
                    data: item.image.data.clone(),
                }
            })
            .collect()
    }
}

fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let stem = stem.trim_matches('-');

    if stem.is_empty() {
        "photo".to_string()
    } else {
        stem.to_string()
    }
}
