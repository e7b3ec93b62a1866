//! Application facade wiring the AI clients to the editor session.

use crate::ai::{GeminiAnalysisClient, GeminiEditClient, ImageEditService, PhotoAnalysisService};
use crate::ai::{ContentGenerator, GeminiHttpClient};
use crate::models::{AnalysisRequest, AnalysisResult, Config, EncodedImage};
use crate::session::{Action, CollectionItem, EditorState, ExportEntry, Operation};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub analysis: Box<dyn PhotoAnalysisService>,
    pub editing: Box<dyn ImageEditService>,
}

/// Owns the editor state and runs remote operations against it.
pub struct App {
    analysis: Box<dyn PhotoAnalysisService>,
    editing: Box<dyn ImageEditService>,
    state: EditorState,
}

/// Clears `pending` if a request future is dropped before it finishes.
struct PendingGuard<'a> {
    state: &'a mut EditorState,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a mut EditorState) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.state.is_busy() {
            warn!("Request abandoned before completion");
            let state = std::mem::take(self.state);
            *self.state = state.apply(Action::CancelRequest);
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportManifest<'a> {
    images: &'a [ExportEntry],
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            analysis: services.analysis,
            editing: services.editing,
            state: EditorState::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across both clients.
        let http_client = reqwest::Client::new();

        let http = |timeout_secs: u64| -> Box<dyn ContentGenerator> {
            Box::new(
                GeminiHttpClient::new_with_client(
                    config.gemini_api_key.clone(),
                    Duration::from_secs(timeout_secs),
                    http_client.clone(),
                )
                .with_base_url(config.gemini_base_url.clone()),
            )
        };

        info!("Analysis models: {}", config.analysis_models.join(", "));
        info!("Edit models: {}", config.edit_models.join(", "));

        Self::with_services(AppServices {
            analysis: Box::new(GeminiAnalysisClient::with_generator(
                http(60),
                config.analysis_models.clone(),
            )),
            editing: Box::new(GeminiEditClient::with_generator(
                http(120),
                config.edit_models.clone(),
            )),
        })
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Apply a user action that needs no remote call.
    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(action);
    }

    pub async fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = EncodedImage::from_path(path).await?;
        info!("Loaded {} ({})", path.display(), image.mime_type);
        self.dispatch(Action::LoadImage(image));
        Ok(())
    }

    pub async fn load_reference(&mut self, path: &Path) -> Result<()> {
        let image = EncodedImage::from_path(path).await?;
        self.dispatch(Action::SetReference(Some(image)));
        Ok(())
    }

    fn begin(&mut self, operation: Operation) -> Result<EncodedImage> {
        if let Some(pending) = self.state.pending {
            return Err(Error::InvalidInput(format!(
                "{:?} request already in progress",
                pending
            )));
        }
        let image = self
            .state
            .current
            .clone()
            .ok_or_else(|| Error::InvalidInput("No image loaded".to_string()))?;

        self.dispatch(Action::BeginRequest(operation));
        Ok(image)
    }

    fn fail(&mut self, err: Error) -> Error {
        error!("Request failed: {}", err);
        self.dispatch(Action::RequestFailed(err.user_message()));
        err
    }

    /// Ask the analysis models for filter settings and apply them.
    pub async fn suggest_filters(&mut self) -> Result<AnalysisResult> {
        let image = self.begin(Operation::Analysis)?;
        let request = AnalysisRequest {
            image,
            reference: self.state.reference.clone(),
            subject: self.state.subject,
            instruction: self.state.instruction.clone(),
        };

        let guard = PendingGuard::new(&mut self.state);
        let outcome = self.analysis.analyze(&request).await;
        guard.disarm();

        match outcome {
            Ok(result) => {
                info!("Analysis: {}", result.reasoning);
                self.dispatch(Action::AnalysisCompleted(result.clone()));
                Ok(result)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace the current image with a generated edit.
    pub async fn generate_edit(&mut self, instruction: Option<&str>) -> Result<EncodedImage> {
        let image = self.begin(Operation::Edit)?;

        let guard = PendingGuard::new(&mut self.state);
        let outcome = self.editing.edit_image(&image, instruction).await;
        guard.disarm();

        match outcome {
            Ok(edited) => {
                info!("Received edited image ({})", edited.mime_type);
                self.dispatch(Action::EditCompleted(edited.clone()));
                Ok(edited)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run filter analysis on every collection item and store the result on
    /// the item. Failed items keep their settings and are skipped; the call
    /// only fails when no item could be analyzed.
    pub async fn analyze_collection(&mut self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = self.state.collection.iter().map(|item| item.id).collect();
        let mut analyzed = Vec::with_capacity(ids.len());
        let mut last_error = None;

        for id in ids {
            self.dispatch(Action::OpenFromCollection(id));
            match self.suggest_filters().await {
                Ok(_) => {
                    let settings = self.state.settings;
                    self.dispatch(Action::UpdateCollectionSettings(id, settings));
                    analyzed.push(id);
                }
                Err(e) => {
                    warn!("Skipping analysis for {}: {}", id, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if analyzed.is_empty() => Err(e),
            _ => {
                info!(
                    "Analyzed {} of {} collection items",
                    analyzed.len(),
                    self.state.collection.len()
                );
                Ok(analyzed)
            }
        }
    }

    /// Save the current image and sliders into the collection.
    pub fn save_current(&mut self, name: &str) -> Result<CollectionItem> {
        let image = self
            .state
            .current
            .clone()
            .ok_or_else(|| Error::InvalidInput("No image loaded".to_string()))?;

        let item = CollectionItem::new(name, image, self.state.settings);
        self.dispatch(Action::AddToCollection(item.clone()));
        Ok(item)
    }

    /// Import image files into the collection. Unreadable files are skipped.
    pub async fn import_batch(&mut self, paths: &[PathBuf]) -> Result<Vec<CollectionItem>> {
        let mut items = Vec::with_capacity(paths.len());

        for path in paths {
            match EncodedImage::from_path(path).await {
                Ok(image) => {
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    items.push(CollectionItem::new(name, image, Default::default()));
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if items.is_empty() && !paths.is_empty() {
            return Err(Error::InvalidInput(
                "None of the selected files could be imported".to_string(),
            ));
        }

        info!("Imported {} of {} files", items.len(), paths.len());
        self.dispatch(Action::ImportBatch(items.clone()));
        Ok(items)
    }

    /// Write every collection image plus a `manifest.json` into `dir`.
    pub async fn export_batch(&self, dir: &Path) -> Result<Vec<ExportEntry>> {
        let entries = self.state.export_batch();
        tokio::fs::create_dir_all(dir).await?;

        for entry in &entries {
            let image = EncodedImage {
                mime_type: entry.mime_type.clone(),
                data: entry.data.clone(),
            };
            tokio::fs::write(dir.join(&entry.file_name), image.decode()?).await?;
        }

        let manifest = serde_json::to_string_pretty(&ExportManifest { images: &entries })?;
        tokio::fs::write(dir.join("manifest.json"), manifest).await?;

        info!("Exported {} images to {}", entries.len(), dir.display());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockAnalysisClient, MockEditClient};
    use crate::filters::FilterSettings;
    use crate::models::SubjectType;
    use async_trait::async_trait;

    /// Analysis service whose calls never complete.
    struct StalledAnalysis;

    #[async_trait]
    impl PhotoAnalysisService for StalledAnalysis {
        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult> {
            std::future::pending().await
        }
    }

    /// Analysis service that rejects one specific image.
    struct RejectingAnalysis {
        rejected: EncodedImage,
    }

    #[async_trait]
    impl PhotoAnalysisService for RejectingAnalysis {
        async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
            if request.image == self.rejected {
                return Err(Error::AiProvider("400 bad request".to_string()));
            }
            Ok(AnalysisResult {
                reasoning: "warmer".to_string(),
                suggested_settings: FilterSettings {
                    sepia: 25.0,
                    ..Default::default()
                },
            })
        }
    }

    fn png() -> EncodedImage {
        EncodedImage::from_bytes(&[0x89, 0x50, 0x4E, 0x47])
    }

    fn jpeg() -> EncodedImage {
        EncodedImage::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn app(analysis: MockAnalysisClient, editing: MockEditClient) -> App {
        App::with_services(AppServices {
            analysis: Box::new(analysis),
            editing: Box::new(editing),
        })
    }

    #[tokio::test]
    async fn test_suggest_filters_requires_image() {
        let mut app = app(MockAnalysisClient::new(), MockEditClient::new());
        let err = app.suggest_filters().await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_suggest_filters_applies_result() {
        let analysis = MockAnalysisClient::new().with_result(AnalysisResult {
            reasoning: "warm it up".to_string(),
            suggested_settings: FilterSettings {
                sepia: 20.0,
                ..Default::default()
            },
        });
        let mut app = app(analysis.clone(), MockEditClient::new());

        app.dispatch(Action::LoadImage(jpeg()));
        app.dispatch(Action::SetSubject(SubjectType::Urban));
        app.dispatch(Action::SetInstruction("golden hour".to_string()));
        app.suggest_filters().await.unwrap();

        assert_eq!(app.state().settings.sepia, 20.0);
        assert!(!app.state().is_busy());

        let sent = &analysis.requests()[0];
        assert_eq!(sent.subject, SubjectType::Urban);
        assert_eq!(sent.instruction, "golden hour");
        assert_eq!(sent.image, jpeg());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_as_user_message() {
        let editing = MockEditClient::new().with_failure("Gemini API error (status 403 Forbidden): no");
        let mut app = app(MockAnalysisClient::new(), editing);

        app.dispatch(Action::LoadImage(jpeg()));
        let err = app.generate_edit(Some("add fog")).await.unwrap_err();

        assert!(err.is_access_denied());
        assert!(!app.state().is_busy());
        assert!(app.state().error.as_deref().unwrap().starts_with("Access denied"));
        assert_eq!(app.state().current, Some(jpeg()));
    }

    #[tokio::test]
    async fn test_save_current_adds_to_collection() {
        let mut app = app(MockAnalysisClient::new(), MockEditClient::new());
        assert!(app.save_current("nothing").is_err());

        app.dispatch(Action::LoadImage(jpeg()));
        let item = app.save_current("first").unwrap();

        assert_eq!(app.state().collection.len(), 1);
        assert_eq!(app.state().collection[0].id, item.id);
    }

    #[tokio::test]
    async fn test_dropped_request_does_not_leave_session_busy() {
        let mut app = App::with_services(AppServices {
            analysis: Box::new(StalledAnalysis),
            editing: Box::new(MockEditClient::new()),
        });
        app.dispatch(Action::LoadImage(jpeg()));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), app.suggest_filters()).await;
        assert!(timed_out.is_err());
        assert!(!app.state().is_busy());
        assert_eq!(app.state().error, None);

        let edited = app.generate_edit(None).await.unwrap();
        assert_eq!(edited, jpeg());
    }

    #[tokio::test]
    async fn test_analyze_collection_skips_failed_items() {
        let mut app = App::with_services(AppServices {
            analysis: Box::new(RejectingAnalysis { rejected: png() }),
            editing: Box::new(MockEditClient::new()),
        });
        let good = CollectionItem::new("good", jpeg(), FilterSettings::default());
        let bad = CollectionItem::new("bad", png(), FilterSettings::default());
        let (good_id, bad_id) = (good.id, bad.id);
        app.dispatch(Action::ImportBatch(vec![good, bad]));

        let analyzed = app.analyze_collection().await.unwrap();

        assert_eq!(analyzed, vec![good_id]);
        let collection = &app.state().collection;
        assert_eq!(collection.len(), 2);
        assert_eq!(collection[0].id, good_id);
        assert_eq!(collection[0].settings.sepia, 25.0);
        assert_eq!(collection[1].id, bad_id);
        assert!(collection[1].settings.is_identity());
        assert!(!app.state().is_busy());
    }

    #[tokio::test]
    async fn test_analyze_collection_fails_when_every_item_fails() {
        let mut app = app(
            MockAnalysisClient::new().with_failure("Gemini API error (status 403 Forbidden): no"),
            MockEditClient::new(),
        );
        app.dispatch(Action::ImportBatch(vec![CollectionItem::new(
            "only",
            jpeg(),
            FilterSettings::default(),
        )]));

        let err = app.analyze_collection().await.unwrap_err();
        assert!(err.is_access_denied());
    }

    #[tokio::test]
    async fn test_analyze_empty_collection_is_a_no_op() {
        let mut app = app(MockAnalysisClient::new(), MockEditClient::new());
        assert!(app.analyze_collection().await.unwrap().is_empty());
    }
}
