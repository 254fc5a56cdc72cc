//! Detail view — create, edit, or read-only view of one record.
//!
//! DESIGN
//! ======
//! One state machine serves all three modes:
//! `Loading -> Ready -> Submitting -> (navigate to list | Ready + toast)`.
//! Field edits only touch the in-memory draft. Nothing reaches the backend
//! until `submit`, and `submit` refuses to run while another is in flight.
//!
//! Image fields upload first and store the returned storage path in the
//! row. If the row write then fails, the uploads are removed again so a
//! failed save leaves no stray objects behind.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures never touch the network. Backend failures return the
//! view to `Ready` with the draft intact so the user can retry.

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, Blob, Query};
use crate::record::{Draft, Record, RecordId};
use crate::resource::{FieldKind, Resource};
use crate::routes::AdminRoute;
use crate::state::AppState;
use crate::validate::{FieldError, ValidationErrors, parse_input, validate_draft};

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("view is read-only")]
    ReadOnly,
    #[error("{0} cannot be changed from the admin console")]
    NotWritable(&'static str),
    #[error("a submit is already in flight")]
    Busy,
    #[error("record is not loaded")]
    NotReady,
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("{field} does not accept file uploads")]
    NotAnImageField { field: String },
    #[error("save failed ({source}); uploaded file {path} could not be removed")]
    OrphanedUpload { path: String, source: BackendError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMode {
    Create,
    Edit,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Submitting,
}

#[derive(Debug, Clone)]
struct PendingUpload {
    field: &'static str,
    blob: Blob,
}

pub struct DetailView {
    state: AppState,
    resource: &'static Resource,
    mode: DetailMode,
    phase: Phase,
    record_id: Option<RecordId>,
    draft: Draft,
    uploads: Vec<PendingUpload>,
    errors: ValidationErrors,
}

impl DetailView {
    /// Create form over an empty draft; ready immediately.
    #[must_use]
    pub fn create(state: AppState, resource: &'static Resource) -> Self {
        Self::with_mode(state, resource, DetailMode::Create, None, Phase::Ready)
    }

    /// Edit form; call [`DetailView::load`] to hydrate the draft.
    #[must_use]
    pub fn edit(state: AppState, resource: &'static Resource, id: RecordId) -> Self {
        Self::with_mode(state, resource, DetailMode::Edit, Some(id), Phase::Loading)
    }

    /// Read-only view; call [`DetailView::load`] to hydrate the draft.
    #[must_use]
    pub fn view(state: AppState, resource: &'static Resource, id: RecordId) -> Self {
        Self::with_mode(state, resource, DetailMode::View, Some(id), Phase::Loading)
    }

    /// Build the view a route points at. `List` and `Home` have no detail view.
    #[must_use]
    pub fn for_route(state: AppState, route: &AdminRoute) -> Option<Self> {
        match route {
            AdminRoute::Create(r) => Some(Self::create(state, *r)),
            AdminRoute::Edit(r, id) => Some(Self::edit(state, *r, id.clone())),
            AdminRoute::View(r, id) => Some(Self::view(state, *r, id.clone())),
            AdminRoute::Home | AdminRoute::List(_) => None,
        }
    }

    fn with_mode(
        state: AppState,
        resource: &'static Resource,
        mode: DetailMode,
        record_id: Option<RecordId>,
        phase: Phase,
    ) -> Self {
        Self {
            state,
            resource,
            mode,
            phase,
            record_id,
            draft: Draft::empty(resource),
            uploads: Vec::new(),
            errors: ValidationErrors::default(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> DetailMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    #[must_use]
    pub fn resource(&self) -> &'static Resource {
        self.resource
    }

    /// Field errors from the last rejected submit, for inline display.
    #[must_use]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Whether the form renders locked.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mode == DetailMode::View || !self.resource.writable
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    /// Fetch the record and hydrate the draft. A no-op in create mode.
    ///
    /// # Errors
    ///
    /// On failure the view stays in `Loading`, a toast is shown, and the
    /// caller may retry.
    pub async fn load(&mut self) -> Result<(), DetailError> {
        let Some(id) = self.record_id.clone() else {
            return Ok(());
        };
        let table = self.resource.table;
        self.phase = Phase::Loading;

        let result = self
            .state
            .client
            .select(table, &Query::new().filter(id.filter()).range(0, 0))
            .await;

        let row = match result {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                warn!(table, %id, error = %e, "record fetch failed");
                self.state.toasts.error("Failed to load record");
                return Err(e.into());
            }
        };
        let Some(record) = row.and_then(|r| Record::from_row(r).ok()) else {
            self.state.toasts.error("Record not found");
            return Err(DetailError::NotFound(id));
        };

        self.draft = Draft::from_record(self.resource, &record);
        self.phase = Phase::Ready;
        Ok(())
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Parse raw input for `name` into the draft.
    ///
    /// # Errors
    ///
    /// `ReadOnly` in view mode, `NotReady` before load, `Field` for unknown,
    /// read-only, or unparsable fields. The draft is unchanged on error.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), DetailError> {
        self.ensure_editable()?;
        let spec = self
            .resource
            .field(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        if spec.read_only || (spec.create_only && self.mode == DetailMode::Edit) {
            return Err(FieldError::ReadOnly { field: spec.name, label: spec.label }.into());
        }
        let value = parse_input(spec, raw)?;
        self.draft.set(spec.name, value);
        Ok(())
    }

    /// Stage a file for an image field. Uploaded on submit.
    ///
    /// # Errors
    ///
    /// `NotAnImageField` unless the field is an image on a resource with a
    /// storage bucket.
    pub fn attach_file(&mut self, name: &str, blob: Blob) -> Result<(), DetailError> {
        self.ensure_editable()?;
        let spec = self
            .resource
            .field(name)
            .filter(|f| f.kind == FieldKind::Image && !f.read_only && self.resource.bucket.is_some())
            .ok_or_else(|| DetailError::NotAnImageField { field: name.to_string() })?;
        self.uploads.retain(|u| u.field != spec.name);
        self.uploads.push(PendingUpload { field: spec.name, blob });
        Ok(())
    }

    /// Public URL of an image field's stored path, if set.
    #[must_use]
    pub fn image_url(&self, name: &str) -> Option<String> {
        let bucket = self.resource.bucket?;
        let path = self.draft.text(name);
        (!path.is_empty()).then(|| self.state.client.public_url(bucket, &path))
    }

    fn ensure_editable(&self) -> Result<(), DetailError> {
        match (self.mode, self.phase) {
            (DetailMode::View, _) => Err(DetailError::ReadOnly),
            _ if !self.resource.writable => Err(DetailError::NotWritable(self.resource.slug)),
            (_, Phase::Loading) => Err(DetailError::NotReady),
            (_, Phase::Submitting) => Err(DetailError::Busy),
            (_, Phase::Ready) => Ok(()),
        }
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Validate and commit the draft. Returns the list route to navigate to.
    ///
    /// # Errors
    ///
    /// `Validation` without any network call; backend errors after
    /// returning to `Ready` with a toast.
    pub async fn submit(&mut self) -> Result<AdminRoute, DetailError> {
        self.ensure_editable()?;

        let mut candidate = self.draft.clone();
        for upload in &self.uploads {
            candidate.set(upload.field, Value::String(upload.blob.file_name.clone()));
        }
        if let Err(errors) = validate_draft(self.resource, &candidate) {
            self.state.toasts.error(errors.to_string());
            self.errors = errors.clone();
            return Err(errors.into());
        }
        self.errors = ValidationErrors::default();

        self.phase = Phase::Submitting;
        let result = self.commit().await;
        self.phase = Phase::Ready;

        match result {
            Ok(()) => {
                let verb = if self.mode == DetailMode::Create { "Created" } else { "Saved" };
                self.state.toasts.success(verb);
                Ok(AdminRoute::List(self.resource))
            }
            Err(e) => {
                warn!(table = self.resource.table, error = %e, "submit failed");
                self.state.toasts.error("Save failed");
                Err(e)
            }
        }
    }

    async fn commit(&mut self) -> Result<(), DetailError> {
        let table = self.resource.table;
        let uploaded = self.upload_pending().await?;

        let mut draft = self.draft.clone();
        for (field, path) in &uploaded {
            draft.set(field, Value::String(path.clone()));
        }
        let written = match (self.mode, &self.record_id) {
            (DetailMode::Create, _) => self
                .state
                .client
                .insert(table, vec![draft.to_row(self.resource)])
                .await
                .map(|_| ())
                .map_err(DetailError::from),
            (DetailMode::Edit, Some(id)) => {
                let patch = draft.to_patch(self.resource);
                if patch.is_empty() {
                    Ok(())
                } else {
                    match self.state.client.update(table, patch, &[id.filter()]).await {
                        Ok(rows) if rows.is_empty() => Err(DetailError::NotFound(id.clone())),
                        Ok(_) => Ok(()),
                        Err(e) => Err(e.into()),
                    }
                }
            }
            (DetailMode::Edit, None) => Err(DetailError::NotReady),
            (DetailMode::View, _) => Err(DetailError::ReadOnly),
        };

        if let Err(e) = written {
            return Err(self.compensate(&uploaded, e).await);
        }

        info!(table, mode = ?self.mode, uploads = uploaded.len(), "record saved");
        self.draft = draft;
        self.uploads.clear();
        Ok(())
    }

    /// Upload staged files; on a failed upload, remove the ones already stored.
    async fn upload_pending(&self) -> Result<Vec<(&'static str, String)>, DetailError> {
        let Some(bucket) = self.resource.bucket else {
            return Ok(Vec::new());
        };
        let mut uploaded = Vec::with_capacity(self.uploads.len());
        for upload in &self.uploads {
            let path = format!("{}/{}-{}", self.resource.table, Uuid::new_v4(), upload.blob.file_name);
            match self
                .state
                .client
                .upload(bucket, &path, upload.blob.clone())
                .await
            {
                Ok(stored) => uploaded.push((upload.field, stored)),
                Err(e) => return Err(self.compensate(&uploaded, e.into()).await),
            }
        }
        Ok(uploaded)
    }

    /// Remove uploaded objects after a failed save. Returns the error to
    /// report: the original one, or `OrphanedUpload` if a removal failed.
    async fn compensate(&self, uploaded: &[(&'static str, String)], err: DetailError) -> DetailError {
        let Some(bucket) = self.resource.bucket else {
            return err;
        };
        for (_, path) in uploaded {
            if let Err(remove_err) = self.state.client.remove_object(bucket, path).await {
                warn!(bucket, path = %path, error = %remove_err, "could not remove upload after failed save");
                let source = match err {
                    DetailError::Backend(e) => e,
                    other => BackendError::Request(other.to_string()),
                };
                return DetailError::OrphanedUpload { path: path.clone(), source };
            }
            info!(bucket, path = %path, "removed upload after failed save");
        }
        err
    }
}
