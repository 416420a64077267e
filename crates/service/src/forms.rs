//! Create/edit flow for one admin form.
//!
//! `Idle -> LoadingExisting (edit only) -> Ready -> Submitting -> Success | Failed`
//!
//! All upstream calls run inside the flow's [`ViewScope`]; once the view is
//! torn down their results are dropped and the phase is left as it was.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use models::forms::{FieldMap, FormSchema};
use models::EntityId;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::ProxyError;
use crate::image::ImagePreview;
use crate::scope::ViewScope;
use crate::upstream::{OutboundForm, Resource, UploadedFile, UpstreamClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormFailure {
    Validation(String),
    Upstream(ProxyError),
    SessionExpired,
    /// The view went away while a call was in flight.
    Cancelled,
}

impl FormFailure {
    fn from_proxy(e: ProxyError) -> Self {
        match e {
            ProxyError::SessionExpired => FormFailure::SessionExpired,
            ProxyError::Cancelled => FormFailure::Cancelled,
            ProxyError::Validation(msg) => FormFailure::Validation(msg),
            other => FormFailure::Upstream(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormPhase {
    Idle,
    LoadingExisting,
    Ready,
    Submitting,
    Success(Value),
    Failed(FormFailure),
}

struct FlowState<S> {
    phase: FormPhase,
    form: S,
    preview: ImagePreview,
    file: Option<UploadedFile>,
}

pub struct FormFlow<S: FormSchema> {
    resource: Resource,
    mode: FormMode,
    client: UpstreamClient,
    token: Option<String>,
    scope: ViewScope,
    // 编辑模式只拉取一次
    load_started: AtomicBool,
    state: Mutex<FlowState<S>>,
    _schema: PhantomData<S>,
}

impl<S: FormSchema> FormFlow<S> {
    pub fn new(
        resource: Resource,
        mode: FormMode,
        client: UpstreamClient,
        token: Option<String>,
    ) -> Self {
        Self::with_scope(resource, mode, client, token, ViewScope::new())
    }

    pub fn with_scope(
        resource: Resource,
        mode: FormMode,
        client: UpstreamClient,
        token: Option<String>,
        scope: ViewScope,
    ) -> Self {
        Self {
            resource,
            mode,
            client,
            token,
            scope,
            load_started: AtomicBool::new(false),
            state: Mutex::new(FlowState {
                phase: FormPhase::Idle,
                form: S::default(),
                preview: ImagePreview::None,
                file: None,
            }),
            _schema: PhantomData,
        }
    }

    fn state(&self) -> MutexGuard<'_, FlowState<S>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_phase(&self, phase: FormPhase) {
        self.state().phase = phase;
    }

    pub fn mode(&self) -> FormMode { self.mode }

    pub fn phase(&self) -> FormPhase { self.state().phase.clone() }

    pub fn form(&self) -> S { self.state().form.clone() }

    pub fn preview_src(&self) -> Option<String> { self.state().preview.src() }

    pub fn preview(&self) -> ImagePreview { self.state().preview.clone() }

    /// Prepare the flow: create mode goes straight to `Ready`, edit mode
    /// fetches and seeds the existing entity. Repeated or concurrent calls
    /// after the first are no-ops.
    pub async fn load_existing(&self) -> Result<(), FormFailure> {
        let id = match self.mode {
            FormMode::Create => {
                let mut st = self.state();
                if st.phase == FormPhase::Idle {
                    st.phase = FormPhase::Ready;
                }
                return Ok(());
            }
            FormMode::Edit(id) => id,
        };
        if self.load_started.swap(true, Ordering::SeqCst) {
            debug!(resource = %self.resource, id, "existing entity already loading");
            return Ok(());
        }
        self.set_phase(FormPhase::LoadingExisting);

        let fetched = self
            .scope
            .run(self.client.get::<S::Entity>(self.resource, id, self.token.as_deref()))
            .await;
        match fetched {
            Ok(entity) => {
                let (form, raw_image) = S::seed(&entity);
                let preview =
                    ImagePreview::from_stored(raw_image.as_deref(), self.client.asset_origin());
                let mut st = self.state();
                st.form = form;
                if !st.preview.is_local() {
                    st.preview = preview;
                }
                st.phase = FormPhase::Ready;
                Ok(())
            }
            Err(ProxyError::Cancelled) => Err(FormFailure::Cancelled),
            Err(e) => {
                // allow a retry after a failed fetch
                self.load_started.store(false, Ordering::SeqCst);
                let failure = FormFailure::from_proxy(e);
                self.set_phase(FormPhase::Failed(failure.clone()));
                Err(failure)
            }
        }
    }

    /// Replace the scalar fields from a submitted field map.
    pub fn set_fields(&self, fields: &FieldMap) -> Result<(), FormFailure> {
        let form = S::from_fields(fields).map_err(|e| FormFailure::Validation(e.to_string()))?;
        self.state().form = form;
        Ok(())
    }

    pub fn update_form(&self, f: impl FnOnce(&mut S)) {
        f(&mut self.state().form);
    }

    /// A newly picked file replaces whatever preview was shown.
    pub fn select_image(&self, file: UploadedFile) {
        let mut st = self.state();
        st.preview = ImagePreview::Local(file.clone());
        st.file = Some(file);
    }

    pub fn validate(&self) -> Result<(), FormFailure> {
        let st = self.state();
        st.form.validate().map_err(|e| FormFailure::Validation(e.to_string()))?;
        let has_file = st.file.as_ref().is_some_and(|f| !f.is_empty());
        if self.mode == FormMode::Create && S::IMAGE_REQUIRED_ON_CREATE && !has_file {
            return Err(FormFailure::Validation("image is required".into()));
        }
        Ok(())
    }

    pub async fn submit(&self) -> Result<Value, FormFailure> {
        if self.scope.is_torn_down() {
            return Err(FormFailure::Cancelled);
        }
        if let Err(failure) = self.validate() {
            self.set_phase(FormPhase::Failed(failure.clone()));
            return Err(failure);
        }
        let outbound = {
            let mut st = self.state();
            if st.phase == FormPhase::Submitting {
                return Err(FormFailure::Validation("submission already in progress".into()));
            }
            st.phase = FormPhase::Submitting;
            OutboundForm::from_schema(&st.form, st.file.clone())
        };

        let token = self.token.as_deref();
        let result = match self.mode {
            FormMode::Create => {
                let call = self.client.create(self.resource, outbound, token);
                self.scope.run(call).await
            }
            FormMode::Edit(id) => {
                let call = self.client.update(self.resource, id, outbound, token);
                self.scope.run(call).await
            }
        };
        match result {
            Ok(body) => {
                info!(resource = %self.resource, mode = ?self.mode, "form_submitted");
                self.set_phase(FormPhase::Success(body.clone()));
                Ok(body)
            }
            Err(ProxyError::Cancelled) => Err(FormFailure::Cancelled),
            Err(e) => {
                warn!(resource = %self.resource, error = %e, "form_submit_failed");
                let failure = FormFailure::from_proxy(e);
                self.set_phase(FormPhase::Failed(failure.clone()));
                Err(failure)
            }
        }
    }

    /// After a success, returns the list page to navigate back to.
    pub fn acknowledge(&self) -> Option<String> {
        let mut st = self.state();
        match st.phase {
            FormPhase::Success(_) => {
                st.phase = FormPhase::Idle;
                Some(self.resource.admin_list_path())
            }
            _ => None,
        }
    }

    /// Leave a failure so the user can fix the input and retry.
    pub fn dismiss_error(&self) {
        let mut st = self.state();
        if matches!(st.phase, FormPhase::Failed(_)) {
            st.phase = FormPhase::Ready;
        }
    }

    pub fn teardown(&self) { self.scope.teardown(); }
}

impl<S: FormSchema> Drop for FormFlow<S> {
    fn drop(&mut self) {
        self.scope.teardown();
    }
}
