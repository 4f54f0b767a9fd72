//! Form state holder.
//!
//! One [`ClinicalForm`] exists per view. Every setter overwrites its field
//! unconditionally; nothing here performs I/O or validates file contents.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

pub const RESPONSE_PLACEHOLDER: &str = "Your response will appear here after you submit a query.";

/// One of the three upload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileSlot {
    Report,
    XRay,
    EyeImage,
}

impl FileSlot {
    pub const ALL: [FileSlot; 3] = [FileSlot::Report, FileSlot::XRay, FileSlot::EyeImage];

    pub fn label(self) -> &'static str {
        match self {
            FileSlot::Report => "EHR Report (PDF)",
            FileSlot::XRay => "X-Ray Image",
            FileSlot::EyeImage => "Eye Image",
        }
    }

    /// Media types the picker offers for this slot. Advisory only.
    pub fn accept(self) -> &'static str {
        match self {
            FileSlot::Report => "application/pdf",
            FileSlot::XRay | FileSlot::EyeImage => "image/*",
        }
    }
}

/// Handle to a file the user picked. The file is never opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Plain copy of every field of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub report: Option<SelectedFile>,
    pub xray: Option<SelectedFile>,
    pub eye_image: Option<SelectedFile>,
    pub query: String,
    pub response: String,
    pub in_flight: bool,
}

impl FormState {
    pub fn file(&self, slot: FileSlot) -> Option<&SelectedFile> {
        match slot {
            FileSlot::Report => self.report.as_ref(),
            FileSlot::XRay => self.xray.as_ref(),
            FileSlot::EyeImage => self.eye_image.as_ref(),
        }
    }

    fn file_mut(&mut self, slot: FileSlot) -> &mut Option<SelectedFile> {
        match slot {
            FileSlot::Report => &mut self.report,
            FileSlot::XRay => &mut self.xray,
            FileSlot::EyeImage => &mut self.eye_image,
        }
    }
}

/// Result of trying to move a form from idle to in-flight.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Begin {
    /// A request is already outstanding; nothing was changed.
    Busy,
    /// The trimmed query was empty; the advisory message has been stored.
    EmptyQuery,
    /// The flag is now set; carries the query text to send.
    Started(String),
}

/// Shared handle to the state of one view instance.
#[derive(Debug, Clone, Default)]
pub struct ClinicalForm {
    state: Arc<RwLock<FormState>>,
}

impl ClinicalForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, FormState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FormState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces whatever the slot held. `None` clears it.
    pub fn set_file(&self, slot: FileSlot, file: Option<SelectedFile>) {
        *self.write().file_mut(slot) = file;
    }

    pub fn file(&self, slot: FileSlot) -> Option<SelectedFile> {
        self.read().file(slot).cloned()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.write().query = query.into();
    }

    pub fn query(&self) -> String {
        self.read().query.clone()
    }

    pub fn response(&self) -> String {
        self.read().response.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.read().in_flight
    }

    pub fn snapshot(&self) -> FormState {
        self.read().clone()
    }

    /// The response area text: the last response, or the placeholder when
    /// nothing has been answered yet.
    pub fn display_response(&self) -> String {
        let state = self.read();
        if state.response.is_empty() {
            RESPONSE_PLACEHOLDER.to_string()
        } else {
            state.response.clone()
        }
    }

    pub fn downgrade(&self) -> WeakForm {
        WeakForm {
            state: Arc::downgrade(&self.state),
        }
    }

    pub(crate) fn set_response(&self, response: impl Into<String>) {
        self.write().response = response.into();
    }

    pub(crate) fn try_begin(&self, empty_message: &str) -> Begin {
        let mut state = self.write();
        if state.in_flight {
            return Begin::Busy;
        }
        if state.query.trim().is_empty() {
            state.response = empty_message.to_string();
            return Begin::EmptyQuery;
        }
        state.in_flight = true;
        Begin::Started(state.query.clone())
    }

    pub(crate) fn finish(&self) {
        self.write().in_flight = false;
    }
}

/// Non-owning handle held by outstanding submissions so a closed view is not
/// kept alive by its own request.
#[derive(Debug, Clone)]
pub struct WeakForm {
    state: Weak<RwLock<FormState>>,
}

impl WeakForm {
    pub fn upgrade(&self) -> Option<ClinicalForm> {
        self.state.upgrade().map(|state| ClinicalForm { state })
    }
}
