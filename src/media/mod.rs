// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structs and functions for working with media posts: liking, finishing uploads, and
//! configuring what was uploaded.
//!
//! The operations in this module compose the signed forms the private mobile clients send
//! for media actions. Each call merges caller-supplied options with identifiers drawn from
//! the session, hands the assembled field map to the signer, and dispatches the result
//! through the transport: one request per call, with the raw envelope handed back as-is.
//!
//! ## Types
//!
//! - `InteractionOptions`/`ModuleInfo`: what to like or unlike, and the feed context the
//!   interaction is reported from.
//! - `UploadFinishOptions`: identifies a previously uploaded binary to finalize.
//! - `ConfigureOptions`: publish metadata laid over the computed configure defaults.
//!
//! ## Functions
//!
//! ### User actions
//!
//! These functions write to the authenticated account:
//!
//! - `like`/`unlike`
//! - `upload_finish`
//! - `configure` (and its deterministic sibling `configure_with_rng`)
//!
//! ### Metadata lookup
//!
//! - `likers`

use serde_json::Value;

use crate::common::*;

mod fun;

pub use self::fun::*;

/// The direction of a media interaction. Renders as the URL segment the endpoint expects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display)]
pub enum InteractionKind {
    #[display(fmt = "like")]
    Like,
    #[display(fmt = "unlike")]
    Unlike,
}

/// The feed context an interaction is reported from.
///
/// The platform requires a `module_name` (which surface the tap happened on, e.g.
/// `feed_timeline` or `profile`) and accepts additional context fields that vary by
/// surface; a profile like also reports `user_id` and `username`, for instance. Extra
/// fields are passed through verbatim.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub(crate) module_name: String,
    pub(crate) extra: serde_json::Map<String, Value>,
}

impl ModuleInfo {
    /// Creates a `ModuleInfo` for the given surface name.
    pub fn new(module_name: impl Into<String>) -> Self {
        ModuleInfo {
            module_name: module_name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Adds a context field that is passed through to the form verbatim.
    pub fn add_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The surface name this interaction is reported from.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }
}

/// Caller options for a single like or unlike.
#[derive(Debug, Clone)]
pub struct InteractionOptions {
    /// The id of the media post being acted on.
    pub media_id: String,
    /// The feed context the interaction is reported from.
    pub module_info: ModuleInfo,
    /// The platform's tap-source flag: 1 when the like came from a double tap on the
    /// media, 0 when it came from the like button. Sent outside the signed portion of the
    /// form, and passed through unmodified.
    pub d: u8,
}

impl InteractionOptions {
    /// Creates options for the given media id and context, reporting a like-button tap.
    pub fn new(media_id: impl Into<String>, module_info: ModuleInfo) -> Self {
        InteractionOptions {
            media_id: media_id.into(),
            module_info,
            d: 0,
        }
    }

    /// Marks the interaction as having come from a double tap on the media.
    pub fn double_tap(self) -> Self {
        InteractionOptions { d: 1, ..self }
    }
}

/// Announces that the binary upload for the given upload id has completed.
#[derive(Debug, Clone)]
pub struct UploadFinishOptions {
    /// The upload id handed out when the binary upload began.
    pub upload_id: String,
    /// Where the media came from, in the platform's numeric-string encoding ("4" is the
    /// camera roll).
    pub source_type: String,
}

/// Publish metadata for a previously uploaded and finalized piece of media.
///
/// Everything here is optional: whatever the caller doesn't supply is computed or
/// defaulted at dispatch time, and whatever it does supply wins over those defaults,
/// including nested overrides, which merge key-by-key with the computed sub-objects
/// rather than replacing them. Options are consumed by the call; the merge never writes
/// back into caller-owned data.
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) caption: Option<String>,
    pub(crate) extra: FormMap,
}

impl ConfigureOptions {
    /// Creates an empty set of options; every form field will come from the computed
    /// defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source width of the uploaded media. A zero width is treated as unset when
    /// deriving crop geometry.
    pub fn width(self, width: u32) -> Self {
        ConfigureOptions {
            width: Some(width),
            ..self
        }
    }

    /// Sets the source height of the uploaded media. A zero height is treated as unset
    /// when deriving crop geometry.
    pub fn height(self, height: u32) -> Self {
        ConfigureOptions {
            height: Some(height),
            ..self
        }
    }

    /// Sets the caption to publish with.
    pub fn caption(self, caption: impl Into<String>) -> Self {
        ConfigureOptions {
            caption: Some(caption.into()),
            ..self
        }
    }

    /// Adds an arbitrary field laid over the computed defaults. An object value merges
    /// key-by-key with the default object under the same key, so overriding
    /// `edits.crop_zoom` keeps the computed `edits.crop_original_size`.
    pub fn add_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra = self.extra.add_param(key, value);
        self
    }

    /// Flattens these options into the override form laid over the defaults.
    pub(crate) fn into_form(self) -> FormMap {
        self.extra
            .add_opt_param("width", self.width)
            .add_opt_param("height", self.height)
            .add_opt_param("caption", self.caption)
    }
}
