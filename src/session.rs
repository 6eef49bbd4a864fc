// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-session identifiers and device metadata every composed form draws from.
//!
//! Session and device state is owned outside this crate: whatever logs in, persists
//! cookies, and generates device identifiers also implements [`SessionState`] and hands it
//! to the [`Client`]. The crate only ever reads from it. Every outgoing form carries
//! `_csrftoken`, `_uid`, `device_id` and `_uuid` drawn from here; a session that can't
//! produce them is a configuration defect on the caller's side, not something the
//! composers defend against.
//!
//! [`Client`]: ../struct.Client.html

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error;

/// Read-only access to the authenticated session backing every API call.
#[async_trait]
pub trait SessionState: Send + Sync {
    /// The CSRF token mirrored from the session cookies.
    fn csrf_token(&self) -> String;

    /// The persistent `android-`-prefixed device id.
    fn device_id(&self) -> String;

    /// The per-install client UUID.
    fn uuid(&self) -> String;

    /// The local UTC offset, in seconds.
    fn timezone_offset(&self) -> i32;

    /// The id tagged onto creation flows (`creation_logger_session_id`).
    fn session_id(&self) -> String;

    /// The full descriptor of the device this session pretends to be.
    fn device_payload(&self) -> DevicePayload;

    /// Resolves the authenticated account id from the session's cookie state.
    ///
    /// Resolution is asynchronous and happens once per composed request; whether the value
    /// is cached between calls is up to the implementation's own lifecycle.
    async fn resolve_account_id(&self) -> error::Result<String>;
}

/// The device descriptor submitted verbatim as the `device` field of signed forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub android_version: u32,
    pub android_release: String,
    pub manufacturer: String,
    pub model: String,
}
