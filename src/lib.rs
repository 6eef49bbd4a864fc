// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A library for interacting with Instagram's private mobile API.
//!
//! The private API is what the official mobile clients speak: form-encoded POSTs whose
//! bodies have been through a platform-specific signing step, decorated with identifiers
//! drawn from the logged-in session and the device it pretends to be. This crate owns the
//! *composition* of those calls, and deliberately owns nothing else: it merges caller
//! options with session- and device-derived defaults into the canonical form, then hands
//! the result to a signing step and a transport that live outside it.
//!
//! ## Getting started
//!
//! Everything revolves around a [`Client`], which bundles the three externally-owned
//! services every call passes through:
//!
//! * a [`SessionState`], the read-only view of the authenticated session (CSRF token,
//!   device identifiers, device descriptor, and the asynchronously resolved account id);
//! * a [`Signer`], which turns a plain field map into a transmittable signed form;
//! * a [`Transport`], which performs the actual HTTP exchange.
//!
//! None of the three are implemented here. Whatever owns your login flow, signing secret,
//! and HTTP stack implements the traits and hands them in; the crate composes requests
//! against them and propagates their failures unmodified. There are no retries, no rate
//! limiting, and no caching: each call issues a single request and hands back the raw
//! response envelope.
//!
//! [`Client`]: struct.Client.html
//! [`SessionState`]: session/trait.SessionState.html
//! [`Signer`]: request/trait.Signer.html
//! [`Transport`]: request/trait.Transport.html
//!
//! With a client in hand, the operations live in the area modules:
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() {
//! # let client: gram_mode::Client = unimplemented!();
//! use gram_mode::media::{self, InteractionOptions, ModuleInfo};
//!
//! let module = ModuleInfo::new("feed_timeline");
//! let options = InteractionOptions::new("2783910284_1234567890", module).double_tap();
//! media::like(options, &client).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

mod common;
pub mod error;
mod links;
pub mod media;
pub mod request;
pub mod session;

pub use crate::common::{ApiResponse, FormMap, Headers};
pub use crate::request::{ApiRequest, SignedForm, Signer, Transport};
pub use crate::session::{DevicePayload, SessionState};

/// The handle every operation is dispatched through.
///
/// A `Client` is nothing more than the bundle of the three collaborator services, shared
/// behind `Arc` so that clones are cheap and calls can run concurrently; the crate keeps
/// no mutable state of its own between calls.
#[derive(Clone)]
pub struct Client {
    session: Arc<dyn SessionState>,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Bundles the given collaborators into a `Client`.
    pub fn new(
        session: Arc<dyn SessionState>,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Client {
            session,
            signer,
            transport,
        }
    }

    /// The session every composed form draws its identifiers from.
    pub fn session(&self) -> &dyn SessionState {
        self.session.as_ref()
    }

    /// The signer plain field maps are run through.
    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    /// The transport assembled requests are dispatched over.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}
