// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A composite error type for errors that can occur while interacting with the API.
//!
//! This module doesn't grow an error taxonomy of its own: a failed call fails because the
//! session couldn't produce an account id, the signer rejected the field map, or the wire
//! exchange broke. The variants below exist to unify those collaborator error types at the
//! seam; the underlying error is always carried as the `source` and is never reinterpreted.

/// Convenience type alias for the errors returned by the external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur when composing or dispatching a call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session could not resolve the authenticated account id from its cookie state.
    #[error("could not resolve the account id from the session")]
    AccountId(#[source] BoxError),
    /// The signer rejected the plain field map.
    #[error("error signing the request form")]
    Signing(#[source] BoxError),
    /// The transport failed to complete the HTTP exchange.
    #[error("error completing the request")]
    Transport(#[source] BoxError),
    /// A form value or response body failed to convert to or from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an arbitrary session error into `Error::AccountId`.
    pub fn account_id(err: impl Into<BoxError>) -> Self {
        Error::AccountId(err.into())
    }

    /// Wraps an arbitrary signer error into `Error::Signing`.
    pub fn signing(err: impl Into<BoxError>) -> Self {
        Error::Signing(err.into())
    }

    /// Wraps an arbitrary transport error into `Error::Transport`.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(err.into())
    }
}

/// A `Result` alias where the `Err` case is `gram_mode::error::Error`.
pub type Result<T> = std::result::Result<T, Error>;
