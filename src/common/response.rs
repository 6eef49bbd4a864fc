// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Infrastructure types related to the response envelope handed back by the transport.

use serde::de::DeserializeOwned;

use crate::error;

/// The raw response envelope a dispatched request resolves to.
///
/// The crate composes and dispatches requests but deliberately doesn't interpret what comes
/// back; success and failure semantics beyond the HTTP exchange itself belong to the
/// platform. Callers that own a typed view of an endpoint's body can project into it with
/// [`deserialize`].
///
/// [`deserialize`]: #method.deserialize
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// The decoded JSON body of the response.
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Wraps an already-decoded body into an `ApiResponse`.
    pub fn new(body: serde_json::Value) -> Self {
        ApiResponse { body }
    }

    /// Deserializes the response body into the given type.
    pub fn deserialize<T: DeserializeOwned>(self) -> error::Result<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}
