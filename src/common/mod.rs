// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Set of structs and methods that act as a sort of internal prelude.
//!
//! The elements in this module are the basic building blocks the API modules glob-import to
//! make available as a common language: the field-map type every outgoing form is assembled
//! with, the deep-merge used to lay caller options over computed defaults, and the response
//! envelope handed back by the transport.
//!
//! ## `FormMap`
//!
//! `FormMap` collects the fields of an outgoing form before they're handed to the signer.
//! It's a thin wrapper around a `serde_json::Map<String, Value>` rather than a string-only
//! parameter list, because several endpoints submit structured fields (the `device`
//! descriptor, the `edits` sub-object on configure) inside an otherwise flat form. The
//! builder methods accept `impl Into<Value>`, so string literals, numbers, and prebuilt
//! `json!` values all read the same at the call site.
//!
//! ## `merge_defaults`
//!
//! `merge_defaults` merges caller-supplied fields over a computed defaults map: the caller
//! wins on every leaf conflict, and nested objects are merged key-by-key instead of being
//! replaced wholesale. It consumes both maps and returns a new one; neither input is ever
//! visible to the caller again, so there is no in-place mutation to observe.
//!
//! ## `Response`
//!
//! In its own module, `ApiResponse` is the envelope the transport resolves to. See
//! [`response`] for how the body is surfaced.

use hyper::header::{HeaderMap, HeaderValue};
use serde_json::Value;

mod response;

pub use self::response::*;

/// A set of headers attached to a request or returned with a response.
pub type Headers = HeaderMap<HeaderValue>;

/// Represents the plain field map of an outgoing form, before signing.
///
/// Most of the functions that add fields follow a builder pattern, so that a form can be
/// assembled in a single statement:
///
/// ```
/// use gram_mode::FormMap;
///
/// let fields = FormMap::new()
///     .add_param("source_type", "4")
///     .add_param("upload_id", "1234567890");
/// ```
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref, derive_more::DerefMut, derive_more::From)]
pub struct FormMap(serde_json::Map<String, Value>);

impl FormMap {
    /// Creates a new, empty `FormMap`.
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    /// Adds the given key/value field to this `FormMap`.
    pub fn add_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Adds the given key/value field to this `FormMap` only if the given value is `Some`.
    ///
    /// If the given value is `None`, the `FormMap` is returned unmodified.
    pub fn add_opt_param(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(val) => self.add_param(key, val),
            None => self,
        }
    }

    /// Unwraps this `FormMap` into the underlying field map.
    pub fn into_inner(self) -> serde_json::Map<String, Value> {
        self.0
    }
}

/// Merges the fields of `overrides` over the fields of `defaults`, returning the combined
/// map.
///
/// Overrides win on every leaf conflict. When both sides hold an object under the same key,
/// the objects are merged recursively rather than the default being replaced wholesale, so
/// an override of `edits.crop_zoom` leaves the computed `edits.crop_original_size` intact.
pub fn merge_defaults(overrides: FormMap, defaults: FormMap) -> FormMap {
    FormMap(merge_objects(overrides.0, defaults.0))
}

fn merge_objects(
    overrides: serde_json::Map<String, Value>,
    defaults: serde_json::Map<String, Value>,
) -> serde_json::Map<String, Value> {
    let mut merged = defaults;
    for (key, value) in overrides {
        let value = match (merged.remove(&key), value) {
            (Some(Value::Object(default)), Value::Object(over)) => {
                Value::Object(merge_objects(over, default))
            }
            (_, over) => over,
        };
        merged.insert(key, value);
    }
    merged
}
