// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The request envelope and the two collaborator seams it passes through.
//!
//! Composing a call takes a plain [`FormMap`] through two externally-owned services: a
//! [`Signer`] turns the field map into a [`SignedForm`] carrying whatever authentication
//! material the platform expects, and a [`Transport`] performs the HTTP exchange for an
//! assembled [`ApiRequest`]. Both are consumed as traits; the signing algorithm, connection
//! pooling, ambient cookies and base-URL policy all live behind them. The composers in this
//! crate only decide *what* goes into the form and *where* it is sent.
//!
//! [`FormMap`]: ../struct.FormMap.html
//! [`Signer`]: trait.Signer.html
//! [`SignedForm`]: struct.SignedForm.html
//! [`Transport`]: trait.Transport.html
//! [`ApiRequest`]: struct.ApiRequest.html

use async_trait::async_trait;
use hyper::header::HeaderValue;
use hyper::Method;
use serde_json::Value;

use crate::common::{ApiResponse, FormMap, Headers};
use crate::error;

/// Converts a plain field map into a transmittable, platform-authenticated form.
///
/// The transformation is deterministic for a given field map; how the signature is derived
/// is opaque to this crate.
pub trait Signer: Send + Sync {
    fn sign_post(&self, fields: FormMap) -> error::Result<SignedForm>;
}

/// Performs the HTTP exchange for an assembled request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> error::Result<ApiResponse>;
}

/// A form that has been through the signer, ready for transmission.
///
/// Opaque apart from [`append`]: a handful of fields are deliberately attached *after*
/// signing, so the signature covers the identity and module fields but not them.
///
/// [`append`]: #method.append
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref, derive_more::From)]
pub struct SignedForm(serde_json::Map<String, Value>);

impl SignedForm {
    /// Attaches a field to the form without it having been part of the signed input.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// An assembled request, ready to hand to the transport.
///
/// `url` is the endpoint path; host and version prefix policy belong to the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    pub form: Option<SignedForm>,
    pub headers: Headers,
}

impl ApiRequest {
    /// Assembles a GET request to the given path. GET is the default method for requests
    /// that don't state one.
    pub fn get(url: impl Into<String>) -> Self {
        ApiRequest {
            url: url.into(),
            method: Method::GET,
            form: None,
            headers: Headers::new(),
        }
    }

    /// Assembles a POST request to the given path.
    pub fn post(url: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::POST,
            ..ApiRequest::get(url)
        }
    }

    /// Attaches the given signed form as the request body.
    pub fn with_form(self, form: SignedForm) -> Self {
        ApiRequest {
            form: Some(form),
            ..self
        }
    }

    /// Attaches the given header to the request.
    ///
    /// Header values the crate attaches are known-valid ASCII; a caller-supplied value that
    /// isn't is a programming error.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        let value = HeaderValue::from_str(value).expect("invalid header value");
        self.headers.insert(name, value);
        self
    }
}
