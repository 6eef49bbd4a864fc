// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Endpoint paths used by the crate.
//!
//! The transport owns the host and API version prefix policy; everything here is expressed
//! as the path the private mobile clients send.

pub mod media {
    ///Stem for per-media endpoints; interaction and likers URLs are formatted off of this.
    pub const MEDIA_STEM: &str = "/api/v1/media";
    pub const UPLOAD_FINISH: &str = "/api/v1/media/upload_finish/";
    pub const CONFIGURE: &str = "/api/v1/media/configure/";
}
