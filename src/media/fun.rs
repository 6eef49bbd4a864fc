// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::Local;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::common::*;
use crate::error;
use crate::links;
use crate::request::ApiRequest;
use crate::Client;

use super::{ConfigureOptions, InteractionKind, InteractionOptions, UploadFinishOptions};

///Fixed `radio_type` reported with every interaction.
const RADIO_TYPE: &str = "wifi-none";

///Fallback source dimensions when the caller supplies none (or zero).
const DEFAULT_WIDTH: u32 = 1520;
const DEFAULT_HEIGHT: u32 = 2048;

///EXIF-style local timestamp format used for capture metadata.
const CAPTURE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

///Retry telemetry reported alongside `upload_finish`.
///
///The crate issues one request per call and tracks no retries, so the zero state is the
///only one it ever reports.
#[derive(Debug, Default, Serialize)]
struct RetryContext {
    num_step_auto_retry: u32,
    num_reupload: u32,
    num_step_manual_retry: u32,
}

lazy_static::lazy_static! {
    static ref ZERO_RETRY_CONTEXT: String =
        serde_json::to_string(&RetryContext::default()).expect("retry context renders as JSON");
}

///Like the given media post as the authenticated user.
///
///On success, this yields the platform's raw response envelope; the crate doesn't
///interpret it. Calling `like` twice issues two requests; idempotence, if any, is the
///platform's.
pub async fn like(options: InteractionOptions, client: &Client) -> error::Result<ApiResponse> {
    interact(options, InteractionKind::Like, client).await
}

///Clears a like of the given media post as the authenticated user.
pub async fn unlike(options: InteractionOptions, client: &Client) -> error::Result<ApiResponse> {
    interact(options, InteractionKind::Unlike, client).await
}

async fn interact(
    options: InteractionOptions,
    kind: InteractionKind,
    client: &Client,
) -> error::Result<ApiResponse> {
    let session = client.session();
    let InteractionOptions {
        media_id,
        module_info,
        d,
    } = options;

    let mut fields = FormMap::new()
        .add_param("module_name", module_info.module_name)
        .add_param("media_id", media_id.clone())
        .add_param("_csrftoken", session.csrf_token());
    for (key, value) in module_info.extra {
        // the required module_name already leads the form; a stray duplicate among the
        // extras must not clobber it
        if key != "module_name" {
            fields = fields.add_param(key, value);
        }
    }
    let fields = fields
        .add_param("radio_type", RADIO_TYPE)
        .add_param("_uid", session.resolve_account_id().await?)
        .add_param("device_id", session.device_id())
        .add_param("_uuid", session.uuid());

    let mut form = client.signer().sign_post(fields)?;
    // the tap-source flag rides outside the signed portion: the signature covers the
    // identity and module fields only
    form.append("d", d);

    let url = format!("{}/{}/{}/", links::media::MEDIA_STEM, media_id, kind);
    debug!(%url, "dispatching media interaction");
    client
        .transport()
        .send(ApiRequest::post(url).with_form(form))
        .await
}

///Look up who liked the given media post.
///
///This is a plain read: nothing is signed and no session fields are attached, on the
///assumption that the transport carries ambient auth. Response types are owned by the
///caller, so the body is deserialized into whatever type is asked for.
pub async fn likers<T: DeserializeOwned>(id: &str, client: &Client) -> error::Result<T> {
    let url = format!("{}/{}/likers", links::media::MEDIA_STEM, id);
    let response = client.transport().send(ApiRequest::get(url)).await?;
    response.deserialize()
}

///Announce that the binary upload behind the given upload id has completed.
pub async fn upload_finish(
    options: UploadFinishOptions,
    client: &Client,
) -> error::Result<ApiResponse> {
    let session = client.session();
    debug!(upload_id = %options.upload_id, "announcing upload completion");

    let fields = FormMap::new()
        .add_param("timezone_offset", session.timezone_offset().to_string())
        .add_param("_csrftoken", session.csrf_token())
        .add_param("source_type", options.source_type)
        .add_param("_uid", session.resolve_account_id().await?)
        .add_param("device_id", session.device_id())
        .add_param("_uuid", session.uuid())
        .add_param("upload_id", options.upload_id)
        .add_param("device", serde_json::to_value(session.device_payload())?);
    let form = client.signer().sign_post(fields)?;

    let request = ApiRequest::post(links::media::UPLOAD_FINISH)
        .with_header("retry_context", &ZERO_RETRY_CONTEXT)
        .with_form(form);
    client.transport().send(request).await
}

///Configure (publish) a previously uploaded and finalized piece of media.
///
///Caller options are laid over a computed defaults map of capture metadata, session
///identifiers, and crop geometry derived from the source dimensions. The caller wins on
///every conflict; nested overrides merge key-by-key with the computed sub-objects.
pub async fn configure(
    options: ConfigureOptions,
    client: &Client,
) -> error::Result<ApiResponse> {
    let crop_zoom = render_crop_zoom(&mut rand::thread_rng());
    configure_form(options, crop_zoom, client).await
}

///`configure` with the crop-zoom randomness supplied by the caller.
///
///The default crop zoom is the only nondeterministic input to a configure form; taking
///the generator as an argument keeps the composition reproducible.
pub async fn configure_with_rng<R: Rng>(
    options: ConfigureOptions,
    rng: &mut R,
    client: &Client,
) -> error::Result<ApiResponse> {
    let crop_zoom = render_crop_zoom(rng);
    configure_form(options, crop_zoom, client).await
}

fn render_crop_zoom<R: Rng>(rng: &mut R) -> String {
    format!("{:.7}", rng.gen_range(1.01..1.99))
}

async fn configure_form(
    options: ConfigureOptions,
    crop_zoom: String,
    client: &Client,
) -> error::Result<ApiResponse> {
    let session = client.session();
    let device = session.device_payload();
    let width = options.width.filter(|&w| w != 0).unwrap_or(DEFAULT_WIDTH);
    let height = options.height.filter(|&h| h != 0).unwrap_or(DEFAULT_HEIGHT);
    let now = Local::now().format(CAPTURE_TIME_FORMAT).to_string();

    let defaults = FormMap::new()
        .add_param("date_time_digitalized", now.clone())
        .add_param("camera_model", device.model.clone())
        .add_param("scene_capture_type", "standard")
        .add_param("timezone_offset", session.timezone_offset().to_string())
        .add_param("_csrftoken", session.csrf_token())
        .add_param("media_folder", "Camera")
        .add_param("source_type", "4")
        .add_param("_uid", session.resolve_account_id().await?)
        .add_param("device_id", session.device_id())
        .add_param("_uuid", session.uuid())
        .add_param("creation_logger_session_id", session.session_id())
        .add_param("caption", "")
        .add_param("date_time_original", now)
        .add_param("software", "1")
        .add_param("camera_make", device.manufacturer.clone())
        .add_param("device", serde_json::to_value(device)?)
        .add_param(
            "edits",
            json!({
                "crop_original_size": [width, height],
                "crop_center": [0.0, -0.0],
                "crop_zoom": crop_zoom,
            }),
        )
        .add_param(
            "extra",
            json!({ "source_width": width, "source_height": height }),
        );

    let form = merge_defaults(options.into_form(), defaults);
    let signed = client.signer().sign_post(form)?;

    debug!("dispatching media configure");
    client
        .transport()
        .send(ApiRequest::post(links::media::CONFIGURE).with_form(signed))
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use hyper::Method;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;
    use serde::Deserialize;
    use serde_json::{json, Value};

    use super::super::ModuleInfo;
    use super::*;
    use crate::request::{SignedForm, Signer, Transport};
    use crate::session::{DevicePayload, SessionState};

    #[derive(Default)]
    struct TestSession {
        resolve_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SessionState for TestSession {
        fn csrf_token(&self) -> String {
            "missing-csrf".into()
        }

        fn device_id(&self) -> String {
            "android-1f2d3c4b5a697887".into()
        }

        fn uuid(&self) -> String {
            "8a2d7f5b-30c1-4c6e-9d4f-6e1b2a3c4d5e".into()
        }

        fn timezone_offset(&self) -> i32 {
            7200
        }

        fn session_id(&self) -> String {
            "c3b1a2d4-5e6f-4708-9a0b-1c2d3e4f5a6b".into()
        }

        fn device_payload(&self) -> DevicePayload {
            DevicePayload {
                android_version: 26,
                android_release: "8.0.0".into(),
                manufacturer: "OnePlus".into(),
                model: "ONEPLUS A3010".into(),
            }
        }

        async fn resolve_account_id(&self) -> error::Result<String> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            Ok("1234567890".into())
        }
    }

    ///Records every field map it is asked to sign, and tags its output so the tests can
    ///tell signed forms from plain ones.
    #[derive(Default)]
    struct RecordingSigner {
        seen: Mutex<Vec<FormMap>>,
    }

    impl Signer for RecordingSigner {
        fn sign_post(&self, fields: FormMap) -> error::Result<SignedForm> {
            self.seen.lock().unwrap().push(fields.clone());
            let mut signed = SignedForm::from(fields.into_inner());
            signed.append("ig_sig_key_version", "4");
            Ok(signed)
        }
    }

    struct RecordingTransport {
        requests: Mutex<Vec<ApiRequest>>,
        body: Value,
    }

    impl Default for RecordingTransport {
        fn default() -> Self {
            RecordingTransport {
                requests: Mutex::new(Vec::new()),
                body: json!({ "status": "ok" }),
            }
        }
    }

    impl RecordingTransport {
        fn replying(body: Value) -> Self {
            RecordingTransport {
                body,
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: ApiRequest) -> error::Result<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ApiResponse::new(self.body.clone()))
        }
    }

    struct Harness {
        session: Arc<TestSession>,
        signer: Arc<RecordingSigner>,
        transport: Arc<RecordingTransport>,
        client: Client,
    }

    impl Harness {
        fn new() -> Self {
            Harness::with_transport(RecordingTransport::default())
        }

        fn with_transport(transport: RecordingTransport) -> Self {
            let session = Arc::new(TestSession::default());
            let signer = Arc::new(RecordingSigner::default());
            let transport = Arc::new(transport);
            let client = Client::new(session.clone(), signer.clone(), transport.clone());
            Harness {
                session,
                signer,
                transport,
                client,
            }
        }

        fn signed_fields(&self) -> FormMap {
            self.signer.seen.lock().unwrap()[0].clone()
        }

        fn sent(&self) -> Vec<ApiRequest> {
            self.transport.requests.lock().unwrap().clone()
        }
    }

    fn timeline_module() -> ModuleInfo {
        ModuleInfo::new("feed_timeline")
    }

    #[tokio::test]
    async fn module_name_appears_exactly_once() {
        let harness = Harness::new();
        // a stray module_name among the extras must not clobber the required one
        let module = ModuleInfo::new("profile")
            .add_field("module_name", "feed_timeline")
            .add_field("user_id", "1234567890")
            .add_field("username", "rustlang");

        like(
            InteractionOptions::new("2783910284_1234567890", module),
            &harness.client,
        )
        .await
        .unwrap();

        let fields = harness.signed_fields();
        assert_eq!(fields["module_name"], json!("profile"));
        assert_eq!(fields["user_id"], json!("1234567890"));
        assert_eq!(fields["username"], json!("rustlang"));
        assert_eq!(fields["media_id"], json!("2783910284_1234567890"));
        assert_eq!(fields["radio_type"], json!("wifi-none"));
        assert_eq!(fields["_uid"], json!("1234567890"));
        assert_eq!(fields["device_id"], json!("android-1f2d3c4b5a697887"));
    }

    #[tokio::test]
    async fn tap_flag_bypasses_the_signer() {
        let harness = Harness::new();

        like(
            InteractionOptions::new("2783910284_1234567890", timeline_module()).double_tap(),
            &harness.client,
        )
        .await
        .unwrap();

        assert!(!harness.signed_fields().contains_key("d"));

        let sent = harness.sent();
        let form = sent[0].form.as_ref().unwrap();
        assert_eq!(form["d"], json!(1));
        assert_eq!(form["ig_sig_key_version"], json!("4"));
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].url, "/api/v1/media/2783910284_1234567890/like/");
    }

    #[tokio::test]
    async fn unlike_posts_to_the_unlike_segment() {
        let harness = Harness::new();

        unlike(
            InteractionOptions::new("2783910284_1234567890", timeline_module()),
            &harness.client,
        )
        .await
        .unwrap();

        let sent = harness.sent();
        assert_eq!(sent[0].url, "/api/v1/media/2783910284_1234567890/unlike/");
        assert_eq!(sent[0].form.as_ref().unwrap()["d"], json!(0));
    }

    #[tokio::test]
    async fn concurrent_interactions_stay_independent() {
        let harness = Harness::new();
        let media_id = "2783910284_1234567890";

        let liking = like(
            InteractionOptions::new(media_id, timeline_module()),
            &harness.client,
        );
        let unliking = unlike(
            InteractionOptions::new(media_id, timeline_module()),
            &harness.client,
        );
        let (liked, unliked) = futures::join!(liking, unliking);
        liked.unwrap();
        unliked.unwrap();

        // each in-flight call resolves the account id for itself
        assert_eq!(harness.session.resolve_calls.load(Ordering::SeqCst), 2);

        let urls: Vec<String> = harness.sent().into_iter().map(|req| req.url).collect();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&format!("/api/v1/media/{}/like/", media_id)));
        assert!(urls.contains(&format!("/api/v1/media/{}/unlike/", media_id)));
    }

    #[derive(Debug, Deserialize)]
    struct Likers {
        user_count: u32,
    }

    #[tokio::test]
    async fn likers_is_a_plain_unsigned_get() {
        let harness = Harness::with_transport(RecordingTransport::replying(json!({
            "user_count": 2,
            "users": [],
            "status": "ok",
        })));

        let likers: Likers = likers("2783910284_1234567890", &harness.client)
            .await
            .unwrap();
        assert_eq!(likers.user_count, 2);

        let sent = harness.sent();
        assert_eq!(sent[0].method, Method::GET);
        assert!(sent[0].form.is_none());
        assert_eq!(sent[0].url, "/api/v1/media/2783910284_1234567890/likers");
        assert!(harness.signer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_finish_reports_zero_retry_telemetry() {
        let harness = Harness::new();

        upload_finish(
            UploadFinishOptions {
                upload_id: "17890123456".into(),
                source_type: "4".into(),
            },
            &harness.client,
        )
        .await
        .unwrap();

        let sent = harness.sent();
        assert_eq!(sent[0].url, "/api/v1/media/upload_finish/");
        let header = sent[0].headers.get("retry_context").unwrap();
        assert_eq!(
            header.to_str().unwrap(),
            r#"{"num_step_auto_retry":0,"num_reupload":0,"num_step_manual_retry":0}"#
        );

        let fields = harness.signed_fields();
        assert_eq!(fields["upload_id"], json!("17890123456"));
        assert_eq!(fields["timezone_offset"], json!("7200"));
        assert_eq!(fields["device"]["model"], json!("ONEPLUS A3010"));
        assert_eq!(fields["device"]["manufacturer"], json!("OnePlus"));
    }

    #[tokio::test]
    async fn configure_defaults_the_crop_geometry() {
        let harness = Harness::new();

        configure(ConfigureOptions::new(), &harness.client)
            .await
            .unwrap();

        let fields = harness.signed_fields();
        assert_eq!(fields["edits"]["crop_original_size"], json!([1520, 2048]));
        assert_eq!(fields["edits"]["crop_center"], json!([0.0, -0.0]));
        assert_eq!(
            fields["extra"],
            json!({ "source_width": 1520, "source_height": 2048 })
        );
        assert_eq!(fields["media_folder"], json!("Camera"));
        assert_eq!(fields["source_type"], json!("4"));
        assert_eq!(fields["scene_capture_type"], json!("standard"));
        assert_eq!(fields["caption"], json!(""));
        assert_eq!(fields["camera_make"], json!("OnePlus"));
        assert_eq!(fields["camera_model"], json!("ONEPLUS A3010"));
        assert!(sent_date_is_exif(&fields["date_time_original"]));
        assert_eq!(fields["date_time_original"], fields["date_time_digitalized"]);

        let sent = harness.sent();
        assert_eq!(sent[0].url, "/api/v1/media/configure/");
    }

    fn sent_date_is_exif(value: &Value) -> bool {
        let pattern = Regex::new(r"^\d{4}:\d{2}:\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        value.as_str().map_or(false, |date| pattern.is_match(date))
    }

    #[tokio::test]
    async fn configure_treats_zero_dimensions_as_unset() {
        let harness = Harness::new();

        configure(
            ConfigureOptions::new().width(0).height(0),
            &harness.client,
        )
        .await
        .unwrap();

        let fields = harness.signed_fields();
        // crop geometry falls back, while the caller's literal fields pass through
        assert_eq!(fields["edits"]["crop_original_size"], json!([1520, 2048]));
        assert_eq!(fields["width"], json!(0));
        assert_eq!(fields["height"], json!(0));
    }

    #[tokio::test]
    async fn configure_merges_caller_options_over_defaults() {
        let harness = Harness::new();
        let options = ConfigureOptions::new()
            .caption("hi")
            .add_field("edits", json!({ "crop_zoom": 1.5 }));

        configure(options, &harness.client).await.unwrap();

        let fields = harness.signed_fields();
        assert_eq!(fields["caption"], json!("hi"));
        // the caller's leaf override wins without discarding the computed geometry
        assert_eq!(fields["edits"]["crop_zoom"], json!(1.5));
        assert_eq!(fields["edits"]["crop_original_size"], json!([1520, 2048]));
        assert_eq!(fields["edits"]["crop_center"], json!([0.0, -0.0]));
    }

    #[tokio::test]
    async fn default_crop_zoom_renders_seven_decimals_in_range() {
        let harness = Harness::new();
        let mut rng = StdRng::seed_from_u64(42);

        configure_with_rng(ConfigureOptions::new(), &mut rng, &harness.client)
            .await
            .unwrap();

        let fields = harness.signed_fields();
        let rendered = fields["edits"]["crop_zoom"].as_str().unwrap();
        assert!(Regex::new(r"^1\.\d{7}$").unwrap().is_match(rendered));

        let zoom: f64 = rendered.parse().unwrap();
        assert!((1.01..1.99).contains(&zoom));
    }

    #[test]
    fn crop_zoom_stays_in_range_across_seeds() {
        for seed in 0..64 {
            let rendered = render_crop_zoom(&mut StdRng::seed_from_u64(seed));
            let zoom: f64 = rendered.parse().unwrap();
            assert!((1.01..1.99).contains(&zoom), "seed {}: {}", seed, rendered);
        }
    }

    struct FailingTransport;

    #[async_trait::async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: ApiRequest) -> error::Result<ApiResponse> {
            Err(error::Error::transport("connection reset by peer"))
        }
    }

    #[tokio::test]
    async fn transport_failures_propagate_unmodified() {
        let session = Arc::new(TestSession::default());
        let signer = Arc::new(RecordingSigner::default());
        let client = Client::new(session, signer, Arc::new(FailingTransport));

        let result = like(
            InteractionOptions::new("2783910284_1234567890", timeline_module()),
            &client,
        )
        .await;

        match result {
            Err(error::Error::Transport(source)) => {
                assert_eq!(source.to_string(), "connection reset by peer");
            }
            other => panic!("expected a transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn interaction_forms_carry_the_session_invariants() {
        let harness = Harness::new();

        like(
            InteractionOptions::new("2783910284_1234567890", timeline_module()),
            &harness.client,
        )
        .await
        .unwrap();
        upload_finish(
            UploadFinishOptions {
                upload_id: "17890123456".into(),
                source_type: "4".into(),
            },
            &harness.client,
        )
        .await
        .unwrap();
        configure(ConfigureOptions::new(), &harness.client)
            .await
            .unwrap();

        for fields in harness.signer.seen.lock().unwrap().iter() {
            for key in ["_csrftoken", "_uid", "device_id", "_uuid"].iter() {
                assert!(fields.contains_key(*key), "form missing {}", key);
            }
        }
    }
}
