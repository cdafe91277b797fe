//! Minimal wrapper around the Instagram mobile API with Scout defaults.
//!
//! Handles the device identity, login, and pagination of the hashtag
//! `sections` endpoint before delegating to the shared HTTP client.
use crate::instagram::types::{pk_to_string, LoginResponse, SectionsResponse};
use crate::{HashtagSource, Post, SocialError};
use async_trait::async_trait;
use chrono::Utc;
use scout_http::header::{HeaderMap, HeaderName, HeaderValue};
use scout_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::json;
use std::borrow::Cow;
use uuid::Uuid;

pub const INSTAGRAM_BASE_URL: &str = "https://i.instagram.com";
const APP_ID: &str = "567067343352427";
const USER_AGENT: &str = "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";
const AUTH_HEADER: &str = "ig-set-authorization";
const MAX_PAGES: usize = 20;

/// Identifiers the mobile API expects from a device; generated once per client.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub uuid: String,
    pub phone_id: String,
    pub advertising_id: String,
}

impl DeviceIdentity {
    pub fn random() -> Self {
        let android = Uuid::new_v4().simple().to_string();
        Self {
            device_id: format!("android-{}", &android[..16]),
            uuid: Uuid::new_v4().to_string(),
            phone_id: Uuid::new_v4().to_string(),
            advertising_id: Uuid::new_v4().to_string(),
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    authorization: String,
}

#[derive(Debug, Default)]
struct PageCursor {
    max_id: Option<String>,
    page: Option<u32>,
    next_media_ids: Option<String>,
}

impl PageCursor {
    fn after(page: &SectionsResponse) -> Option<Self> {
        if !page.more_available {
            return None;
        }
        let max_id = page.next_max_id.clone()?;
        Some(Self {
            max_id: Some(max_id),
            page: page.next_page,
            next_media_ids: page
                .next_media_ids
                .as_ref()
                .map(|ids| serde_json::Value::Array(ids.clone()).to_string()),
        })
    }
}

#[derive(Clone)]
pub struct InstagramClient {
    http: HttpClient,
    device: DeviceIdentity,
    session: Option<Session>,
}

impl InstagramClient {
    pub fn new() -> Result<Self, SocialError> {
        Self::with_base_url(INSTAGRAM_BASE_URL)
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(base_url: &str) -> Result<Self, SocialError> {
        let http = HttpClient::with_user_agent(base_url, USER_AGENT)?;
        Ok(Self {
            http,
            device: DeviceIdentity::random(),
            session: None,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn device_headers(&self) -> Result<HeaderMap, SocialError> {
        let value = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| SocialError::Config(format!("bad header: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-ig-app-id"), value(APP_ID)?);
        headers.insert(
            HeaderName::from_static("x-ig-device-id"),
            value(&self.device.uuid)?,
        );
        headers.insert(
            HeaderName::from_static("x-ig-android-id"),
            value(&self.device.device_id)?,
        );
        headers.insert(
            HeaderName::from_static("accept-language"),
            value("en-US")?,
        );
        Ok(headers)
    }

    /// Log in with a username and password and keep the issued session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&Session, SocialError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SocialError::Config(
                "Instagram username and password are required".into(),
            ));
        }

        let enc_password = format!("#PWD_INSTAGRAM:0:{}:{}", Utc::now().timestamp(), password);
        let payload = json!({
            "username": username,
            "enc_password": enc_password,
            "guid": self.device.uuid,
            "phone_id": self.device.phone_id,
            "device_id": self.device.device_id,
            "adid": self.device.advertising_id,
            "google_tokens": "[]",
            "login_attempt_count": "0",
        });
        let signed_body = format!("SIGNATURE.{payload}");
        let form = [("signed_body", Cow::Owned(signed_body))];

        tracing::info!(username, "Logging in to Instagram...");
        let resp = self
            .http
            .post_form::<LoginResponse>(
                "api/v1/accounts/login/",
                &form,
                RequestOpts {
                    headers: Some(self.device_headers()?),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                HttpError::Api {
                    status, message, ..
                } if status.is_client_error() && status.as_u16() != 429 => {
                    SocialError::Auth(message)
                }
                other => SocialError::Http(other),
            })?;

        let user = match resp.body.logged_in_user {
            Some(user) if resp.body.status == "ok" => user,
            _ => {
                return Err(SocialError::Auth(
                    resp.body
                        .message
                        .unwrap_or_else(|| "login response without user".into()),
                ))
            }
        };

        let authorization = resp
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_start_matches("Bearer ").trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SocialError::Auth("no session token in login response".into()))?;

        tracing::info!(username = %user.username, "Logged!");
        Ok(&*self.session.insert(Session {
            user_id: pk_to_string(&user.pk),
            username: user.username,
            authorization,
        }))
    }

    async fn fetch_sections(
        &self,
        session: &Session,
        hashtag: &str,
        rank_token: &str,
        cursor: Option<&PageCursor>,
    ) -> Result<SectionsResponse, SocialError> {
        let mut form: Vec<(&str, Cow<'_, str>)> = vec![
            ("supported_tabs", Cow::Borrowed(r#"["top","recent"]"#)),
            ("tab", Cow::Borrowed("top")),
            ("include_persistent", Cow::Borrowed("true")),
            ("rank_token", Cow::Borrowed(rank_token)),
            ("_uuid", Cow::Borrowed(self.device.uuid.as_str())),
        ];
        if let Some(cursor) = cursor {
            if let Some(max_id) = &cursor.max_id {
                form.push(("max_id", Cow::Borrowed(max_id.as_str())));
            }
            if let Some(page) = cursor.page {
                form.push(("page", Cow::Owned(page.to_string())));
            }
            if let Some(ids) = &cursor.next_media_ids {
                form.push(("next_media_ids", Cow::Borrowed(ids.as_str())));
            }
        }

        let path = format!("api/v1/tags/{hashtag}/sections/");
        let resp = self
            .http
            .post_form::<SectionsResponse>(
                &path,
                &form,
                RequestOpts {
                    headers: Some(self.device_headers()?),
                    auth: Some(Auth::Bearer(&session.authorization)),
                    ..Default::default()
                },
            )
            .await?;
        Ok(resp.body)
    }
}

fn normalize_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_string()
}

#[async_trait]
impl HashtagSource for InstagramClient {
    async fn top_posts(&self, hashtag: &str, amount: usize) -> Result<Vec<Post>, SocialError> {
        let session = self.session.as_ref().ok_or(SocialError::NotLoggedIn)?;
        let hashtag = normalize_hashtag(hashtag);
        let mut posts: Vec<Post> = Vec::new();
        if amount == 0 || hashtag.is_empty() {
            return Ok(posts);
        }

        let rank_token = Uuid::new_v4().to_string();
        let mut cursor: Option<PageCursor> = None;

        for page_no in 1..=MAX_PAGES {
            let page = self
                .fetch_sections(session, &hashtag, &rank_token, cursor.as_ref())
                .await?;
            let next = PageCursor::after(&page);
            let page_posts = page.into_posts();
            tracing::debug!(
                hashtag = %hashtag,
                page = page_no,
                received = page_posts.len(),
                "instagram.sections.page"
            );
            posts.extend(page_posts);

            if posts.len() >= amount {
                break;
            }
            match next {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        posts.truncate(amount);
        Ok(posts)
    }
}
