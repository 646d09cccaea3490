//! Knowledge-server HTTP client.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};

use notesync_core::defaults::{RETURN_CODE_OK, TOKEN_HEADER};
use notesync_core::{
    AccountApi, CategoryNotesQuery, CreateCategoryRequest, CreateNoteRequest, CreateTagRequest,
    Credentials, DownloadOptions, Error, ImageUpload, ImageUploader, LoginResult, Note, NoteApi,
    NoteInfo, Resource, Result, Tag, TagNotesQuery, UpdateNoteRequest, UploadedImage,
};

use crate::config::WizClientConfig;
use crate::error::{envelope_error, status_error};
use crate::types::*;

#[derive(Debug, Default, Clone)]
struct Session {
    token: Option<String>,
    kb_server: Option<String>,
    account_url: Option<String>,
}

/// Client for the knowledge server's JSON API.
///
/// Holds the session established by [`AccountApi::login`]; every knowledge-base
/// call is sent to the session's `kb_server` with the session token.
pub struct WizClient {
    client: Client,
    config: WizClientConfig,
    session: RwLock<Session>,
}

impl WizClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WizClientConfig) -> Result<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "client",
            account_url = %config.account_url,
            timeout_secs = config.timeout_seconds,
            "Initializing knowledge-server client"
        );

        Ok(Self {
            client,
            config,
            session: RwLock::new(Session::default()),
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(WizClientConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(WizClientConfig::from_env())
    }

    pub fn config(&self) -> &WizClientConfig {
        &self.config
    }

    /// Install a session obtained elsewhere (e.g. a restored token).
    pub fn set_session(&self, token: impl Into<String>, kb_server: impl Into<String>) {
        if let Ok(mut s) = self.session.write() {
            s.token = Some(token.into());
            s.kb_server = Some(kb_server.into());
        }
    }

    pub fn clear_session(&self) {
        if let Ok(mut s) = self.session.write() {
            *s = Session::default();
        }
    }

    /// Current session token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.session.read().ok().and_then(|s| s.token.clone())
    }

    /// Knowledge server of the current session.
    pub fn kb_server(&self) -> Option<String> {
        self.session.read().ok().and_then(|s| s.kb_server.clone())
    }

    fn account_url(&self) -> String {
        self.session
            .read()
            .ok()
            .and_then(|s| s.account_url.clone())
            .unwrap_or_else(|| self.config.account_url.clone())
    }

    /// Build a request against `base`, attaching the token when present.
    fn build_request(&self, method: Method, base: &str, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", base.trim_end_matches('/'), endpoint);
        let mut req = self.client.request(method, &url);

        if let Some(token) = self.token() {
            req = req.header(TOKEN_HEADER, token);
        }

        req
    }

    /// Build a request against the session's knowledge server.
    fn kb_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let kb_server = self.kb_server().ok_or(Error::NotLoggedIn)?;
        Ok(self.build_request(method, &kb_server, endpoint))
    }

    /// Send a request and return the whole response body once both the HTTP
    /// status and the envelope's `returnCode` report success.
    async fn send_raw(&self, req: RequestBuilder) -> Result<JsonValue> {
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiEnvelope>(&text)
                .map(|e| e.return_message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!(subsystem = "client", status = status.as_u16(), error = %message, "Knowledge server returned error status");
            return Err(status_error(status.as_u16(), &message));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?;
        let envelope: ApiEnvelope = serde_json::from_value(body.clone())?;

        if envelope.return_code != RETURN_CODE_OK {
            warn!(
                subsystem = "client",
                return_code = envelope.return_code,
                error = %envelope.return_message,
                "Knowledge server rejected request"
            );
            return Err(envelope_error(
                envelope.return_code,
                &envelope.return_message,
                envelope.extern_code,
            ));
        }
        Ok(body)
    }

    /// Send a request and decode the envelope's `result`.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let mut body = self.send_raw(req).await?;
        let result = body
            .get_mut("result")
            .map(JsonValue::take)
            .unwrap_or(JsonValue::Null);
        Ok(serde_json::from_value(result)?)
    }

    /// Send a request whose result is ignored.
    async fn send_unit(&self, req: RequestBuilder) -> Result<()> {
        self.send_raw(req).await.map(|_| ())
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

#[async_trait]
impl AccountApi for WizClient {
    #[instrument(skip(self, credentials), fields(subsystem = "client", op = "login", user_id = %credentials.user_id))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        let account_url = credentials
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.config.account_url.clone());

        let body = LoginBody {
            user_id: &credentials.user_id,
            password: &credentials.password,
        };
        let req = self
            .client
            .post(format!("{}/as/user/login", account_url.trim_end_matches('/')))
            .json(&body);
        let result: LoginResult = self.send(req).await?;

        if let Ok(mut s) = self.session.write() {
            s.token = Some(result.token.clone());
            s.kb_server = Some(result.kb_server.clone());
            s.account_url = Some(account_url);
        }
        info!(subsystem = "client", kb_guid = %result.kb_guid, "Logged in");
        Ok(result)
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "logout"))]
    async fn logout(&self) -> Result<()> {
        if self.token().is_none() {
            return Ok(());
        }
        let req = self.build_request(Method::GET, &self.account_url(), "/as/user/logout");
        let outcome = self.send_unit(req).await;
        self.clear_session();
        outcome
    }
}

#[async_trait]
impl NoteApi for WizClient {
    #[instrument(skip(self, opts), fields(subsystem = "client", op = "download", kb_guid = %kb_guid, doc_guid = %doc_guid))]
    async fn get_note_content(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        opts: DownloadOptions,
    ) -> Result<Note> {
        let mut query = vec![("downloadInfo", flag(opts.download_info))];
        if opts.download_data {
            query.push(("downloadData", "1"));
        }
        let req = self
            .kb_request(
                Method::GET,
                &format!("/ks/note/download/{}/{}", kb_guid, doc_guid),
            )?
            .query(&query);
        let body: DownloadBody = serde_json::from_value(self.send_raw(req).await?)?;
        debug!(
            html_len = body.html.as_ref().map_or(0, String::len),
            resource_count = body.resources.len(),
            "Downloaded note"
        );
        Ok(Note {
            info: body.info,
            html: body.html.unwrap_or_default(),
            resources: body.resources,
        })
    }

    async fn create_note(&self, kb_guid: &str, req: &CreateNoteRequest) -> Result<NoteInfo> {
        let http = self
            .kb_request(Method::POST, &format!("/ks/note/create/{}", kb_guid))?
            .json(req);
        self.send(http).await
    }

    async fn update_note(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        req: &UpdateNoteRequest,
    ) -> Result<NoteInfo> {
        let http = self
            .kb_request(
                Method::PUT,
                &format!("/ks/note/save/{}/{}", kb_guid, doc_guid),
            )?
            .json(req);
        self.send(http).await
    }

    async fn update_note_info(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        info: &NoteInfo,
    ) -> Result<()> {
        let http = self
            .kb_request(
                Method::PUT,
                &format!("/ks/note/info/{}/{}", kb_guid, doc_guid),
            )?
            .json(info);
        self.send_unit(http).await
    }

    async fn delete_note(&self, kb_guid: &str, doc_guid: &str) -> Result<()> {
        let http = self.kb_request(
            Method::DELETE,
            &format!("/ks/note/delete/{}/{}", kb_guid, doc_guid),
        )?;
        self.send_unit(http).await
    }

    async fn get_category_notes(
        &self,
        kb_guid: &str,
        query: &CategoryNotesQuery,
    ) -> Result<Vec<NoteInfo>> {
        let http = self
            .kb_request(
                Method::GET,
                &format!("/ks/note/list/category/{}", kb_guid),
            )?
            .query(&[
                ("category", query.category.clone()),
                ("start", query.start.to_string()),
                ("count", query.count.to_string()),
                ("withAbstract", query.with_abstract.to_string()),
            ]);
        self.send(http).await
    }

    async fn get_categories(&self, kb_guid: &str) -> Result<Vec<String>> {
        let http = self.kb_request(Method::GET, &format!("/ks/category/all/{}", kb_guid))?;
        self.send(http).await
    }

    async fn get_all_tags(&self, kb_guid: &str) -> Result<Vec<Tag>> {
        let http = self.kb_request(Method::GET, &format!("/ks/tag/all/{}", kb_guid))?;
        self.send(http).await
    }

    async fn get_tag_notes(&self, kb_guid: &str, query: &TagNotesQuery) -> Result<Vec<NoteInfo>> {
        let http = self
            .kb_request(Method::GET, &format!("/ks/note/list/tag/{}", kb_guid))?
            .query(&[
                ("tag", query.tag.clone()),
                ("start", query.start.to_string()),
                ("count", query.count.to_string()),
                ("withAbstract", query.with_abstract.to_string()),
                ("orderBy", query.order_by.clone()),
            ]);
        self.send(http).await
    }

    async fn create_tag(&self, kb_guid: &str, req: &CreateTagRequest) -> Result<Tag> {
        let http = self
            .kb_request(Method::POST, &format!("/ks/tag/create/{}", kb_guid))?
            .json(req);
        self.send(http).await
    }

    async fn rename_tag(&self, kb_guid: &str, tag_guid: &str, name: &str) -> Result<()> {
        let http = self
            .kb_request(Method::PUT, &format!("/ks/tag/rename/{}", kb_guid))?
            .json(&RenameTagBody { tag_guid, name });
        self.send_unit(http).await
    }

    async fn move_tag(
        &self,
        kb_guid: &str,
        tag_guid: &str,
        parent_tag_guid: Option<&str>,
    ) -> Result<()> {
        let http = self
            .kb_request(Method::PUT, &format!("/ks/tag/move/{}", kb_guid))?
            .json(&MoveTagBody {
                tag_guid,
                parent_tag_guid,
            });
        self.send_unit(http).await
    }

    async fn delete_tag(&self, kb_guid: &str, tag_guid: &str) -> Result<()> {
        let http = self.kb_request(
            Method::DELETE,
            &format!("/ks/tag/delete/{}/{}", kb_guid, tag_guid),
        )?;
        self.send_unit(http).await
    }

    async fn create_category(&self, kb_guid: &str, req: &CreateCategoryRequest) -> Result<()> {
        let http = self
            .kb_request(Method::POST, &format!("/ks/category/create/{}", kb_guid))?
            .json(req);
        self.send_unit(http).await
    }

    async fn delete_category(&self, kb_guid: &str, category: &str) -> Result<()> {
        let http = self
            .kb_request(Method::DELETE, &format!("/ks/category/delete/{}", kb_guid))?
            .query(&[("category", category)]);
        self.send_unit(http).await
    }

    async fn search_notes(&self, kb_guid: &str, text: &str) -> Result<Vec<NoteInfo>> {
        let http = self
            .kb_request(Method::GET, &format!("/ks/note/search/{}", kb_guid))?
            .query(&[("ss", text)]);
        self.send(http).await
    }
}

#[async_trait]
impl ImageUploader for WizClient {
    #[instrument(skip(self, image), fields(subsystem = "client", op = "upload", kb_guid = %kb_guid, doc_guid = %doc_guid, size = image.bytes.len()))]
    async fn upload(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        image: &ImageUpload,
    ) -> Result<UploadedImage> {
        let part = multipart::Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        let form = multipart::Form::new()
            .text("kbGuid", kb_guid.to_string())
            .text("docGuid", doc_guid.to_string())
            .part("data", part);
        let http = self
            .kb_request(
                Method::POST,
                &format!("/ks/resource/upload/{}/{}", kb_guid, doc_guid),
            )?
            .multipart(form);
        let body: UploadBody = self.send(http).await?;
        let name = body.name.unwrap_or_else(|| image.file_name.clone());
        Ok(UploadedImage {
            resource: Some(Resource {
                name,
                url: Some(body.url.clone()),
                size: Some(image.bytes.len() as u64),
                data: None,
            }),
            url: body.url,
        })
    }
}
