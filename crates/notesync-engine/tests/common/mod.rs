//! In-memory collaborators for engine integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notesync_core::{
    AccountApi, CacheKey, CategoryNotesQuery, CreateCategoryRequest, CreateNoteRequest,
    CreateTagRequest, Credentials, DownloadOptions, Error, EventEnvelope, ExportSink,
    ImageUpload, ImageUploader, LoginResult, MarkdownArtifact, Note, NoteApi, NoteCache,
    NoteInfo, Resource, Result, SettingsStore, SyncEvent, Tag, TagList, TagNotesQuery,
    UpdateNoteRequest, UploadedImage, UserProfile,
};
use notesync_engine::{Collaborators, NoteSync, SyncConfig, TagFailurePolicy};
use notesync_store::MemoryStore;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

pub const KB: &str = "kb1";

fn injected(op: &str) -> Error {
    Error::Http {
        status: 500,
        message: format!("injected failure in {}", op),
    }
}

/// Knowledge server backed by a map of notes, with a call log and
/// per-operation failure injection.
#[derive(Default)]
pub struct FakeNoteApi {
    notes: Mutex<BTreeMap<String, Note>>,
    tags: Mutex<Vec<Tag>>,
    categories: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    created: Mutex<Vec<CreateNoteRequest>>,
    saved: Mutex<Vec<UpdateNoteRequest>>,
    info_writes: Mutex<Vec<NoteInfo>>,
    next_id: Mutex<u32>,
}

impl FakeNoteApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, doc_guid: &str, title: &str, category: &str, html: &str) -> Note {
        let note = Note {
            info: NoteInfo {
                kb_guid: KB.to_string(),
                doc_guid: doc_guid.to_string(),
                title: title.to_string(),
                category: category.to_string(),
                ..Default::default()
            },
            html: html.to_string(),
            resources: Vec::new(),
        };
        self.notes
            .lock()
            .unwrap()
            .insert(doc_guid.to_string(), note.clone());
        note
    }

    pub fn set_note_tags(&self, doc_guid: &str, tags: Option<&str>) {
        if let Some(note) = self.notes.lock().unwrap().get_mut(doc_guid) {
            note.info.tags = tags.map(String::from);
        }
    }

    pub fn set_tags(&self, tags: &[(&str, &str)]) {
        *self.tags.lock().unwrap() = tags
            .iter()
            .map(|(guid, name)| Tag {
                tag_guid: guid.to_string(),
                name: name.to_string(),
                ..Default::default()
            })
            .collect();
    }

    pub fn set_categories(&self, categories: &[&str]) {
        *self.categories.lock().unwrap() = categories.iter().map(|c| c.to_string()).collect();
    }

    pub fn note(&self, doc_guid: &str) -> Option<Note> {
        self.notes.lock().unwrap().get(doc_guid).cloned()
    }

    pub fn fail(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    pub fn heal(&self, op: &str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn created(&self) -> Vec<CreateNoteRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<UpdateNoteRequest> {
        self.saved.lock().unwrap().clone()
    }

    pub fn info_writes(&self) -> Vec<NoteInfo> {
        self.info_writes.lock().unwrap().clone()
    }

    fn record(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.lock().unwrap().contains(op) {
            return Err(injected(op));
        }
        Ok(())
    }

    fn find(&self, doc_guid: &str) -> Result<Note> {
        self.note(doc_guid)
            .ok_or_else(|| Error::NotFound(format!("note {}", doc_guid)))
    }

    fn infos(&self, keep: impl Fn(&NoteInfo) -> bool) -> Vec<NoteInfo> {
        self.notes
            .lock()
            .unwrap()
            .values()
            .map(|n| n.info.clone())
            .filter(|i| keep(i))
            .collect()
    }
}

#[async_trait]
impl NoteApi for FakeNoteApi {
    async fn get_note_content(
        &self,
        _kb_guid: &str,
        doc_guid: &str,
        opts: DownloadOptions,
    ) -> Result<Note> {
        if opts.download_data {
            self.record("download_full")?;
            self.find(doc_guid)
        } else {
            self.record("download_info")?;
            let note = self.find(doc_guid)?;
            Ok(Note {
                info: note.info,
                ..Default::default()
            })
        }
    }

    async fn create_note(&self, kb_guid: &str, req: &CreateNoteRequest) -> Result<NoteInfo> {
        self.record("create_note")?;
        self.created.lock().unwrap().push(req.clone());
        let doc_guid = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("new{}", next)
        };
        let note = Note {
            info: NoteInfo {
                kb_guid: kb_guid.to_string(),
                doc_guid: doc_guid.clone(),
                title: req.title.clone(),
                category: req.category.clone(),
                note_type: req.note_type.clone(),
                owner: req.owner.clone(),
                ..Default::default()
            },
            html: req.html.clone(),
            resources: Vec::new(),
        };
        let info = note.info.clone();
        self.notes.lock().unwrap().insert(doc_guid, note);
        Ok(info)
    }

    async fn update_note(
        &self,
        _kb_guid: &str,
        doc_guid: &str,
        req: &UpdateNoteRequest,
    ) -> Result<NoteInfo> {
        self.record("update_note")?;
        self.saved.lock().unwrap().push(req.clone());
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .get_mut(doc_guid)
            .ok_or_else(|| Error::NotFound(format!("note {}", doc_guid)))?;
        note.info.title = req.title.clone();
        note.info.note_type = req.note_type.clone();
        note.info.data_modified = Some(note.info.data_modified.unwrap_or(0) + 1);
        note.html = req.html.clone();
        Ok(note.info.clone())
    }

    async fn update_note_info(&self, _kb_guid: &str, doc_guid: &str, info: &NoteInfo) -> Result<()> {
        self.record("update_note_info")?;
        self.info_writes.lock().unwrap().push(info.clone());
        if let Some(note) = self.notes.lock().unwrap().get_mut(doc_guid) {
            note.info = info.clone();
        }
        Ok(())
    }

    async fn delete_note(&self, _kb_guid: &str, doc_guid: &str) -> Result<()> {
        self.record("delete_note")?;
        self.notes.lock().unwrap().remove(doc_guid);
        Ok(())
    }

    async fn get_category_notes(
        &self,
        _kb_guid: &str,
        query: &CategoryNotesQuery,
    ) -> Result<Vec<NoteInfo>> {
        self.record("list_category")?;
        Ok(self.infos(|i| query.category.is_empty() || i.category == query.category))
    }

    async fn get_categories(&self, _kb_guid: &str) -> Result<Vec<String>> {
        self.record("get_categories")?;
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn get_all_tags(&self, _kb_guid: &str) -> Result<Vec<Tag>> {
        self.record("get_all_tags")?;
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn get_tag_notes(&self, _kb_guid: &str, query: &TagNotesQuery) -> Result<Vec<NoteInfo>> {
        self.record("list_tag")?;
        Ok(self.infos(|i| TagList::decode(i.tags.as_deref()).contains(&query.tag)))
    }

    async fn create_tag(&self, _kb_guid: &str, req: &CreateTagRequest) -> Result<Tag> {
        self.record("create_tag")?;
        let tag = Tag {
            tag_guid: format!("tag-{}", req.name),
            name: req.name.clone(),
            parent_tag_guid: req.parent_tag_guid.clone(),
            ..Default::default()
        };
        self.tags.lock().unwrap().push(tag.clone());
        Ok(tag)
    }

    async fn rename_tag(&self, _kb_guid: &str, tag_guid: &str, name: &str) -> Result<()> {
        self.record("rename_tag")?;
        for tag in self.tags.lock().unwrap().iter_mut() {
            if tag.tag_guid == tag_guid {
                tag.name = name.to_string();
            }
        }
        Ok(())
    }

    async fn move_tag(
        &self,
        _kb_guid: &str,
        tag_guid: &str,
        parent_tag_guid: Option<&str>,
    ) -> Result<()> {
        self.record("move_tag")?;
        for tag in self.tags.lock().unwrap().iter_mut() {
            if tag.tag_guid == tag_guid {
                tag.parent_tag_guid = parent_tag_guid.map(String::from);
            }
        }
        Ok(())
    }

    async fn delete_tag(&self, _kb_guid: &str, tag_guid: &str) -> Result<()> {
        self.record("delete_tag")?;
        self.tags.lock().unwrap().retain(|t| t.tag_guid != tag_guid);
        Ok(())
    }

    async fn create_category(&self, _kb_guid: &str, req: &CreateCategoryRequest) -> Result<()> {
        self.record("create_category")?;
        let path = notesync_core::category::child_path(
            if req.parent == "/" { "" } else { &req.parent },
            &req.child,
        );
        self.categories.lock().unwrap().push(path);
        Ok(())
    }

    async fn delete_category(&self, _kb_guid: &str, category: &str) -> Result<()> {
        self.record("delete_category")?;
        self.categories.lock().unwrap().retain(|c| c != category);
        Ok(())
    }

    async fn search_notes(&self, _kb_guid: &str, text: &str) -> Result<Vec<NoteInfo>> {
        self.record("search")?;
        Ok(self.infos(|i| i.title.contains(text)))
    }
}

/// Account server that accepts one password.
pub struct FakeAccountApi {
    pub password: String,
    logins: Mutex<Vec<Credentials>>,
}

impl FakeAccountApi {
    pub fn new(password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.to_string(),
            logins: Mutex::new(Vec::new()),
        })
    }

    pub fn logins(&self) -> Vec<Credentials> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        self.logins.lock().unwrap().push(credentials.clone());
        if credentials.password != self.password {
            return Err(Error::Unauthorized("invalid password".to_string()));
        }
        Ok(LoginResult {
            token: "token-1".to_string(),
            kb_guid: KB.to_string(),
            kb_server: "http://kb.test".to_string(),
            user: UserProfile {
                user_id: credentials.user_id.clone(),
                ..Default::default()
            },
        })
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }
}

/// Export sink that keeps what it was given.
#[derive(Default)]
pub struct RecordingSink {
    pub singles: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Vec<MarkdownArtifact>>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn singles(&self) -> Vec<String> {
        self.singles.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<MarkdownArtifact>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportSink for RecordingSink {
    async fn export_one(&self, content: String) -> Result<()> {
        self.singles.lock().unwrap().push(content);
        Ok(())
    }

    async fn export_many(&self, artifacts: Vec<MarkdownArtifact>) -> Result<()> {
        self.batches.lock().unwrap().push(artifacts);
        Ok(())
    }
}

/// Image host returning a fixed URL and resource record.
pub struct FakeUploader;

#[async_trait]
impl ImageUploader for FakeUploader {
    async fn upload(&self, kb_guid: &str, doc_guid: &str, image: &ImageUpload) -> Result<UploadedImage> {
        let url = format!("http://kb.test/ks/note/view/{}/{}/index_files/{}", kb_guid, doc_guid, image.file_name);
        Ok(UploadedImage {
            url: url.clone(),
            resource: Some(Resource {
                name: image.file_name.clone(),
                url: Some(url),
                size: Some(image.bytes.len() as u64),
                data: None,
            }),
        })
    }
}

/// Everything a test needs to drive and inspect an engine.
pub struct Harness {
    pub sync: NoteSync,
    pub api: Arc<FakeNoteApi>,
    pub account: Arc<FakeAccountApi>,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    /// Cached snapshot of a note in the test knowledge base.
    pub fn cached(&self, doc_guid: &str) -> Option<Note> {
        NoteCache::get(self.store.as_ref(), &CacheKey::new(KB, doc_guid)).unwrap()
    }

    pub fn setting(&self, key: &str) -> Option<JsonValue> {
        SettingsStore::get(self.store.as_ref(), key).unwrap()
    }
}

pub fn harness_with(policy: TagFailurePolicy) -> Harness {
    let api = FakeNoteApi::new();
    let account = FakeAccountApi::new("secret");
    let store = Arc::new(MemoryStore::new());
    let sink = RecordingSink::new();
    let config = SyncConfig {
        tag_failure_policy: policy,
        event_capacity: 64,
        ..Default::default()
    };
    let sync = NoteSync::new(
        Collaborators {
            api: api.clone(),
            account: account.clone(),
            cache: store.clone(),
            settings: store.clone(),
            sink: sink.clone(),
            uploader: Some(Arc::new(FakeUploader)),
        },
        config,
    )
    .unwrap();
    Harness {
        sync,
        api,
        account,
        store,
        sink,
    }
}

pub fn harness() -> Harness {
    harness_with(TagFailurePolicy::default())
}

pub fn credentials() -> Credentials {
    Credentials {
        user_id: "alice@example.com".to_string(),
        password: "secret".to_string(),
        url: None,
    }
}

/// Harness already logged in, with its call log cleared.
pub async fn logged_in() -> Harness {
    let h = harness();
    h.sync
        .login(&credentials(), Default::default())
        .await
        .unwrap();
    h.api.clear_calls();
    h
}

/// Events received so far, in emission order.
pub fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.payload);
    }
    events
}
