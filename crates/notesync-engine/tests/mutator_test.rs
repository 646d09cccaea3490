//! Note mutation: creation, the Markdown save gate, category coercion,
//! copy titles, deletion and category writes.

mod common;

use common::{drain, logged_in, KB};
use notesync_core::defaults::settings::CURRENT_CATEGORY;
use notesync_core::{Error, ImageUpload, NoteType, SyncEvent};
use notesync_engine::{NewNote, SaveOutcome, SaveState, Selection};
use serde_json::json;

fn new_note(category: &str, title: &str) -> NewNote {
    NewNote {
        kb_guid: KB.to_string(),
        category: category.to_string(),
        title: title.to_string(),
        owner_id: Some("alice@example.com".to_string()),
    }
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn test_create_in_lite_category_uses_pre_envelope() {
    let h = logged_in().await;

    let note = h.sync.create_note(new_note("/Lite/", "Ideas")).await.unwrap();

    let req = &h.api.created()[0];
    assert_eq!(req.note_type, NoteType::LiteMarkdown);
    assert!(req.html.contains("<pre># Ideas</pre>"));
    assert_eq!(req.owner.as_deref(), Some("alice@example.com"));
    assert_eq!(h.sync.active_note(), Some(note.clone()));
    assert_eq!(h.store.note_count(), 1);
    assert!(h.sync.listing().iter().any(|i| i.doc_guid == note.info.doc_guid));
}

#[tokio::test]
async fn test_create_in_regular_category_is_document() {
    let h = logged_in().await;

    h.sync.create_note(new_note("/Work/", "Plan")).await.unwrap();

    let req = &h.api.created()[0];
    assert_eq!(req.note_type, NoteType::Document);
    assert!(req.html.contains("<div># Plan</div>"));
    assert!(!req.html.contains("<pre>"));
}

#[tokio::test]
async fn test_create_in_current_category_uses_stored_owner() {
    let h = logged_in().await;
    h.sync
        .select(Selection::Category("/Work/".to_string()))
        .await
        .unwrap();

    h.sync.create_note_in_current_category("Standup").await.unwrap();

    let req = &h.api.created()[0];
    assert_eq!(req.category, "/Work/");
    assert_eq!(req.owner.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_create_error_propagates_without_side_effects() {
    let h = logged_in().await;
    h.api.fail("create_note");

    let err = h.sync.create_note(new_note("/Work/", "Plan")).await.unwrap_err();

    assert!(matches!(err, Error::Http { status: 500, .. }));
    assert!(h.sync.active_note().is_none());
    assert_eq!(h.store.note_count(), 0);
}

// =============================================================================
// SAVE WORKFLOW
// =============================================================================

#[tokio::test]
async fn test_save_without_confirmation_never_reaches_server() {
    let h = logged_in().await;
    let note = h.api.insert("doc1", "Plan", "/Work/", "<p>old</p>");

    let pending = h.sync.begin_update(note, "# New");
    assert_eq!(pending.state(), SaveState::AwaitingConfirmation);

    let err = h.sync.commit_update(pending).await.unwrap_err();
    assert!(matches!(err, Error::ConfirmationRequired { ref title } if title == "Plan"));
    assert_eq!(h.api.count("update_note"), 0);
}

#[tokio::test]
async fn test_declined_conversion_is_abandoned() {
    let h = logged_in().await;
    let note = h.api.insert("doc1", "Plan", "/Work/", "<p>old</p>");

    let outcome = h.sync.update_note(note, "# New", |_| false).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Abandoned);
    assert_eq!(h.api.count("update_note"), 0);
    assert_eq!(h.api.note("doc1").unwrap().html, "<p>old</p>");
}

#[tokio::test]
async fn test_confirmed_conversion_appends_suffix_once() {
    let h = logged_in().await;
    let note = h.api.insert("doc1", "Plan", "/Work/", "<p>old</p>");
    let mut rx = h.sync.subscribe();

    let mut asked = 0;
    let outcome = h
        .sync
        .update_note(note, "# New\n\nbody", |pending| {
            asked += 1;
            pending.title() == "Plan"
        })
        .await
        .unwrap();

    assert_eq!(asked, 1);
    let saved = match outcome {
        SaveOutcome::Saved(note) => note,
        other => panic!("expected a save, got {:?}", other),
    };
    assert_eq!(h.api.saved()[0].title, "Plan.md");
    assert_eq!(saved.info.title, "Plan.md");
    assert_eq!(h.cached("doc1"), Some(saved.clone()));
    assert_eq!(h.sync.active_note(), Some(saved));
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, SyncEvent::NoteSaved { title, .. } if title == "Plan.md")));
}

#[tokio::test]
async fn test_markdown_titled_note_saves_without_asking() {
    let h = logged_in().await;
    let note = h.api.insert("doc1", "Plan.md", "/Lite/", "<pre>old</pre>");

    let outcome = h
        .sync
        .update_note(note, "new <body>", |_| panic!("should not ask"))
        .await
        .unwrap();

    assert!(matches!(outcome, SaveOutcome::Saved(_)));
    let req = &h.api.saved()[0];
    assert_eq!(req.title, "Plan.md");
    assert_eq!(req.note_type, NoteType::LiteMarkdown);
    assert!(req.html.contains("<pre>new &lt;body&gt;</pre>"));
}

#[tokio::test]
async fn test_save_active_note_requires_one() {
    let h = logged_in().await;

    let err = h.sync.save_active_note("x", |_| true).await.unwrap_err();

    assert!(matches!(err, Error::NoActiveNote));
}

// =============================================================================
// DELETE / MOVE / COPY / INFO
// =============================================================================

#[tokio::test]
async fn test_delete_clears_active_note_but_keeps_cache() {
    let h = logged_in().await;
    h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>");
    h.sync.open_note("doc1").await.unwrap();
    let mut rx = h.sync.subscribe();

    h.sync.delete_note(KB, "doc1").await.unwrap();

    assert!(h.sync.active_note().is_none());
    assert!(h.cached("doc1").is_some());
    assert!(h.sync.listing().iter().all(|i| i.doc_guid != "doc1"));
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, SyncEvent::ActiveNoteCleared)));
}

#[tokio::test]
async fn test_delete_other_note_keeps_active_note() {
    let h = logged_in().await;
    h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>");
    h.api.insert("doc2", "Other.md", "/Work/", "<pre>y</pre>");
    h.sync.open_note("doc1").await.unwrap();

    h.sync.delete_note(KB, "doc2").await.unwrap();

    assert_eq!(h.sync.active_note().unwrap().info.doc_guid, "doc1");
}

#[tokio::test]
async fn test_move_to_lite_coerces_type() {
    let h = logged_in().await;
    let mut info = h.api.insert("doc1", "Plan", "/Work/", "<p>x</p>").info;
    info.category = "/Lite/".to_string();
    info.note_type = NoteType::Document;

    h.sync.move_note(info).await.unwrap();

    let written = &h.api.info_writes()[0];
    assert_eq!(written.category, "/Lite/");
    assert_eq!(written.note_type, NoteType::LiteMarkdown);
    assert_eq!(h.api.count("list_category"), 1);
}

#[tokio::test]
async fn test_move_elsewhere_keeps_type() {
    let h = logged_in().await;
    let mut info = h.api.insert("doc1", "Plan", "/Lite/", "<p>x</p>").info;
    info.category = "/Archive/".to_string();
    info.note_type = NoteType::Document;

    h.sync.move_note(info).await.unwrap();

    assert_eq!(h.api.info_writes()[0].note_type, NoteType::Document);
}

#[tokio::test]
async fn test_copy_within_category_marks_title_before_suffix() {
    let h = logged_in().await;
    let info = h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>").info;
    h.sync.open_note("doc1").await.unwrap();
    h.api.clear_calls();

    let created = h.sync.copy_note(info).await.unwrap();

    assert_eq!(created.title, "Plan-duplicate.md");
    // The source body is downloaded even though it is cached.
    assert_eq!(h.api.count("download_full"), 1);
    assert_eq!(h.api.count("download_info"), 0);
    assert_eq!(h.api.created()[0].html, "<pre>x</pre>");
    assert_eq!(h.api.count("list_category"), 1);
}

#[tokio::test]
async fn test_copy_to_other_category_keeps_title() {
    let h = logged_in().await;
    h.sync
        .select(Selection::Category("/Work/".to_string()))
        .await
        .unwrap();
    let mut info = h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>").info;
    info.category = "/Archive/".to_string();
    h.api.clear_calls();

    let created = h.sync.copy_note(info).await.unwrap();

    assert_eq!(created.title, "Plan.md");
    assert_eq!(created.category, "/Archive/");
    assert_eq!(h.api.count("list_category"), 0);
}

#[tokio::test]
async fn test_copy_to_lite_coerces_type() {
    let h = logged_in().await;
    let mut info = h.api.insert("doc1", "Plan", "/Work/", "<p>x</p>").info;
    info.category = "/Lite/".to_string();

    let created = h.sync.copy_note(info).await.unwrap();

    assert_eq!(created.note_type, NoteType::LiteMarkdown);
    assert_eq!(created.title, "Plan");
}

#[tokio::test]
async fn test_update_note_info_does_not_touch_cache() {
    let h = logged_in().await;
    h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>");
    let cached = h.sync.open_note("doc1").await.unwrap();
    let mut info = cached.info.clone();
    info.title = "Renamed.md".to_string();

    h.sync.update_note_info(&info).await.unwrap();

    assert_eq!(h.api.note("doc1").unwrap().info.title, "Renamed.md");
    assert_eq!(h.cached("doc1"), Some(cached));
    assert_eq!(h.api.count("list_category"), 1);
}

// =============================================================================
// CATEGORIES / IMAGES
// =============================================================================

#[tokio::test]
async fn test_create_category_under_current_and_select_it() {
    let h = logged_in().await;
    h.sync
        .select(Selection::Category("/Work/".to_string()))
        .await
        .unwrap();

    let path = h.sync.create_category("2024").await.unwrap();

    assert_eq!(path, "/Work/2024/");
    assert_eq!(h.sync.current_category(), "/Work/2024/");
    assert!(h.sync.categories().contains(&"/Work/2024/".to_string()));
    assert_eq!(h.setting(CURRENT_CATEGORY), Some(json!("/Work/2024/")));
}

#[tokio::test]
async fn test_create_category_at_root() {
    let h = logged_in().await;

    let path = h.sync.create_category("Work").await.unwrap();

    assert_eq!(path, "/Work/");
}

#[tokio::test]
async fn test_delete_category_selects_all_notes() {
    let h = logged_in().await;
    h.api.set_categories(&["/Work/"]);
    h.sync
        .select(Selection::Category("/Work/".to_string()))
        .await
        .unwrap();

    h.sync.delete_category("/Work/").await.unwrap();

    assert_eq!(h.sync.current_category(), "");
    assert!(h.sync.categories().is_empty());
}

#[tokio::test]
async fn test_upload_image_adds_resource_to_active_note() {
    let h = logged_in().await;
    h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>");
    h.sync.open_note("doc1").await.unwrap();
    let mut rx = h.sync.subscribe();

    let uploaded = h
        .sync
        .upload_image(ImageUpload {
            file_name: "shot.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
        .await
        .unwrap();

    assert!(uploaded.url.ends_with("/index_files/shot.png"));
    let resources = h.sync.active_note().unwrap().resources;
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].name, "shot.png");
    let events = drain(&mut rx);
    assert!(matches!(&events[0], SyncEvent::ResourceInserted { url } if *url == uploaded.url));
}
