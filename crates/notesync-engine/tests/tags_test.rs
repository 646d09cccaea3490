//! Tag membership of the active note and tag tree maintenance.

mod common;

use common::{credentials, drain, harness_with, logged_in, Harness};
use notesync_core::{Error, SyncEvent, TagList};
use notesync_engine::{Selection, TagFailurePolicy, TagSyncState};

async fn with_open_note(h: &Harness, tags: Option<&str>) {
    h.api.insert("doc1", "Plan.md", "/Work/", "<pre>x</pre>");
    h.api.set_note_tags("doc1", tags);
    h.sync.open_note("doc1").await.unwrap();
    h.api.clear_calls();
}

fn active_tags(h: &Harness) -> Option<String> {
    h.sync.active_note().and_then(|n| n.info.tags)
}

#[tokio::test]
async fn test_attach_to_untagged_note() {
    let h = logged_in().await;
    h.api.set_tags(&[("t1", "work")]);
    with_open_note(&h, None).await;
    let mut rx = h.sync.subscribe();

    let update = h.sync.attach_tag("t1").await.unwrap();

    assert_eq!(update.state, TagSyncState::Confirmed);
    assert_eq!(update.tags.encode(), "t1");
    assert_eq!(active_tags(&h).as_deref(), Some("t1"));
    assert_eq!(h.api.info_writes().last().unwrap().tags.as_deref(), Some("t1"));
    assert_eq!(h.api.count("get_all_tags"), 1);
    assert!(matches!(
        &drain(&mut rx)[0],
        SyncEvent::ActiveNoteTagsChanged { tags } if tags == "t1"
    ));
}

#[tokio::test]
async fn test_attach_twice_keeps_duplicates_and_remove_filters_all() {
    let h = logged_in().await;
    with_open_note(&h, Some("t2")).await;

    h.sync.attach_tag("t1").await.unwrap();
    h.sync.attach_tag("t1").await.unwrap();
    assert_eq!(active_tags(&h).as_deref(), Some("t2*t1*t1"));

    let update = h.sync.remove_tag("t1").await.unwrap();
    assert_eq!(update.tags, TagList::decode(Some("t2")));
    assert_eq!(active_tags(&h).as_deref(), Some("t2"));
}

#[tokio::test]
async fn test_remove_absent_tag_is_noop_on_value() {
    let h = logged_in().await;
    with_open_note(&h, Some("t1*t2")).await;

    let update = h.sync.remove_tag("t9").await.unwrap();

    assert_eq!(update.tags.encode(), "t1*t2");
    assert_eq!(active_tags(&h).as_deref(), Some("t1*t2"));
}

#[tokio::test]
async fn test_remove_last_tag_leaves_empty_string() {
    let h = logged_in().await;
    with_open_note(&h, Some("t1")).await;

    let update = h.sync.remove_tag("t1").await.unwrap();

    assert!(update.tags.is_empty());
    assert_eq!(active_tags(&h).as_deref(), Some(""));
}

#[tokio::test]
async fn test_tag_change_requires_active_note() {
    let h = logged_in().await;

    let err = h.sync.attach_tag("t1").await.unwrap_err();

    assert!(matches!(err, Error::NoActiveNote));
    assert_eq!(h.api.count("update_note_info"), 0);
}

#[tokio::test]
async fn test_invalid_tag_guid_is_rejected_before_any_write() {
    let h = logged_in().await;
    with_open_note(&h, None).await;

    assert!(h.sync.attach_tag("a*b").await.is_err());
    assert_eq!(h.api.count("update_note_info"), 0);
    assert_eq!(active_tags(&h), None);
}

#[tokio::test]
async fn test_rejected_change_is_kept_by_default() {
    let h = logged_in().await;
    with_open_note(&h, None).await;
    h.api.fail("update_note_info");

    let update = h.sync.attach_tag("t1").await.unwrap();

    match update.state {
        TagSyncState::Unconfirmed { error } => assert_eq!(error.network_status, Some(500)),
        other => panic!("expected unconfirmed, got {:?}", other),
    }
    assert_eq!(active_tags(&h).as_deref(), Some("t1"));
    // The tag list is still refreshed.
    assert_eq!(h.api.count("get_all_tags"), 1);
}

#[tokio::test]
async fn test_rejected_change_rolls_back_under_rollback_policy() {
    let h = harness_with(TagFailurePolicy::Rollback);
    h.sync
        .login(&credentials(), Default::default())
        .await
        .unwrap();
    with_open_note(&h, Some("t2")).await;
    h.api.fail("update_note_info");
    let mut rx = h.sync.subscribe();

    let update = h.sync.attach_tag("t1").await.unwrap();

    assert!(matches!(update.state, TagSyncState::RolledBack { .. }));
    assert_eq!(update.tags.encode(), "t2");
    assert_eq!(active_tags(&h).as_deref(), Some("t2"));
    let tag_events: Vec<String> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::ActiveNoteTagsChanged { tags } => Some(tags),
            _ => None,
        })
        .collect();
    assert_eq!(tag_events, vec!["t2*t1", "t2"]);
}

#[tokio::test]
async fn test_tag_refresh_failure_is_not_an_error() {
    let h = logged_in().await;
    with_open_note(&h, None).await;
    h.api.fail("get_all_tags");

    let update = h.sync.attach_tag("t1").await.unwrap();

    assert_eq!(update.state, TagSyncState::Confirmed);
}

#[tokio::test]
async fn test_tag_tree_operations_refresh_tags() {
    let h = logged_in().await;

    let parent = h.sync.create_tag("work", None).await.unwrap();
    let child = h
        .sync
        .create_tag("meetings", Some(&parent.tag_guid))
        .await
        .unwrap();
    assert_eq!(h.sync.tags().len(), 2);
    let forest = h.sync.tag_forest();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].children[0].tag.tag_guid, child.tag_guid);

    h.sync.rename_tag(&child.tag_guid, "standups").await.unwrap();
    h.sync.move_tag(&child.tag_guid, None).await.unwrap();
    assert_eq!(h.sync.tag_forest().len(), 2);
    assert!(h.sync.tags().iter().any(|t| t.name == "standups"));

    h.sync.delete_tag(&parent.tag_guid).await.unwrap();
    assert_eq!(h.sync.tags().len(), 1);
    assert_eq!(h.api.count("get_all_tags"), 5);
}

#[tokio::test]
async fn test_tag_selection_lists_by_tag() {
    let h = logged_in().await;
    h.api.set_tags(&[("t1", "work")]);
    h.sync.refresh_tags().await.unwrap();
    with_open_note(&h, None).await;
    h.sync.attach_tag("t1").await.unwrap();
    h.api.clear_calls();

    let notes = h.sync.select(Selection::Tag("t1".to_string())).await.unwrap();

    assert_eq!(h.api.calls(), vec!["list_tag"]);
    assert_eq!(notes.len(), 1);
    assert_eq!(h.sync.current_category(), "t1");
    assert_eq!(h.sync.snapshot().selection(), Selection::Tag("t1".to_string()));
}
