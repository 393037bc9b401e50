// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::EventDispatcher;
use crate::test_support::friend;

fn output(view: TerminalView<Vec<u8>>) -> String {
    String::from_utf8_lossy(&view.into_inner()).into_owned()
}

#[test]
fn formats_friend_presence() {
    assert_eq!(format_friend(&friend("alice", true)), "alice online");
    assert_eq!(format_friend(&friend("bob", false)), "bob offline");
}

#[test]
fn formats_message_with_sender() {
    let entry = TranscriptEntry { text: "hi".into(), from: Some("bob".into()) };
    assert_eq!(format_message(&entry), "bob: hi");
    let bare = TranscriptEntry { text: "hi".into(), from: None };
    assert_eq!(format_message(&bare), "hi");
}

#[test]
fn transcript_render_prints_only_new_lines() -> anyhow::Result<()> {
    let mut state = ChatState::new();
    let mut dispatcher = EventDispatcher::new();
    let mut view = TerminalView::new(Vec::new());

    let change = dispatcher
        .dispatch_raw(&mut state, r#"{"type":"message_sent","payload":{"text":"one"}}"#)?;
    view.render(change, &state);
    // Re-rendering the same state prints nothing new.
    view.render(change, &state);
    let change = dispatcher
        .dispatch_raw(&mut state, r#"{"type":"message_sent","payload":{"text":"two"}}"#)?;
    view.render(change, &state);

    assert_eq!(output(view), "one\ntwo\n");
    Ok(())
}

#[test]
fn roster_render_lists_everyone() -> anyhow::Result<()> {
    let mut state = ChatState::new();
    let change = EventDispatcher::new().dispatch_raw(
        &mut state,
        r#"{"type":"friends_fetched","payload":{"friends":[
            {"username":"alice","online":true},{"username":"bob","online":false}]}}"#,
    )?;
    let mut view = TerminalView::new(Vec::new());
    view.render(change, &state);

    assert_eq!(output(view), "-- friends (1 online) --\nalice online\nbob offline\n");
    Ok(())
}

#[test]
fn nothing_change_renders_nothing() {
    let mut view = TerminalView::new(Vec::new());
    view.render(Change::Nothing, &ChatState::new());
    assert_eq!(output(view), "");
}

#[yare::parameterized(
    with_reason = { "server shutting down", "connection closed: server shutting down\n" },
    no_reason = { "", "connection closed\n" },
)]
fn closed_shows_reason(reason: &str, expected: &str) {
    let mut view = TerminalView::new(Vec::new());
    view.closed(reason);
    assert_eq!(output(view), expected);
}

#[test]
fn greet_and_error_are_inline() {
    let mut view = TerminalView::new(Vec::new());
    view.greet("john");
    view.error("access token is required");
    assert_eq!(output(view), "Hi john\nerror: access token is required\n");
}
