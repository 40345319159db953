use std::time::Duration;

use anyhow::Result;
use rusqlite::params;
use rusqlite::Connection;
use test_utils::attributed_body_fixture;
use tokio::sync::mpsc;

use super::applescript;
use super::latest_rowid;
use super::messages_since;
use super::output_within;
use super::IMessage;
use super::MessageRow;
use crate::domain::models::Event;
use crate::domain::models::Messenger;

const SCHEMA: &str = r#"
CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT);
CREATE TABLE chat (ROWID INTEGER PRIMARY KEY, chat_identifier TEXT, style INTEGER);
CREATE TABLE chat_message_join (chat_id INTEGER, message_id INTEGER);
CREATE TABLE message (
    ROWID INTEGER PRIMARY KEY,
    guid TEXT NOT NULL,
    text TEXT,
    attributedBody BLOB,
    handle_id INTEGER,
    is_from_me INTEGER DEFAULT 0
);
INSERT INTO handle (ROWID, id) VALUES (1, '+15550100'), (2, 'bob@example.com');
INSERT INTO chat (ROWID, chat_identifier, style) VALUES (1, '+15550100', 45), (2, 'chat900', 43);
"#;

fn insert(
    conn: &Connection,
    rowid: i64,
    text: Option<&str>,
    body: Option<Vec<u8>>,
    handle: i64,
    chat: i64,
    from_me: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO message (ROWID, guid, text, attributedBody, handle_id, is_from_me) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![rowid, format!("guid-{rowid}"), text, body, handle, from_me],
    )?;
    conn.execute(
        "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
        params![chat, rowid],
    )?;

    return Ok(());
}

fn fixture(dir: &tempfile::TempDir) -> Result<Connection> {
    let conn = Connection::open(dir.path().join("chat.db"))?;
    conn.execute_batch(SCHEMA)?;
    insert(&conn, 1, Some("old message"), None, 1, 1, false)?;
    insert(&conn, 2, Some("What is a pointer?"), None, 1, 1, false)?;
    insert(&conn, 3, Some("my own reply"), None, 1, 1, true)?;
    insert(&conn, 4, None, Some(attributed_body_fixture("use gemini")), 1, 1, false)?;
    insert(&conn, 5, Some("hello group"), None, 2, 2, false)?;

    return Ok(conn);
}

#[test]
fn it_reads_the_latest_rowid() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let conn = fixture(&dir)?;

    assert_eq!(latest_rowid(&conn)?, 5);

    return Ok(());
}

#[test]
fn it_reads_new_messages_from_others() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let conn = fixture(&dir)?;

    let rows = messages_since(&conn, 1)?;
    let rowids = rows.iter().map(|e| return e.rowid).collect::<Vec<i64>>();

    assert_eq!(rowids, vec![2, 4, 5]);
    assert_eq!(rows[0].sender, Some("+15550100".to_string()));
    assert_eq!(rows[2].chat_style, Some(43));

    return Ok(());
}

#[test]
fn it_reads_messages_linked_to_several_chats_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let conn = fixture(&dir)?;
    conn.execute(
        "INSERT INTO chat_message_join (chat_id, message_id) VALUES (2, 2)",
        [],
    )?;

    let rowids = messages_since(&conn, 1)?
        .iter()
        .map(|e| return e.rowid)
        .collect::<Vec<i64>>();

    assert_eq!(rowids, vec![2, 4, 5]);

    return Ok(());
}

#[test]
fn it_falls_back_to_attributed_body() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let conn = fixture(&dir)?;

    let rows = messages_since(&conn, 3)?;
    assert_eq!(rows[0].text(), "use gemini");

    return Ok(());
}

#[test]
fn it_classifies_group_messages() {
    let row = MessageRow {
        rowid: 5,
        guid: "guid-5".to_string(),
        text: Some(" hello group ".to_string()),
        sender: Some("bob@example.com".to_string()),
        chat_identifier: Some("chat900".to_string()),
        chat_style: Some(43),
        ..MessageRow::default()
    };

    match row.into_event() {
        Some(Event::GroupMessage(message)) => {
            assert_eq!(message.text, "hello group");
            assert_eq!(message.chat_id, Some("chat900".to_string()));
        }
        _ => panic!("Expected a group message"),
    }
}

#[test]
fn it_drops_messages_without_sender() {
    let row = MessageRow {
        rowid: 6,
        text: Some("system notice".to_string()),
        ..MessageRow::default()
    };

    assert!(row.into_event().is_none());
}

#[tokio::test]
async fn it_polls_until_the_receiver_hangs_up() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fixture(&dir)?;

    let messenger = IMessage::new(dir.path().join("chat.db"), 10);
    messenger.health_check().await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let worker = tokio::spawn(async move {
        return messenger.poll(&tx, 1).await;
    });

    let mut texts = vec![];
    for _ in 0..3 {
        match rx.recv().await {
            Some(Event::DirectMessage(message)) => texts.push(message.text),
            Some(Event::GroupMessage(message)) => texts.push(format!("group: {}", message.text)),
            _ => panic!("Wrong type from recv"),
        }
    }
    drop(rx);

    assert_eq!(
        texts,
        vec![
            "What is a pointer?".to_string(),
            "use gemini".to_string(),
            "group: hello group".to_string(),
        ]
    );
    assert!(worker.await?.is_ok());

    return Ok(());
}

#[tokio::test]
async fn it_fails_health_checks_without_database() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let messenger = IMessage::new(dir.path().join("missing.db"), 10);

    assert!(messenger.health_check().await.is_err());

    return Ok(());
}

#[test]
fn it_escapes_applescript() {
    let res = applescript(" +15550100 ", "Say \"hi\" to C:\\path\nthen go");

    insta::assert_snapshot!(res, @r###"
    tell application "Messages"
        set targetService to 1st account whose service type = iMessage
        set targetBuddy to participant "+15550100" of targetService
        send "Say \"hi\" to C:\\path
    then go" to targetBuddy
    end tell
    "###);
}

#[cfg(unix)]
#[tokio::test]
async fn it_kills_commands_that_outlive_the_timeout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("sent");

    let mut command = tokio::process::Command::new("sh");
    command
        .arg("-c")
        .arg(format!("sleep 1; touch '{}'", marker.display()));
    let res = output_within(command, Duration::from_millis(100)).await;
    assert!(res.unwrap_err().to_string().starts_with("Timed out"));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists());

    return Ok(());
}

#[cfg(unix)]
#[tokio::test]
async fn it_returns_output_of_commands_within_the_timeout() -> Result<()> {
    let mut command = tokio::process::Command::new("sh");
    command.arg("-c").arg("echo sent");
    let output = output_within(command, Duration::from_secs(5)).await?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "sent");

    return Ok(());
}
