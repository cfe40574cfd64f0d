use lifelog_core::db::open_db_in_memory;
use lifelog_core::model::note::CIPHERTEXT_PREFIX;
use lifelog_core::{AgeCipher, NoteService, NoteServiceError, SqliteNoteRepository};
use rusqlite::{params, Connection};

const PLAINTEXT: &str = "I told nobody about the **surprise** party";

fn stored_row(conn: &Connection, id: &str) -> (String, Option<String>, i64) {
    conn.query_row(
        "SELECT content, preview_text, is_encrypted FROM notes WHERE id = ?1;",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .unwrap()
}

#[test]
fn encrypted_note_never_stores_plaintext() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let cipher = AgeCipher::generate();
    let note = service.create_note("diary", PLAINTEXT).unwrap();
    assert!(note.preview_text.is_some());

    let sealed = service.encrypt_note(note.id, &cipher).unwrap();
    assert!(sealed.is_encrypted);
    assert!(sealed.preview_text.is_none());

    let (content, preview, flag) = stored_row(&conn, &note.id.to_string());
    assert_eq!(flag, 1);
    assert_ne!(content, PLAINTEXT);
    assert!(content.starts_with(CIPHERTEXT_PREFIX));
    assert!(!content.contains("surprise"));
    assert!(preview.is_none());

    assert_eq!(service.reveal_content(note.id, &cipher).unwrap(), PLAINTEXT);
}

#[test]
fn plain_update_is_refused_but_title_edit_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let cipher = AgeCipher::generate();
    let note = service.create_note("diary", PLAINTEXT).unwrap();
    service.encrypt_note(note.id, &cipher).unwrap();

    let err = service
        .update_note(note.id, None, Some("leaked".to_string()))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::EncryptedNote(id) if id == note.id));

    let renamed = service
        .update_note(note.id, Some("private diary".to_string()), None)
        .unwrap();
    assert_eq!(renamed.title, "private diary");
    assert!(renamed.is_encrypted);
    assert!(renamed.preview_text.is_none());
}

#[test]
fn encrypted_content_can_be_replaced_and_decrypted() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let cipher = AgeCipher::generate();
    let note = service.create_note("diary", PLAINTEXT).unwrap();
    service.encrypt_note(note.id, &cipher).unwrap();

    service
        .update_encrypted_content(note.id, "second draft", &cipher)
        .unwrap();
    let (content, _, _) = stored_row(&conn, &note.id.to_string());
    assert!(!content.contains("second draft"));

    let opened = service.decrypt_note(note.id, &cipher).unwrap();
    assert!(!opened.is_encrypted);
    assert_eq!(opened.content, "second draft");
    assert_eq!(opened.preview_text.as_deref(), Some("second draft"));
}

#[test]
fn encryption_state_transitions_are_checked() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let cipher = AgeCipher::generate();
    let note = service.create_note("diary", PLAINTEXT).unwrap();

    assert!(matches!(
        service.decrypt_note(note.id, &cipher),
        Err(NoteServiceError::NotEncrypted(_))
    ));
    assert!(matches!(
        service.reveal_content(note.id, &cipher),
        Err(NoteServiceError::NotEncrypted(_))
    ));

    service.encrypt_note(note.id, &cipher).unwrap();
    assert!(matches!(
        service.encrypt_note(note.id, &cipher),
        Err(NoteServiceError::AlreadyEncrypted(_))
    ));

    let other = AgeCipher::generate();
    assert!(matches!(
        service.decrypt_note(note.id, &other),
        Err(NoteServiceError::Cipher(_))
    ));
}

#[test]
fn plaintext_under_encrypted_flag_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service.create_note("diary", PLAINTEXT).unwrap();
    conn.execute(
        "UPDATE notes SET is_encrypted = 1, preview_text = NULL WHERE id = ?1;",
        params![note.id.to_string()],
    )
    .unwrap();

    assert!(service.get_note(note.id).is_err());
}

#[test]
fn plaintext_with_envelope_marker_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service.create_note("diary", PLAINTEXT).unwrap();
    conn.execute(
        "UPDATE notes SET is_encrypted = 1, preview_text = NULL, content = ?2 WHERE id = ?1;",
        params![note.id.to_string(), format!("{CIPHERTEXT_PREFIX}{PLAINTEXT}")],
    )
    .unwrap();

    assert!(service.get_note(note.id).is_err());
}
