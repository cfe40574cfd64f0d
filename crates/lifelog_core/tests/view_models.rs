use chrono::{TimeZone, Utc};
use lifelog_core::clock::now_ms;
use lifelog_core::db::open_db_in_memory;
use lifelog_core::{
    AgeCipher, DashboardViewModel, JournalService, LoadState, MoodScale, MoodService,
    NewJournalEntry, NewTask, NoteService, NotesViewModel, Priority, Recurrence,
    SqliteJournalRepository, SqliteMoodRepository, SqliteNoteRepository, SqliteTaskRepository,
    TaskFilter, TaskService, TaskSort, TasksViewModel,
};
use rusqlite::Connection;

fn at(day: u32, hour: u32) -> i64 {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0)
        .unwrap()
        .timestamp_millis()
}

fn titles<'a>(tasks: impl IntoIterator<Item = &'a lifelog_core::Task>) -> Vec<&'a str> {
    tasks.into_iter().map(|task| task.title.as_str()).collect()
}

fn seed_tasks(conn: &Connection) {
    let service = TaskService::new(SqliteTaskRepository::try_new(conn).unwrap());
    let create = |title: &str, priority: Priority, due_at: Option<i64>| {
        let mut input = NewTask::titled(title);
        input.priority = priority;
        input.due_at = due_at;
        input.category = Some("home".to_string());
        service.create_task(input).unwrap()
    };
    create("water plants", Priority::Low, Some(at(9, 8)));
    create("call plumber", Priority::High, Some(at(10, 15)));
    create("plan holiday", Priority::Medium, Some(at(20, 9)));
    let done = create("buy milk", Priority::None, None);
    service.complete_task(done.id).unwrap();

    let mut work = NewTask::titled("send invoice");
    work.category = Some("work".to_string());
    work.notes = "client ACME".to_string();
    service.create_task(work).unwrap();
}

#[test]
fn notes_view_filters_by_search_and_tag() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let recipe = service.create_note("Pancakes", "flour, eggs, milk").unwrap();
    service
        .set_note_tags(recipe.id, vec!["Cooking".to_string()])
        .unwrap();
    service.create_note("Groceries", "milk and bread").unwrap();
    let secret = service.create_note("Diary", "milk confession").unwrap();
    service.encrypt_note(secret.id, &AgeCipher::generate()).unwrap();

    let mut view = NotesViewModel::new(SqliteNoteRepository::try_new(&conn).unwrap());
    assert_eq!(view.state(), &LoadState::Idle);
    view.load();
    assert_eq!(view.state(), &LoadState::Loaded);
    assert_eq!(view.note_count(), 3);
    assert_eq!(view.tags(), ["cooking"]);

    view.set_search_text("MILK");
    let mut found: Vec<_> = view.visible_notes().iter().map(|note| note.title.clone()).collect();
    found.sort();
    assert_eq!(found, ["Groceries", "Pancakes"]);

    view.set_search_text("diary");
    assert_eq!(view.visible_notes().len(), 1);

    view.set_search_text("");
    view.set_tag_filter(Some("  COOKING "));
    assert_eq!(view.visible_notes()[0].id, recipe.id);
    view.set_tag_filter(None);
    assert_eq!(view.visible_notes().len(), 3);
}

#[test]
fn notes_view_delete_updates_state() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service.create_note("Only", "one").unwrap();

    let mut view = NotesViewModel::new(SqliteNoteRepository::try_new(&conn).unwrap());
    view.load();
    assert!(view.delete(note.id));
    assert_eq!(view.state(), &LoadState::Empty);

    assert!(!view.delete(note.id));
    assert!(view.state().is_failed());
    assert_eq!(view.note_count(), 0);
}

#[test]
fn notes_view_reports_failure_with_empty_defaults() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    service.create_note("Kept", "body").unwrap();
    let mut view = NotesViewModel::new(SqliteNoteRepository::try_new(&conn).unwrap());

    conn.execute_batch("DROP TABLE note_tags;").unwrap();
    view.load();

    assert!(view.state().is_failed());
    assert!(view.notes().is_empty());
    assert!(view.tags().is_empty());
}

#[test]
fn tasks_view_applies_filters() {
    let conn = open_db_in_memory().unwrap();
    seed_tasks(&conn);
    let now = at(10, 12);

    let mut view = TasksViewModel::new(SqliteTaskRepository::try_new(&conn).unwrap());
    view.load();
    assert_eq!(view.state(), &LoadState::Loaded);
    assert_eq!(view.tasks().len(), 5);

    view.set_filter(TaskFilter::Active);
    assert_eq!(view.visible_tasks(now).len(), 4);

    view.set_filter(TaskFilter::Completed);
    assert_eq!(titles(view.visible_tasks(now)), ["buy milk"]);

    view.set_filter(TaskFilter::Overdue);
    assert_eq!(titles(view.visible_tasks(now)), ["water plants"]);

    view.set_filter(TaskFilter::DueToday);
    assert_eq!(titles(view.visible_tasks(now)), ["call plumber"]);

    view.set_filter(TaskFilter::All);
    view.set_category(Some("work"));
    assert_eq!(titles(view.visible_tasks(now)), ["send invoice"]);

    view.set_category(None);
    view.set_search_text("acme");
    assert_eq!(titles(view.visible_tasks(now)), ["send invoice"]);

    view.set_search_text("");
    view.set_category(Some("home"));
    view.set_filter(TaskFilter::Active);
    view.set_sort(TaskSort::DueDate);
    assert_eq!(
        titles(view.visible_tasks(now)),
        ["water plants", "call plumber", "plan holiday"]
    );
    view.set_sort(TaskSort::Priority);
    assert_eq!(
        titles(view.visible_tasks(now)),
        ["call plumber", "plan holiday", "water plants"]
    );

    assert_eq!(view.overdue_count(now), 1);
    assert_eq!(view.completion_rate(), 0.2);
    assert_eq!(view.categories(), ["home", "work"]);
}

#[test]
fn toggling_a_recurring_task_reloads_with_next_occurrence() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let mut input = NewTask::titled("stretch");
    input.due_at = Some(at(10, 7));
    input.recurrence = Some(Recurrence::Daily);
    let task = service.create_task(input).unwrap();

    let mut view = TasksViewModel::new(SqliteTaskRepository::try_new(&conn).unwrap());
    view.load();
    assert!(view.toggle_completion(task.id));

    assert_eq!(view.tasks().len(), 2);
    view.set_filter(TaskFilter::Active);
    let next = view.visible_tasks(at(10, 12));
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].due_at, Some(at(11, 7)));

    assert!(view.toggle_completion(task.id));
    view.set_filter(TaskFilter::Completed);
    assert!(view.visible_tasks(at(10, 12)).is_empty());
}

#[test]
fn tasks_view_falls_back_to_defaults_when_storage_fails() {
    let conn = open_db_in_memory().unwrap();
    seed_tasks(&conn);
    let mut view = TasksViewModel::new(SqliteTaskRepository::try_new(&conn).unwrap());

    conn.execute_batch("DROP TABLE tasks;").unwrap();
    view.load();

    assert!(view.state().is_failed());
    assert!(view.tasks().is_empty());
    assert_eq!(view.completion_rate(), 0.0);
    assert_eq!(view.overdue_count(now_ms()), 0);
    assert!(view.categories().is_empty());
    assert!(!view.delete(uuid::Uuid::new_v4()));
}

#[test]
fn dashboard_refresh_collects_every_figure() {
    let conn = open_db_in_memory().unwrap();
    NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap())
        .create_note("Hello", "world")
        .unwrap();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let done = tasks.create_task(NewTask::titled("one")).unwrap();
    tasks.create_task(NewTask::titled("two")).unwrap();
    tasks.complete_task(done.id).unwrap();
    JournalService::new(SqliteJournalRepository::try_new(&conn).unwrap())
        .write_entry(NewJournalEntry {
            content: "Quiet day".to_string(),
            mood_level: Some(6),
            ..NewJournalEntry::default()
        })
        .unwrap();
    MoodService::new(SqliteMoodRepository::try_new(&conn).unwrap())
        .log_mood(4, MoodScale::FivePoint, None, None)
        .unwrap();

    let mut view = DashboardViewModel::new(&conn);
    let snapshot = view.refresh(now_ms()).clone();

    assert_eq!(view.state(), &LoadState::Loaded);
    assert_eq!(snapshot.note_count, 1);
    assert_eq!(snapshot.tasks.total, 2);
    assert_eq!(snapshot.tasks.completed, 1);
    assert_eq!(snapshot.tasks.completion_rate, 0.5);
    assert_eq!(snapshot.journal_streak, 1);
    assert_eq!(snapshot.journal_mood_average_7d, Some(6.0));
    assert_eq!(snapshot.mood_average_7d, Some(0.75));
}

#[test]
fn dashboard_keeps_other_figures_when_one_source_fails() {
    let conn = open_db_in_memory().unwrap();
    TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap())
        .create_task(NewTask::titled("still counted"))
        .unwrap();
    conn.execute_batch("DROP TABLE journal_entries;").unwrap();

    let mut view = DashboardViewModel::new(&conn);
    let snapshot = view.refresh(now_ms()).clone();

    assert!(view.state().is_failed());
    assert_eq!(snapshot.tasks.total, 1);
    assert_eq!(snapshot.journal_streak, 0);
    assert_eq!(snapshot.journal_mood_average_7d, None);
    assert_eq!(snapshot.mood_average_7d, None);
}
