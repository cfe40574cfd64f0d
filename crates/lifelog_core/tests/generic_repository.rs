use lifelog_core::db::open_db_in_memory;
use lifelog_core::{
    FetchOptions, Filter, RepoError, Repository, Sort, SqliteRepository, Task, ValidationError,
};

fn task(title: &str, created_at: i64) -> Task {
    let mut task = Task::new(title);
    task.created_at = created_at;
    task.updated_at = created_at;
    task
}

#[test]
fn save_inserts_then_updates_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();

    let mut draft = Task::new("draft");
    repo.save(&draft).unwrap();
    draft.rename("final");
    repo.save(&draft).unwrap();

    assert_eq!(repo.count(&Filter::all()).unwrap(), 1);
    let loaded = repo.fetch_by_id(draft.id).unwrap().expect("saved task");
    assert_eq!(loaded.title, "final");
    assert_eq!(loaded, draft);
}

#[test]
fn fetch_all_uses_default_sort_and_id_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    let older = task("older", 1_000);
    let newer = task("newer", 2_000);
    let twin_a = task("twin", 1_500);
    let twin_b = task("twin", 1_500);
    for item in [&older, &newer, &twin_a, &twin_b] {
        repo.save(item).unwrap();
    }

    let titles: Vec<_> = repo
        .fetch_all()
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, ["newer", "twin", "twin", "older"]);

    let twins = repo
        .fetch(&Filter::all().eq("title", "twin".to_string()), &FetchOptions::default())
        .unwrap();
    let mut expected = [twin_a.id, twin_b.id];
    expected.sort();
    assert_eq!([twins[0].id, twins[1].id], expected);
}

#[test]
fn explicit_id_sort_direction_is_honored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    let mut ids = Vec::new();
    for index in 0..4 {
        let item = task("same", 1_000 + index);
        repo.save(&item).unwrap();
        ids.push(item.id);
    }
    ids.sort();
    ids.reverse();

    let loaded: Vec<_> = repo
        .fetch(&Filter::all(), &FetchOptions::sorted_by(Sort::desc("id")))
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(loaded, ids);
}

#[test]
fn fetch_applies_filter_sort_limit_and_offset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    for (index, title) in ["a", "b", "c", "d"].into_iter().enumerate() {
        repo.save(&task(title, index as i64)).unwrap();
    }

    let page = repo
        .fetch(
            &Filter::all().gte("created_at", 1_i64),
            &FetchOptions::sorted_by(Sort::asc("created_at"))
                .limit(2)
                .offset(1),
        )
        .unwrap();
    let titles: Vec<_> = page.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, ["c", "d"]);
}

#[test]
fn contains_filter_escapes_like_wildcards() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    repo.save(&task("100% done", 1)).unwrap();
    repo.save(&task("1000 things", 2)).unwrap();

    let matches = repo
        .fetch(&Filter::all().contains("title", "0%"), &FetchOptions::default())
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].title, "100% done");

    let upper = repo
        .count(&Filter::all().contains("title", "DONE"))
        .unwrap();
    assert_eq!(upper, 1);
}

#[test]
fn save_validates_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    let mut broken = Task::new("broken");
    broken.completed_at = Some(5);

    let err = repo.save(&broken).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::CompletionMismatch { .. })
    ));
    assert_eq!(repo.count(&Filter::all()).unwrap(), 0);
}

#[test]
fn delete_is_hard_and_reports_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    let item = Task::new("gone soon");
    repo.save(&item).unwrap();

    repo.delete(item.id).unwrap();
    assert!(repo.fetch_by_id(item.id).unwrap().is_none());
    let raw_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(raw_rows, 0);

    assert!(matches!(repo.delete(item.id), Err(RepoError::NotFound(id)) if id == item.id));
}

#[test]
fn invalid_persisted_rows_fail_to_load() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Task>::try_new(&conn).unwrap();
    let item = Task::new("tampered");
    repo.save(&item).unwrap();
    conn.execute(
        "UPDATE tasks SET completed_at = 42 WHERE id = ?1;",
        [item.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        repo.fetch_by_id(item.id),
        Err(RepoError::Validation(_))
    ));
}
