use lifelog_core::{CoreConfig, Galaxy, GalaxyConnection, GalaxyError, GalaxyStore};
use std::fs;
use uuid::Uuid;

fn sample_galaxy(name: &str) -> Galaxy {
    let mut galaxy = Galaxy::new(name);
    let sun = galaxy.add_node("Sun", 0.0, 0.0).unwrap();
    let earth = galaxy.add_node("Earth", 10.0, 0.0).unwrap();
    let moon = galaxy.add_node("Moon", 12.0, 0.0).unwrap();
    galaxy.connect(sun, earth, None).unwrap();
    galaxy.connect(earth, moon, Some("orbit".to_string())).unwrap();
    galaxy
}

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = GalaxyStore::new(dir.path().join("galaxies.json"));

    assert!(store.load().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn store_from_config_uses_galaxy_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        galaxy_path: dir.path().join("boards.json"),
        ..CoreConfig::default()
    };
    let store = GalaxyStore::from_config(&config);

    store.upsert(&sample_galaxy("Ideas")).unwrap();

    assert_eq!(store.path(), config.galaxy_path.as_path());
    assert!(config.galaxy_path.exists());
    assert_eq!(GalaxyStore::new(&config.galaxy_path).load().unwrap().len(), 1);
}

#[test]
fn save_then_load_returns_the_same_boards() {
    let dir = tempfile::tempdir().unwrap();
    let store = GalaxyStore::new(dir.path().join("nested").join("galaxies.json"));
    let boards = vec![sample_galaxy("Ideas"), sample_galaxy("People")];

    store.save(&boards).unwrap();

    assert_eq!(store.load().unwrap(), boards);
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn upsert_replaces_by_id_and_remove_reports_existence() {
    let dir = tempfile::tempdir().unwrap();
    let store = GalaxyStore::new(dir.path().join("galaxies.json"));
    let mut board = sample_galaxy("Reading");
    store.upsert(&board).unwrap();
    store.upsert(&sample_galaxy("Music")).unwrap();

    board.name = "Reading list".to_string();
    store.upsert(&board).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].name, "Reading list");

    assert!(store.remove(board.id).unwrap());
    assert!(!store.remove(board.id).unwrap());
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn load_prunes_connections_to_missing_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let store = GalaxyStore::new(dir.path().join("galaxies.json"));
    let mut board = sample_galaxy("Broken");
    let ghost = Uuid::new_v4();
    board.connections.push(GalaxyConnection {
        id: Uuid::new_v4(),
        from: board.nodes[0].id,
        to: ghost,
        label: None,
    });
    store.save(&[board]).unwrap();

    let loaded = store.load().unwrap();

    assert_eq!(loaded[0].connections.len(), 2);
    assert!(loaded[0].connections.iter().all(|edge| !edge.touches(ghost)));
}

#[test]
fn removing_a_node_leaves_no_connection_to_it() {
    let mut board = sample_galaxy("Graph");
    let earth = board.nodes[1].id;

    board.remove_node(earth).unwrap();

    assert!(board.connections.iter().all(|edge| !edge.touches(earth)));
    assert!(board.connections.is_empty());
    assert!(matches!(
        board.remove_node(earth),
        Err(GalaxyError::UnknownNode(id)) if id == earth
    ));
}

#[test]
fn corrupt_document_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("galaxies.json");
    fs::write(&path, b"{ not json").unwrap();

    assert!(matches!(
        GalaxyStore::new(path).load(),
        Err(GalaxyError::Json(_))
    ));
}
