use lifelog_core::db::open_db_in_memory;
use lifelog_core::{
    MindMapRepository, MindMapService, MindMapServiceError, NodeRepository, Repository,
    SqliteMindMapRepository, SqliteNodeRepository,
};
use rusqlite::Connection;

type Service<'conn> = MindMapService<SqliteMindMapRepository<'conn>, SqliteNodeRepository<'conn>>;

fn service(conn: &Connection) -> Service<'_> {
    MindMapService::new(
        SqliteMindMapRepository::try_new(conn).unwrap(),
        SqliteNodeRepository::try_new(conn).unwrap(),
    )
}

fn node_rows(conn: &Connection, map_id: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM mind_map_nodes WHERE mind_map_id = ?1;",
        [map_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn create_map_adds_root_node() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Trip planning").unwrap();

    assert_eq!(root.mind_map_id, map.id);
    assert_eq!(root.parent_id, None);
    assert_eq!(root.title, "Trip planning");
    assert_eq!(service.node_depth(root.id).unwrap(), 0);
    assert_eq!(service.list_maps().unwrap()[0].id, map.id);
}

#[test]
fn deleting_a_map_deletes_every_node() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Garden").unwrap();
    let (other, _) = service.create_map("Kitchen").unwrap();
    let beds = service.add_node(map.id, Some(root.id), "Beds").unwrap();
    service.add_node(map.id, Some(beds.id), "Tomatoes").unwrap();
    service.add_node(map.id, None, "Loose idea").unwrap();
    assert_eq!(node_rows(&conn, &map.id.to_string()), 4);

    let removed = service.delete_map(map.id).unwrap();

    assert_eq!(removed, 4);
    assert_eq!(node_rows(&conn, &map.id.to_string()), 0);
    assert_eq!(node_rows(&conn, &other.id.to_string()), 1);
    assert!(matches!(
        service.delete_map(map.id),
        Err(MindMapServiceError::MapNotFound(id)) if id == map.id
    ));
}

#[test]
fn node_queries_cover_children_roots_and_depth() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Book").unwrap();
    let chapter = service.add_node(map.id, Some(root.id), "Chapter").unwrap();
    let scene = service.add_node(map.id, Some(chapter.id), "Scene").unwrap();
    let aside = service.add_node(map.id, None, "Aside").unwrap();

    let nodes = SqliteNodeRepository::try_new(&conn).unwrap();
    assert_eq!(nodes.children(root.id).unwrap()[0].id, chapter.id);
    let roots: Vec<_> = nodes
        .roots(map.id)
        .unwrap()
        .into_iter()
        .map(|node| node.id)
        .collect();
    assert!(roots.contains(&root.id) && roots.contains(&aside.id));
    assert_eq!(roots.len(), 2);
    assert_eq!(nodes.nodes_in_map(map.id).unwrap().len(), 4);

    assert_eq!(service.node_depth(scene.id).unwrap(), 2);
    let subtree: Vec<_> = service
        .subtree(root.id)
        .unwrap()
        .into_iter()
        .map(|node| node.title)
        .collect();
    assert_eq!(subtree, ["Book", "Chapter", "Scene"]);
}

#[test]
fn move_rejects_cycles_and_cross_map_parents() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Work").unwrap();
    let child = service.add_node(map.id, Some(root.id), "Child").unwrap();
    let grandchild = service.add_node(map.id, Some(child.id), "Grandchild").unwrap();
    let (_, foreign_root) = service.create_map("Home").unwrap();

    assert!(matches!(
        service.move_node(root.id, Some(grandchild.id)),
        Err(MindMapServiceError::CycleDetected { .. })
    ));
    assert!(matches!(
        service.move_node(child.id, Some(child.id)),
        Err(MindMapServiceError::CycleDetected { .. })
    ));
    assert!(matches!(
        service.move_node(child.id, Some(foreign_root.id)),
        Err(MindMapServiceError::CrossMapParent { .. })
    ));
    assert!(matches!(
        service.add_node(map.id, Some(foreign_root.id), "stray"),
        Err(MindMapServiceError::CrossMapParent { .. })
    ));

    let moved = service.move_node(grandchild.id, Some(root.id)).unwrap();
    assert_eq!(moved.parent_id, Some(root.id));
    assert_eq!(service.node_depth(grandchild.id).unwrap(), 1);

    let detached = service.move_node(child.id, None).unwrap();
    assert_eq!(detached.parent_id, None);
}

#[test]
fn deleting_a_node_removes_its_subtree() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Tree").unwrap();
    let branch = service.add_node(map.id, Some(root.id), "Branch").unwrap();
    service.add_node(map.id, Some(branch.id), "Leaf").unwrap();

    service.delete_node(branch.id).unwrap();

    assert_eq!(service.node_count(map.id).unwrap(), 1);
    assert!(matches!(
        service.delete_node(branch.id),
        Err(MindMapServiceError::NodeNotFound(_))
    ));
}

#[test]
fn reposition_and_rename_nodes() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let (map, root) = service.create_map("Canvas").unwrap();
    let moved = service.reposition_node(root.id, 120.5, -40.0).unwrap();
    assert_eq!((moved.x, moved.y), (120.5, -40.0));

    assert!(service.reposition_node(root.id, f64::NAN, 0.0).is_err());

    let renamed = service.rename_node(root.id, "  Center ").unwrap();
    assert_eq!(renamed.title, "Center");
    assert!(service.rename_node(root.id, "   ").is_err());

    let maps = SqliteMindMapRepository::try_new(&conn).unwrap();
    assert_eq!(maps.node_count(map.id).unwrap(), 1);
    assert_eq!(
        maps.fetch_by_id(map.id).unwrap().unwrap().title,
        "Canvas"
    );
}
