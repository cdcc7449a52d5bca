//! Tests for tile keys

use super::*;

#[test]
fn test_new_validates_level() {
    assert!(TileKey::new(MAX_LEVEL, 0, 0).is_ok());
    assert_eq!(
        TileKey::new(MAX_LEVEL + 1, 0, 0),
        Err(CoordError::InvalidLevel(MAX_LEVEL + 1))
    );
}

#[test]
fn test_new_validates_range() {
    assert!(TileKey::new(2, 3, 3).is_ok());
    assert!(matches!(
        TileKey::new(2, 4, 0),
        Err(CoordError::OutOfRange { level: 2, x: 4, y: 0 })
    ));
    assert!(TileKey::new(0, 0, 1).is_err());
}

#[test]
fn test_parent_of_root_is_none() {
    assert_eq!(TileKey::root().parent(), None);
}

#[test]
fn test_parent_halves_coordinates() {
    let key = TileKey::new(5, 13, 22).unwrap();
    assert_eq!(key.parent(), Some(TileKey::new(4, 6, 11).unwrap()));
}

#[test]
fn test_children_round_trip_to_parent() {
    let key = TileKey::new(3, 5, 2).unwrap();
    let children = key.children();
    assert_eq!(children[0], TileKey::new(4, 10, 4).unwrap());
    assert_eq!(children[3], TileKey::new(4, 11, 5).unwrap());
    for child in children {
        assert_eq!(child.parent(), Some(key));
        assert!(key.contains(&child));
    }
}

#[test]
fn test_contains_rejects_siblings_and_ancestors() {
    let key = TileKey::new(3, 5, 2).unwrap();
    let sibling = TileKey::new(3, 4, 2).unwrap();
    assert!(!key.contains(&sibling));
    assert!(!key.contains(&key.parent().unwrap()));
    assert!(key.contains(&key));
}

#[test]
fn test_quadkey_matches_bing_reference() {
    // Reference value from the Bing Maps tile system documentation
    let key = TileKey::new(3, 3, 5).unwrap();
    assert_eq!(key.quadkey(), "213");
    assert_eq!(TileKey::root().quadkey(), "");
}

#[test]
fn test_from_quadkey() {
    assert_eq!(
        TileKey::from_quadkey("213").unwrap(),
        TileKey::new(3, 3, 5).unwrap()
    );
    assert_eq!(TileKey::from_quadkey("").unwrap(), TileKey::root());
    assert!(matches!(
        TileKey::from_quadkey("214"),
        Err(CoordError::InvalidQuadkey(_))
    ));
}

#[test]
fn test_display_and_parse() {
    let key = TileKey::new(12, 2048, 1361).unwrap();
    assert_eq!(key.to_string(), "12/2048/1361");
    assert_eq!("12/2048/1361".parse::<TileKey>().unwrap(), key);
}

#[test]
fn test_parse_rejects_malformed() {
    assert!(matches!(
        "12/2048".parse::<TileKey>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "1/0/0/0".parse::<TileKey>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "a/b/c".parse::<TileKey>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "1/2/0".parse::<TileKey>(),
        Err(CoordError::OutOfRange { .. })
    ));
}

#[test]
fn test_keys_order_by_level_first() {
    let shallow = TileKey::new(1, 1, 1).unwrap();
    let deep = TileKey::new(2, 0, 0).unwrap();
    assert!(shallow < deep);
}
