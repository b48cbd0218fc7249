use crate::tests::utils::TestSuite;
use crate::{AetherDB, CollectionError, DatabaseError};
use serial_test::serial;

#[test]
#[serial]
fn test_create_collection() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let sandbox = suite.begin_test("-[testCreateCollection]")?;
    let test_collection = "test_collection";

    let db = AetherDB::open(&sandbox.config())?;
    db.create_collection(test_collection, 128, "cosine")?;

    assert_eq!(db.collection_names()?, vec![test_collection.to_string()]);
    assert_eq!(
        db.create_collection(test_collection, 128, "cosine"),
        Err(DatabaseError::Collection(CollectionError::AlreadyExists(
            test_collection.to_string()
        )))
    );

    db.close();
    sandbox.end_test()?;
    Ok(())
}

#[test]
#[serial]
fn test_collections_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let sandbox = suite.begin_test("-[testReopen]")?;
    let config = sandbox.config_for("reopen.realm");

    let db = AetherDB::open(&config)?;
    db.create_collection("b", 3, "l2")?;
    db.create_collection("a", 3, "dot")?;
    db.close();

    let db = AetherDB::open(&config)?;
    assert_eq!(db.collection_names()?, vec!["a".to_string(), "b".to_string()]);
    db.close();

    sandbox.end_test()?;
    Ok(())
}
