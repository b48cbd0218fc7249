use crate::tests::utils::TestSuite;
use crate::{AetherDB, AssertionFailure, CollectionError, DatabaseError, Document};
use serial_test::serial;

#[test]
#[serial]
fn test_assert_succeeds_returns_value() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let sandbox = suite.begin_test("-[testSucceeds]")?;
    let db = AetherDB::open(&sandbox.config())?;

    sandbox.assert_succeeds(|| db.create_collection("c", 2, "l2"))?;
    let names = sandbox.assert_succeeds(|| db.collection_names())?;
    assert_eq!(names, vec!["c".to_string()]);

    let failure = sandbox
        .assert_succeeds(|| db.create_collection("c", 2, "l2"))
        .expect_err("duplicate collection");
    assert_eq!(
        failure,
        AssertionFailure::UnexpectedError("Collection already exists: c".to_string())
    );

    db.close();
    sandbox.end_test()?;
    Ok(())
}

#[test]
#[serial]
fn test_assert_fails_matches_exactly() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let sandbox = suite.begin_test("-[testFails]")?;
    let db = AetherDB::open(&sandbox.config())?;

    let missing = DatabaseError::Collection(CollectionError::NotFound("nope".to_string()));
    sandbox.assert_fails(missing.clone(), || {
        db.upsert("nope", Document::new(vec![1.0], "x".to_string()))
    })?;

    assert!(matches!(
        sandbox.assert_fails(missing.clone(), || db.collection_names()),
        Err(AssertionFailure::UnexpectedSuccess(_))
    ));
    assert!(matches!(
        sandbox.assert_fails(missing, || db.create_collection("c", 0, "l2")),
        Err(AssertionFailure::WrongError { .. })
    ));
    // an expected error does not excuse an open handle
    assert!(!sandbox.leak_detected());

    db.close();
    sandbox.end_test()?;
    Ok(())
}

#[test]
#[serial]
fn test_assert_throws_mismatches() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let mut sandbox = suite.begin_test("-[testThrowsMismatch]")?;

    assert_eq!(
        sandbox.assert_throws(|| 1 + 1, None),
        Err(AssertionFailure::NoPanic)
    );
    assert_eq!(
        sandbox.assert_throws(|| -> () { panic!("disk full") }, Some("locked")),
        Err(AssertionFailure::WrongPanic {
            expected: "locked".to_string(),
            actual: "disk full".to_string(),
        })
    );
    assert_eq!(sandbox.assert_throws(|| -> () { panic!("disk full") }, None), Ok(()));

    sandbox.end_test()?;
    Ok(())
}

#[test]
#[serial]
fn test_assert_nil() -> Result<(), Box<dyn std::error::Error>> {
    let suite = TestSuite::new();
    let sandbox = suite.begin_test("-[testNil]")?;

    sandbox.assert_nil(|| None::<u8>)?;
    assert_eq!(
        sandbox.assert_nil(|| Some("value")),
        Err(AssertionFailure::NotNil("\"value\"".to_string()))
    );

    sandbox.end_test()?;
    Ok(())
}
