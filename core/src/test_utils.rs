use crate::{AetherDB, DatabaseError, Document};
use rand::Rng;
use uuid::Uuid;

pub fn random_document(dim: usize) -> Document {
    let mut rng = rand::rng();
    Document::new((0..dim).map(|_| rng.random_range(-1.0..1.0)).collect(), "random")
}

/// Creates `collection` on `db` and fills it with `count` random documents.
pub fn seed_collection(
    db: &AetherDB,
    collection: &str,
    dim: usize,
    count: usize,
) -> Result<Vec<Uuid>, DatabaseError> {
    db.create_collection(collection, dim as i32, "l2")?;
    (0..count)
        .map(|_| {
            let document = random_document(dim);
            let id = document.id;
            db.upsert(collection, document).map(|_| id)
        })
        .collect()
}
