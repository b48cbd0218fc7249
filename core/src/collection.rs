use uuid::Uuid;

use crate::constant::MAX_DIMENSION;
use crate::document::Document;
use crate::error::CollectionError;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceType {
    Cosine,
    L2,
    Dot,
}

impl FromStr for DistanceType {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "cosine" => Ok(DistanceType::Cosine),
            "l2" => Ok(DistanceType::L2),
            "dot" => Ok(DistanceType::Dot),
            _ => Err(CollectionError::InvalidDistanceType(s.to_string())),
        }
    }
}

/// Documents of one collection, keyed by id.
pub struct Collection {
    dimension: i32,
    documents: HashMap<Uuid, Document>,
}

impl Collection {
    /// The distance is only validated; nothing here scores documents.
    pub fn new(dimension: i32, distance: &str) -> Result<Self, CollectionError> {
        if !(1..=MAX_DIMENSION).contains(&dimension) {
            return Err(CollectionError::InvalidDimension(format!(
                "Dimension must be between 1 and {}",
                MAX_DIMENSION
            )));
        }
        distance.parse::<DistanceType>()?;

        Ok(Collection {
            dimension,
            documents: HashMap::new(),
        })
    }

    pub fn validate(&self, document: &Document) -> Result<(), CollectionError> {
        if document.dimension() != self.dimension {
            return Err(CollectionError::InvalidDimension(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimension,
                document.dimension()
            )));
        }
        Ok(())
    }

    pub fn upsert(&mut self, document: Document) -> Result<(), CollectionError> {
        self.validate(&document)?;
        self.documents.insert(document.id, document);
        Ok(())
    }

    pub fn fetch(&self, id: &Uuid) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn delete(&mut self, id: &Uuid) -> Option<Document> {
        self.documents.remove(id)
    }
}
