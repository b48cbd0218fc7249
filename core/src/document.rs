use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored vector and its payload. `id` is assigned on creation and kept on upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub content: String,
}

impl Document {
    pub fn new(vector: Vec<f32>, content: impl Into<String>) -> Self {
        Document {
            id: Uuid::new_v4(),
            vector,
            content: content.into(),
        }
    }

    pub fn dimension(&self) -> i32 {
        self.vector.len() as i32
    }
}
