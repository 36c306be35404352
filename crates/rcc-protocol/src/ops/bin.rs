//! Binary download query.

use super::fields;

/// Query parameters of the `bin/` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinQuery {
    pub program: String,
    pub binary: String,
    pub task_id: String,
}

impl BinQuery {
    /// Query pairs; the service expects `repomode=True` for repository builds.
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            (fields::REPOMODE.to_string(), "True".to_string()),
            (fields::PROGRAM.to_string(), self.program.clone()),
            (fields::BINARY.to_string(), self.binary.clone()),
            (fields::TASK_ID.to_string(), self.task_id.clone()),
        ]
    }
}
