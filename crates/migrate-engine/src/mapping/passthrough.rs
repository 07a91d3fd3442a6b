//! Identity mapper, used to check pipeline plumbing

use super::{MapError, RecordMapper};
use serde_json::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughMapper;

impl RecordMapper for PassThroughMapper {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn map(&self, legacy: &Value) -> Result<Option<Value>, MapError> {
        Ok(Some(legacy.clone()))
    }
}
