use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Serialize, Debug, PartialEq)]
pub struct HealthCheck {
    pub status: String,
}

impl HealthCheck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn template_missing() -> Self {
        Self {
            status: "template missing".to_string(),
        }
    }
}
