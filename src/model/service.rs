use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business service that entity nodes are attributed to
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub slug: String,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /services`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateServiceDto {
    pub name: String,
    pub slug: String,
    pub display_order: i32,
}
