use serde::{Deserialize, Serialize};

use crate::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: EntityId,
    pub name: String,
    #[serde(default, alias = "logo_url", alias = "logo")]
    pub logo_url: Option<String>,
}
