use serde::{Deserialize, Serialize};

use crate::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    #[serde(default, alias = "image_url", alias = "image")]
    pub image_url: Option<String>,
}
