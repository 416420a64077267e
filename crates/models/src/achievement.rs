use serde::{Deserialize, Serialize};

use crate::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: EntityId,
    pub title: String,
    #[serde(default, alias = "image_url", alias = "image")]
    pub image_url: String,
}
