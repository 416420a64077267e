use serde::{Deserialize, Serialize};

use crate::EntityId;

/// A service offering with its owned features and sub-services.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: EntityId,
    pub name: String,
    #[serde(default, alias = "short_desc")]
    pub short_desc: String,
    #[serde(default, alias = "long_desc")]
    pub long_desc: String,
    #[serde(default, alias = "image_url", alias = "image")]
    pub image_url: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, alias = "sub_services")]
    pub sub_services: Vec<SubService>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: EntityId,
    #[serde(alias = "feature_name")]
    pub feature_name: String,
    #[serde(default, alias = "feature_desc")]
    pub feature_desc: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubService {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub works: Vec<Work>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: EntityId,
    pub description: String,
}

impl Service {
    pub fn feature(&self, id: EntityId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn sub_service(&self, id: EntityId) -> Option<&SubService> {
        self.sub_services.iter().find(|s| s.id == id)
    }
}
