use std::fmt;

use models::EntityId;

/// Remote collections the proxy knows how to reach.
///
/// Nested variants carry their parent id so the path can be built without
/// any extra context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Brands,
    Clients,
    Services,
    Achievements,
    ContactMessages,
    Features { service_id: EntityId },
    SubServices { service_id: EntityId },
    Works { sub_service_id: EntityId },
}

impl Resource {
    /// Short label used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Brands => "brands",
            Resource::Clients => "clients",
            Resource::Services => "services",
            Resource::Achievements => "achievements",
            Resource::ContactMessages => "contact-messages",
            Resource::Features { .. } => "features",
            Resource::SubServices { .. } => "sub-services",
            Resource::Works { .. } => "works",
        }
    }

    /// Path relative to the upstream api prefix, without leading slash.
    pub fn collection_path(&self) -> String {
        match self {
            Resource::Features { service_id } => format!("services/{service_id}/features"),
            Resource::SubServices { service_id } => format!("services/{service_id}/sub-services"),
            Resource::Works { sub_service_id } => format!("sub-services/{sub_service_id}/works"),
            other => other.name().to_string(),
        }
    }

    pub fn item_path(&self, id: EntityId) -> String {
        format!("{}/{id}", self.collection_path())
    }

    /// The public contact form posts without credentials; everything else
    /// that mutates needs a bearer token.
    pub fn create_requires_auth(&self) -> bool {
        !matches!(self, Resource::ContactMessages)
    }

    /// Admin page a finished form returns to.
    pub fn admin_list_path(&self) -> String {
        match self {
            Resource::Features { service_id } | Resource::SubServices { service_id } => {
                format!("/admin/services/{service_id}")
            }
            Resource::Works { sub_service_id } => format!("/admin/sub-services/{sub_service_id}"),
            other => format!("/admin/{}", other.name()),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection_path())
    }
}
