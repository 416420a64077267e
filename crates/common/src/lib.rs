//! Cross-cutting helpers shared by the service and server crates.

pub mod types;
pub mod utils;
pub mod env;
pub mod admin_http;

#[cfg(test)]
mod tests {
    use super::types::Health;

    #[test]
    fn health_serializes_status() {
        let h = Health::ok();
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
