pub mod manager;

pub use manager::BroadcastHub;

/// Topic every dashboard observer subscribes to.
pub fn dashboard_topic() -> String {
    "attendance:dashboard".to_string()
}
