use chrono::Utc;
use uuid::Uuid;

/// Generates human-scannable, collision-resistant run identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A run id like `run-20260825T101530-1f3a9c2d`.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("run-{stamp}-{}", &suffix[..8])
    }
}
