use serde::{Deserialize, Serialize};

/// The signed-in reader. Authentication itself happens outside the
/// core; the profile is handed in at login and cleared at logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderProfile {
    /// Staff row id used to filter area assignments. `None` for
    /// accounts that exist only in the auth system.
    pub staff_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: String,
}

impl ReaderProfile {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
