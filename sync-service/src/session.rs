//! Per-login application context.
//!
//! Replaces what would otherwise be global mutable state: populated at
//! login, mutated only through the engine's own operations, cleared at
//! logout.

use reader_client::domain::{Area, Customer, ReaderProfile, SystemSettings};

/// The route currently open in the reading view.
#[derive(Debug, Clone)]
pub struct OpenRoute {
    pub area_id: i64,
    pub area_name: String,
    /// Registered zone names of the open area, in route order.
    pub zones: Vec<String>,
    /// Customers of this route (all zones), address-matched.
    pub customers: Vec<Customer>,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub profile: ReaderProfile,
    pub settings: SystemSettings,
    pub assigned_areas: Vec<Area>,
    pub open_route: Option<OpenRoute>,
}

impl SessionContext {
    pub fn new(profile: ReaderProfile) -> Self {
        Self {
            profile,
            settings: SystemSettings::default(),
            assigned_areas: Vec::new(),
            open_route: None,
        }
    }
}
