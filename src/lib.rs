//! Client for the Sector Alarm customer portal: cookie session login plus typed panel,
//! overview and temperature snapshots.

pub mod models {
    pub mod sector_alarm;
}

pub mod client;
pub mod config;
pub mod version;

pub use client::{ClientOptions, Credentials, SectorAlarmClient, SectorAlarmError};
pub use models::sector_alarm::{Overview, Panel, PanelId, Smartplug, Temperature, VersionToken};
pub use version::{LandingPage, VersionSource};
