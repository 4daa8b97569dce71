use crate::error::RegistryError;
use crate::model::Entry;

/// An external source of launchable applications, read once at startup.
pub trait Registry {
    fn name(&self) -> &str;
    fn enumerate_applications(&self) -> Result<Vec<Entry>, RegistryError>;
}

pub mod desktop;
pub mod items;
