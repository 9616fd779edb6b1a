pub mod alerts;
pub mod artifacts;
pub mod collection;
pub mod devices;
pub mod materials;
pub mod readings;
