pub mod cluster;
pub mod embed;
pub mod forecast;
pub mod vms;
