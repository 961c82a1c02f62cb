pub mod gateways;
pub mod persistence;
