pub mod envelope;
pub mod payload;
pub mod provider;
pub mod requirer;

// Wire keys shared by both endpoint sides.
pub const AUTHENTICATION_KEY: &str = "authentication_data";
pub const CONFIGURATION_KEY: &str = "configuration_data";
pub const NAME_KEY: &str = "name";
