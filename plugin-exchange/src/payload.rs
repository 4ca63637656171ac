use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys a complete credentials record carries.
pub const EXPECTED_AUTH_KEYS: [&str; 8] = [
    "username",
    "password",
    "project_domain_id",
    "project_name",
    "user_domain_id",
    "auth_uri",
    "auth_url",
    "auth_type",
];

/// Service-user credentials pushed from the principal to the plugin.
///
/// The record is map-shaped on the wire. A well-formed record carries
/// exactly the keys in [`EXPECTED_AUTH_KEYS`]; records with missing or
/// extra keys are still transmitted, the divergence is only reported to
/// the log. Equality is field-for-field.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AuthenticationData(BTreeMap<String, String>);

impl AuthenticationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_owned(), value.to_owned());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symmetric difference of the carried keys against
    /// [`EXPECTED_AUTH_KEYS`], as `(missing, unexpected)`.
    pub fn key_divergence(&self) -> (Vec<String>, Vec<String>) {
        let missing = EXPECTED_AUTH_KEYS
            .iter()
            .filter(|key| !self.0.contains_key(**key))
            .map(|key| (*key).to_owned())
            .collect();
        let unexpected = self
            .0
            .keys()
            .filter(|key| !EXPECTED_AUTH_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        (missing, unexpected)
    }
}

impl From<BTreeMap<String, String>> for AuthenticationData {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }
}

/// One section body inside a config-file fragment: an ordered run of
/// key/value options, or an opaque preformatted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionBody {
    Options(Vec<(String, String)>),
    Raw(String),
}

/// Named sections of one config file owned by the principal.
pub type ConfigFile = BTreeMap<String, SectionBody>;

/// Config-file fragments pushed from the plugin to the principal.
///
/// `complete` is false while the plugin still has configuration work to
/// do; the principal must not write partial fragments into its files.
/// Everything besides `complete` is a config-file name mapped to that
/// file's sections.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct ConfigurationData {
    /// False while the plugin is only partially configured or not ready;
    /// absent on the wire counts as false.
    #[serde(default)]
    pub complete: bool,
    #[serde(flatten)]
    pub files: BTreeMap<String, ConfigFile>,
}

impl ConfigurationData {
    pub fn new(complete: bool) -> Self {
        Self {
            complete,
            files: BTreeMap::new(),
        }
    }

    /// Set one section of `file`, replacing any previous body.
    pub fn set_section(
        &mut self,
        file: &str,
        section: &str,
        body: SectionBody,
    ) {
        self.files
            .entry(file.to_owned())
            .or_default()
            .insert(section.to_owned(), body);
    }
}
