use serde::{Deserialize, Serialize};

/// Postal address as printed by the bureau
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postcode: String,
    pub property: Option<String>,
    pub locality: Option<String>,
    pub town: Option<String>,
    pub area: Option<String>,
    pub uprn: Option<String>,
}

/// Contact details of an Electoral Registration Office in one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectoralRegistrationOffice {
    pub name: String,
    pub phone_number: String,
    pub email_address: String,
    pub website: String,
    pub address: Address,
}

/// Directory record for an ERO, keyed by local authority GSS code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EroContactDetails {
    pub ero_id: String,
    pub gss_code: String,
    pub name: String,
    /// Addresses notification emails are sent to
    pub email_addresses: Vec<String>,
}
