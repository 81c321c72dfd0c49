//! # PSV Manifest
//!
//! One pipe-separated record per print request, in the exact column order the
//! bureau parses. Values never contain the delimiter or a line break.

use chrono::{DateTime, NaiveDate, Utc};

use crate::constants::manifest::{CARD_VERSION, COLUMN_COUNT, DELIMITER, HEADER, LINE_ENDING};
use crate::models::{Address, ElectoralRegistrationOffice, PrintRequest, PrintableDocument};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// ERO contact columns, repeated per language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EroColumns {
    pub name: String,
    pub phone_number: String,
    pub email_address: String,
    pub website: String,
    pub street: String,
    pub property: String,
    pub locality: String,
    pub town: String,
    pub area: String,
    pub postcode: String,
}

impl From<&ElectoralRegistrationOffice> for EroColumns {
    fn from(ero: &ElectoralRegistrationOffice) -> Self {
        Self {
            name: ero.name.clone(),
            phone_number: ero.phone_number.clone(),
            email_address: ero.email_address.clone(),
            website: ero.website.clone(),
            street: ero.address.street.clone(),
            property: optional(&ero.address.property),
            locality: optional(&ero.address.locality),
            town: optional(&ero.address.town),
            area: optional(&ero.address.area),
            postcode: ero.address.postcode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub request_id: String,
    pub issuing_authority_en: String,
    pub issuing_authority_cy: String,
    pub issue_date: String,
    pub suggested_expiry_date: String,
    pub request_date_time: String,
    pub card_firstname: String,
    pub card_middle_names: String,
    pub card_surname: String,
    pub card_version: String,
    pub card_number: String,
    pub certificate_language: String,
    pub certificate_format: String,
    pub delivery_option: String,
    pub photo: String,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_property: String,
    pub delivery_locality: String,
    pub delivery_town: String,
    pub delivery_area: String,
    pub delivery_postcode: String,
    pub ero_en: EroColumns,
    pub ero_cy: EroColumns,
}

impl ManifestRecord {
    /// Record for `request`, whose photo is stored in the zip as `photo_file_name`
    pub fn new(document: &PrintableDocument, request: &PrintRequest, photo_file_name: &str) -> Self {
        let delivery_address: &Address = &request.delivery.address;
        Self {
            request_id: request.request_id.clone(),
            issuing_authority_en: document.issuing_authority.clone(),
            issuing_authority_cy: optional(&document.issuing_authority_cy),
            issue_date: format_date(document.issue_date),
            suggested_expiry_date: document
                .suggested_expiry_date
                .map(format_date)
                .unwrap_or_default(),
            request_date_time: format_date_time(request.request_date_time),
            card_firstname: request.first_name.clone(),
            card_middle_names: optional(&request.middle_names),
            card_surname: request.surname.clone(),
            card_version: CARD_VERSION.to_string(),
            card_number: document.document_number.clone(),
            certificate_language: request.certificate_language.code().to_string(),
            certificate_format: request.certificate_format.code().to_string(),
            delivery_option: request
                .delivery
                .delivery_address_type
                .delivery_option()
                .to_string(),
            photo: photo_file_name.to_string(),
            delivery_name: request.delivery.addressee.clone(),
            delivery_street: delivery_address.street.clone(),
            delivery_property: optional(&delivery_address.property),
            delivery_locality: optional(&delivery_address.locality),
            delivery_town: optional(&delivery_address.town),
            delivery_area: optional(&delivery_address.area),
            delivery_postcode: delivery_address.postcode.clone(),
            ero_en: EroColumns::from(&request.ero_english),
            ero_cy: request
                .ero_welsh
                .as_ref()
                .map(EroColumns::from)
                .unwrap_or_default(),
        }
    }

    /// Column values in header order
    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.request_id,
            &self.issuing_authority_en,
            &self.issuing_authority_cy,
            &self.issue_date,
            &self.suggested_expiry_date,
            &self.request_date_time,
            &self.card_firstname,
            &self.card_middle_names,
            &self.card_surname,
            &self.card_version,
            &self.card_number,
            &self.certificate_language,
            &self.certificate_format,
            &self.delivery_option,
            &self.photo,
            &self.delivery_name,
            &self.delivery_street,
            &self.delivery_property,
            &self.delivery_locality,
            &self.delivery_town,
            &self.delivery_area,
            &self.delivery_postcode,
            &self.ero_en.name,
            &self.ero_en.phone_number,
            &self.ero_en.email_address,
            &self.ero_en.website,
            &self.ero_en.street,
            &self.ero_en.property,
            &self.ero_en.locality,
            &self.ero_en.town,
            &self.ero_en.area,
            &self.ero_en.postcode,
            &self.ero_cy.name,
            &self.ero_cy.phone_number,
            &self.ero_cy.email_address,
            &self.ero_cy.website,
            &self.ero_cy.street,
            &self.ero_cy.property,
            &self.ero_cy.locality,
            &self.ero_cy.town,
            &self.ero_cy.area,
            &self.ero_cy.postcode,
        ]
    }
}

/// Render the header line followed by one line per record
pub fn render_manifest(records: &[ManifestRecord]) -> String {
    let mut manifest = String::new();
    push_line(&mut manifest, HEADER.iter().copied());
    for record in records {
        let values: Vec<String> = record.fields().into_iter().map(sanitize).collect();
        push_line(&mut manifest, values.iter().map(String::as_str));
    }
    manifest
}

fn push_line<'a>(out: &mut String, values: impl Iterator<Item = &'a str>) {
    for (index, value) in values.enumerate() {
        if index > 0 {
            out.push(DELIMITER);
        }
        out.push_str(value);
    }
    out.push_str(LINE_ENDING);
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != DELIMITER && *c != '\n' && *c != '\r')
        .collect()
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_date_time(date_time: DateTime<Utc>) -> String {
    date_time.format(DATE_TIME_FORMAT).to_string()
}
