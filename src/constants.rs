//! # System Constants
//!
//! Queue names, lock names and the bureau manifest layout.

/// Default queue names; each can be overridden in configuration
pub mod queues {
    pub const PRINT_REQUEST_BATCH: &str = "process_print_request_batch_queue";
    pub const PRINT_RESPONSE_FILE: &str = "process_print_response_file_queue";
    pub const PRINT_RESPONSE: &str = "process_print_response_queue";
    pub const VOTER_CARD_STATISTICS: &str = "trigger_voter_card_statistics_update_queue";
    pub const APPLICATIONS_STATISTICS: &str = "trigger_application_statistics_update_queue";
    pub const EMAIL_OUTBOX: &str = "send_email_outbox_queue";
}

/// Distributed lock guarding scheduled batch assembly
pub const BATCHING_LOCK_NAME: &str = "print_request_batching";

/// Bureau manifest layout
pub mod manifest {
    pub const DELIMITER: char = '|';
    pub const LINE_ENDING: &str = "\n";
    pub const CARD_VERSION: &str = "1";

    pub const COLUMN_COUNT: usize = 42;

    pub const HEADER: [&str; COLUMN_COUNT] = [
        "requestId",
        "issuingAuthorityEn",
        "issuingAuthorityCy",
        "issueDate",
        "suggestedExpiryDate",
        "requestDateTime",
        "cardFirstname",
        "cardMiddleNames",
        "cardSurname",
        "cardVersion",
        "cardNumber",
        "certificateLanguage",
        "certificateFormat",
        "deliveryOption",
        "photo",
        "deliveryName",
        "deliveryStreet",
        "deliveryProperty",
        "deliveryLocality",
        "deliveryTown",
        "deliveryArea",
        "deliveryPostcode",
        "eroNameEn",
        "eroPhoneNumberEn",
        "eroEmailAddressEn",
        "eroWebsiteEn",
        "eroDeliveryStreetEn",
        "eroDeliveryPropertyEn",
        "eroDeliveryLocalityEn",
        "eroDeliveryTownEn",
        "eroDeliveryAreaEn",
        "eroDeliveryPostcodeEn",
        "eroNameCy",
        "eroPhoneNumberCy",
        "eroEmailAddressCy",
        "eroWebsiteCy",
        "eroDeliveryStreetCy",
        "eroDeliveryPropertyCy",
        "eroDeliveryLocalityCy",
        "eroDeliveryTownCy",
        "eroDeliveryAreaCy",
        "eroDeliveryPostcodeCy",
    ];
}
