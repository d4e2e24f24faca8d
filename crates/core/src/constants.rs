//! Constants used throughout the Fiche core crate.
//!
//! Display strings, URL markers and environment variable names live here so the
//! formatter, the resolver and the CLI agree on them.

/// Display string for a checked boolean field.
pub const BOOLEAN_TRUE_LABEL: &str = "Oui";

/// Display string for an unchecked boolean, only reachable through generic formatting.
pub const BOOLEAN_FALSE_LABEL: &str = "Non";

/// Delimiter used when an array is rendered in a single-line slot.
pub const LIST_DELIMITER: &str = ", ";

/// Origin used for export media URLs when the hosting environment provides none.
pub const DEFAULT_EXPORT_BASE_URL: &str = "http://localhost:3000";

/// Same-origin proxy route that streams stored media objects back to the export engine.
pub const IMAGE_PROXY_ROUTE: &str = "api/images";

/// Host marker identifying a remote object-storage download URL.
pub const STORAGE_HOST_MARKER: &str = "firebasestorage.googleapis.com";

/// Path prefix preceding the bucket name in a storage download URL.
pub const STORAGE_BUCKET_SEGMENT: &str = "/v0/b/";

/// Path segment preceding the encoded object path in a storage download URL.
pub const STORAGE_OBJECT_SEGMENT: &str = "/o/";

/// Environment variable holding the export base URL.
pub const EXPORT_BASE_URL_ENV: &str = "FICHE_EXPORT_BASE_URL";

/// Environment variable holding an override path for the pathology config.
pub const PATHOLOGY_CONFIG_ENV: &str = "FICHE_PATHOLOGY_CONFIG";

/// Record key holding the patient's pathology membership list.
pub const PATHOLOGIES_KEY: &str = "pathologies";
