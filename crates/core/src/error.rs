use fiche_types::TypesError;

#[derive(Debug, thiserror::Error)]
pub enum FicheError {
    #[error("invalid identifier or path: {0}")]
    InvalidType(#[from] TypesError),

    #[error("failed to read pathology config file: {0}")]
    ConfigRead(std::io::Error),
    #[error("pathology config schema mismatch at {path}: {message}")]
    ConfigSchema { path: String, message: String },
    #[error("duplicate pathology id '{0}'")]
    DuplicatePathology(String),
    #[error("pathology '{pathology}': duplicate section id '{section}'")]
    DuplicateSection { pathology: String, section: String },
    #[error("pathology '{pathology}': duplicate field descriptor '{key}'")]
    DuplicateFieldDescriptor { pathology: String, key: String },
    #[error("pathology '{pathology}': field path '{path}' is declared by sections '{first}' and '{second}'")]
    DuplicateFieldPath {
        pathology: String,
        path: String,
        first: String,
        second: String,
    },
    #[error("pathology '{pathology}': section '{section}' declares field '{path}' without a descriptor")]
    MissingFieldDescriptor {
        pathology: String,
        section: String,
        path: String,
    },
    #[error("pathology '{pathology}': media field '{key}' must be declared with type 'array'")]
    MediaFieldNotArray { pathology: String, key: String },

    #[error("failed to parse patient record: {0}")]
    RecordParse(serde_json::Error),
    #[error("patient record must be a JSON object")]
    RecordNotObject,

    #[error("invalid export base URL '{url}': {reason}")]
    InvalidExportBaseUrl { url: String, reason: String },
}

pub type FicheResult<T> = std::result::Result<T, FicheError>;
