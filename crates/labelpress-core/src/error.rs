pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing element id='{element_id}' in template")]
    MissingRequiredElement { element_id: String },

    #[error("Missing style block id='{element_id}' in template")]
    MissingStyleBlock { element_id: String },

    #[error("Invalid release record YAML: {message}")]
    InvalidRecordYaml { message: String },

    #[error("Invalid release record: {message}")]
    InvalidRecord { message: String },

    #[error("Invalid label config: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid value template {template:?}: {message}")]
    InvalidValueTemplate { template: String, message: String },
}
