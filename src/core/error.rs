use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Row {row} has invalid fields: {}", format_field_errors(.errors))]
    Validation {
        row: usize,
        errors: Vec<(String, String)>,
    },

    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("Field '{0}' is not part of entity '{1}'")]
    UnknownField(String, String),

    #[error("Table unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, GridError>;

fn format_field_errors(errors: &[(String, String)]) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<reqwest::Error> for GridError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = GridError::Validation {
            row: 2,
            errors: vec![
                ("name".to_string(), "is required".to_string()),
                ("age".to_string(), "must be at most 150".to_string()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Row 2 has invalid fields: name: is required, age: must be at most 150"
        );
    }

    #[test]
    fn rejected_error_carries_status() {
        let err = GridError::Rejected {
            status: 404,
            message: "not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
    }
}
