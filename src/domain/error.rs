//! Domain error types.

/// Top-level error type for finboard.
#[derive(Debug, thiserror::Error)]
pub enum FinboardError {
    #[error("no price history for {ticker}")]
    UnknownTicker { ticker: String },

    #[error("insufficient dividend history for {ticker}: {events} events in range, need {minimum}")]
    InsufficientData {
        ticker: String,
        events: usize,
        minimum: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error for {ticker}: {reason}")]
    DataSource { ticker: String, reason: String },

    #[error("cache error: {reason}")]
    Cache { reason: String },

    #[error("holdings dataset error: {reason}")]
    Holdings { reason: String },

    #[error("unknown fund: {0}")]
    UnknownFund(String),

    #[error("invalid holding entry: {reason}")]
    HoldingEntry { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FinboardError> for std::process::ExitCode {
    fn from(err: &FinboardError) -> Self {
        let code: u8 = match err {
            FinboardError::Io(_) => 1,
            FinboardError::ConfigParse { .. }
            | FinboardError::ConfigMissing { .. }
            | FinboardError::ConfigInvalid { .. } => 2,
            FinboardError::DataSource { .. } | FinboardError::Cache { .. } => 3,
            FinboardError::Holdings { .. }
            | FinboardError::UnknownFund(_)
            | FinboardError::HoldingEntry { .. } => 4,
            FinboardError::UnknownTicker { .. } | FinboardError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = FinboardError::UnknownTicker {
            ticker: "XYZ".into(),
        };
        assert_eq!(err.to_string(), "no price history for XYZ");

        let err = FinboardError::InsufficientData {
            ticker: "MSFT".into(),
            events: 1,
            minimum: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient dividend history for MSFT: 1 events in range, need 2"
        );
    }

    #[test]
    fn exit_codes_group_by_class() {
        use std::process::ExitCode;

        let config_err = FinboardError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        };
        assert_eq!(ExitCode::from(&config_err), ExitCode::from(2));

        let data_err = FinboardError::DataSource {
            ticker: "MSFT".into(),
            reason: "timeout".into(),
        };
        assert_eq!(ExitCode::from(&data_err), ExitCode::from(3));

        let no_data = FinboardError::UnknownTicker {
            ticker: "XYZ".into(),
        };
        assert_eq!(ExitCode::from(&no_data), ExitCode::from(5));
    }
}
