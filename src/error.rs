use thiserror::Error;

/// Everything the synthesis core can refuse to do.
///
/// Synthesis is deterministic, so none of these are transient: retrying the
/// same call fails the same way. The caller has to fix the arguments.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A parameter outside its domain, or a name that matches no known kind.
    #[error("invalid {what}: {detail}")]
    InvalidArgument { what: &'static str, detail: String },

    /// Engine or patch configuration that could not be decoded.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SynthError {
    pub(crate) fn invalid(what: &'static str, detail: impl Into<String>) -> Self {
        SynthError::InvalidArgument {
            what,
            detail: detail.into(),
        }
    }

    /// True for [`SynthError::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SynthError::InvalidArgument { .. })
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display() {
        let e = SynthError::invalid("waveform", "'kazoo' is not a waveform");
        assert_eq!(format!("{e}"), "invalid waveform: 'kazoo' is not a waveform");
        assert!(e.is_invalid_argument());
    }

    #[test]
    fn config_error_wraps_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: SynthError = json_err.into();
        assert!(!e.is_invalid_argument());
        assert!(format!("{e}").starts_with("configuration error"));
    }
}
