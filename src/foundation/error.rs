/// Convenience result type used across the crate.
pub type ParticleVideoResult<T> = Result<T, ParticleVideoError>;

/// Top-level error taxonomy. Every variant is fatal for a conversion run.
#[derive(thiserror::Error, Debug)]
pub enum ParticleVideoError {
    /// A simulation log line could not be interpreted.
    #[error("parse error at line {line}: {message} (line content: '{content}')")]
    Parse {
        /// 1-based line number in the input file.
        line: u64,
        /// Raw line content, trimmed.
        content: String,
        /// What was wrong with the line.
        message: String,
    },

    /// Invalid render or command-line configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The external encoder failed, exited early or rejected a frame.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// Rasterization or font resolution failed.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParticleVideoError {
    /// Build a [`ParticleVideoError::Parse`] value.
    pub fn parse(line: u64, content: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            content: content.into(),
            message: message.into(),
        }
    }

    /// Build a [`ParticleVideoError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ParticleVideoError::Encoder`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Build a [`ParticleVideoError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Line number for parse errors, `None` otherwise.
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
