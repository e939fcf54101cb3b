use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Config {
        message: String,
        hint: Option<String>,
    },
    #[error("{message}")]
    Input {
        message: String,
        hint: Option<String>,
    },
    #[error("{message}")]
    Merge {
        message: String,
        hint: Option<String>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint,
        }
    }

    pub fn input(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::Input {
            message: message.into(),
            hint,
        }
    }

    pub fn merge(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::Merge {
            message: message.into(),
            hint,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } | Self::Input { hint, .. } | Self::Merge { hint, .. } => {
                hint.as_deref()
            }
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config { .. } => ExitCode::from(3),
            Self::Input { .. } => ExitCode::from(4),
            Self::Merge { .. } => ExitCode::from(5),
        }
    }
}
