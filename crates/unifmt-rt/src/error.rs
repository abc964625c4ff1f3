use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RtError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },
    #[error("invalid value for {key}: {message}")]
    Config { key: String, message: String },
    #[error("{0}")]
    Usage(String),
}

impl RtError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Exit code used by the command-line tools: usage mistakes are 2,
    /// everything else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::RtError;

    #[test]
    fn io_error_names_the_path() {
        let err = RtError::io(
            "scratch.u",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.to_string(), "failed to access scratch.u: no such file");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(RtError::usage("missing path").exit_code(), 2);
    }
}
