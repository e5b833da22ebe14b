use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Csv(csv::Error),
    Store(redis::RedisError),
    Config(String),
    FieldMissing { key: String, field: String },
    MalformedRow { line: u64, columns: usize },
    InvalidScore(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Csv(err) => write!(f, "CSV error: {}", err),
            Error::Store(err) => write!(f, "Store error: {}", err),
            Error::Config(err) => write!(f, "Config error: {}", err),
            Error::FieldMissing { key, field } => {
                write!(f, "Field {} not found in hash {}", field, key)
            }
            Error::MalformedRow { line, columns } => write!(
                f,
                "Malformed row at line {}: {} columns, at least 7 required",
                line, columns
            ),
            Error::InvalidScore(score) => write!(f, "Score is not a valid float: {:?}", score),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Csv(err) => Some(err),
            Error::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Csv(value)
    }
}

impl From<redis::RedisError> for Error {
    fn from(value: redis::RedisError) -> Self {
        Error::Store(value)
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Config(value.to_string())
    }
}
