use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("cannot convert {raw:?} into {expected}")]
    Conversion { raw: String, expected: &'static str },
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ValueError>,
    },
    #[error("no value supplied")]
    Missing,
}

impl ValueError {
    pub fn conversion(raw: &str, expected: &'static str) -> Self {
        ValueError::Conversion {
            raw: raw.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("type {type_name} does not have expected form field '{key}'")]
    UnknownField { type_name: &'static str, key: String },
    #[error("type {type_name} does not have expected form file field '{key}'")]
    UnknownFileField { type_name: &'static str, key: String },
    #[error("value {values:?} cannot be parsed into field {type_name}.{field}: {source}")]
    Value {
        type_name: &'static str,
        field: String,
        values: Vec<String>,
        #[source]
        source: ValueError,
    },
    #[error("cannot bind {count} files for form file field '{field}' into {type_name}.{field}")]
    MultipleFiles {
        type_name: &'static str,
        field: String,
        count: usize,
    },
}
