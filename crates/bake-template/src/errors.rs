use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("error reading template: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing template JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template must be a JSON object")]
    NotAnObject,
    #[error("Unknown root level key in template: '{0}'")]
    UnknownRootKey(String),
    #[error("'{key}': {reason}")]
    InvalidRootKey { key: String, reason: String },
    #[error("builder {index}: {reason}")]
    Builder { index: usize, reason: String },
    #[error("provisioner {index}: {reason}")]
    Provisioner { index: usize, reason: String },
    #[error("builder '{name}': {reason}")]
    Chroot { name: String, reason: String },
}

/// Todos los errores encontrados en una plantilla, en orden de aparición.
#[derive(Debug)]
pub struct TemplateErrors(pub Vec<TemplateError>);

impl TemplateErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateError> {
        self.0.iter()
    }

    /// Mensajes de cada error, útiles para aserciones y logs.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for TemplateErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            errs => {
                writeln!(f, "{} errors occurred:", errs.len())?;
                for err in errs {
                    writeln!(f, "\t* {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for TemplateErrors {}

impl From<TemplateError> for TemplateErrors {
    fn from(err: TemplateError) -> Self {
        TemplateErrors(vec![err])
    }
}
