use std::fmt::{Display, Formatter};

pub type FnResult<T> = Result<T, FnError>;

/// The kind of remote entity a name lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Compartment,
    Application,
    Function,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Compartment => write!(f, "compartment"),
            ResourceKind::Application => write!(f, "application"),
            ResourceKind::Function => write!(f, "function"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FnError {
    /// Bad or missing local input: environment, flags, key material, client setup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A display name did not resolve at the given scope.
    #[error("could not find {kind} '{name}' in {scope}")]
    NotFound {
        kind: ResourceKind,
        name: String,
        scope: String,
    },
    /// The remote call itself failed.
    #[error("{operation} failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    Upstream {
        operation: String,
        status: Option<u16>,
        message: String,
    },
}

impl FnError {
    pub fn config(msg: impl Into<String>) -> Self {
        FnError::Configuration(msg.into())
    }

    pub fn not_found(kind: ResourceKind, name: &str, scope: impl Into<String>) -> Self {
        FnError::NotFound {
            kind,
            name: name.to_string(),
            scope: scope.into(),
        }
    }

    pub fn upstream(operation: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        FnError::Upstream {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FnError::NotFound { .. })
    }
}
