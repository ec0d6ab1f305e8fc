use std::borrow::Cow;

/// Errors raised by the decorator registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The value handed to registration is not a decorator of the requested signature.
    #[error("Invalid decorator{}: {message}", format_context(.context))]
    InvalidDecorator { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The target cannot carry decorator annotations (native or non-function value).
    #[error("Invalid target{}: {message}", format_context(.context))]
    InvalidTarget { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Loading [`RegistryConfig`](crate::RegistryConfig) failed.
    #[error("Config error{}: {source}", format_context(.context))]
    Config {
        #[source]
        source: config::ConfigError,
        context: Option<Cow<'static, str>>,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Adds `.context(...)` to registry results and to results convertible into them.
pub trait RegistryErrorExt<T> {
    /// Attaches a human-readable context to the error, if any.
    ///
    /// # Errors
    /// Returns the original error, converted into [`RegistryError`], with the context set.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> RegistryErrorExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                RegistryError::InvalidDecorator { context: c, .. }
                | RegistryError::InvalidTarget { context: c, .. }
                | RegistryError::Config { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> RegistryErrorExt<T> for std::result::Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| RegistryError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for RegistryError {
    #[inline]
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

#[allow(clippy::ref_option)]
fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err: Result<()> = Err(RegistryError::InvalidTarget {
            message: "native function".into(),
            context: None,
        });
        let err = err.context("querying annotations").unwrap_err();
        assert_eq!(err.to_string(), "Invalid target (querying annotations): native function");
    }

    #[test]
    fn display_without_context() {
        let err = RegistryError::InvalidDecorator { message: "i32".into(), context: None };
        assert_eq!(err.to_string(), "Invalid decorator: i32");
    }
}
