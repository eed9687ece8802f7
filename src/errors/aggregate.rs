use std::fmt;

use super::Error;

/// Every error recorded during a single extend pass.
///
/// Errors are only ever appended. An empty aggregate means the pass was
/// clean; [`PatchErrors::into_result`] turns that into `Ok(())`.
#[derive(Debug, Default)]
pub struct PatchErrors {
    errors: Vec<Error>,
}

impl PatchErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<Error> {
        self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise the aggregate itself.
    pub fn into_result(self) -> Result<(), PatchErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Extend<Error> for PatchErrors {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for PatchErrors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for PatchErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no errors occurred"),
            [only] => write!(f, "1 error occurred:\n\t* {only}"),
            errors => {
                write!(f, "{} errors occurred:", errors.len())?;
                for error in errors {
                    write!(f, "\n\t* {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PatchErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_aggregate_is_ok() {
        let errors = PatchErrors::new();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn display_lists_every_error() {
        let mut errors = PatchErrors::new();
        errors.push(Error::internal("first"));
        errors.push(Error::UnsupportedResource {
            name: "eds".to_string(),
            type_url: "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment"
                .to_string(),
        });

        let text = errors.to_string();
        assert!(text.starts_with("2 errors occurred:"));
        assert!(text.contains("Internal error: first"));
        assert!(text.contains("unsupported type was skipped: 'eds'"));

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn single_error_display() {
        let mut errors = PatchErrors::new();
        errors.push(Error::internal("only"));
        assert_eq!(errors.to_string(), "1 error occurred:\n\t* Internal error: only");
    }

    #[test]
    fn extend_appends() {
        let mut errors = PatchErrors::new();
        errors.push(Error::internal("a"));
        errors.extend(vec![Error::internal("b"), Error::internal("c")]);
        let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec!["Internal error: a", "Internal error: b", "Internal error: c"]
        );
    }
}
