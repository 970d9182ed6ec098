pub mod approval;
pub mod auth;
pub mod evaluation;

pub use approval::*;
pub use auth::*;
pub use evaluation::*;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{CoreError, CoreResult, FieldError};

/// Default and maximum page sizes accepted by list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Runs the derived validation rules and converts failures into `ValidationFailed`.
pub fn validated<T: Validate>(payload: T) -> CoreResult<T> {
    match payload.validate() {
        Ok(()) => Ok(payload),
        Err(errors) => {
            let mut fields = Vec::new();
            flatten_errors(None, &errors, &mut fields);
            fields.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
            Err(CoreError::ValidationFailed(fields))
        }
    }
}

fn flatten_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_errors(Some(&format!("{path}[{index}]")), inner, out);
                }
            }
        }
    }
}

/// Page number and size from a query string, clamped to sane bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    /// Zero-based offset and limit.
    pub fn bounds(&self) -> (u32, u32) {
        let size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        ((page - 1).saturating_mul(size), size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_bounds() {
        assert_eq!(PageQuery::default().bounds(), (0, DEFAULT_PAGE_SIZE));
        let query = PageQuery { page: Some(3), page_size: Some(10) };
        assert_eq!(query.bounds(), (20, 10));
        let query = PageQuery { page: Some(0), page_size: Some(1000) };
        assert_eq!(query.bounds(), (0, MAX_PAGE_SIZE));
    }
}
