//! JSON body extractor that runs `validator` rules before the handler.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use backoffice_core::error::{AppError, FieldErrors};

use crate::error::ApiError;

/// A deserialized and validated JSON body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

/// Convert `validator` output into per-field messages.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("The {field} field is invalid."),
            })
            .collect();
        fields.insert(field.to_string(), messages);
    }
    AppError::validation_fields(fields)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1, message = "The name field is required."))]
        name: String,
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_rule_violations_become_field_errors() {
        let err = ValidatedJson::<Named>::from_request(request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        let fields = err.0.fields.unwrap();
        assert_eq!(fields["name"], ["The name field is required."]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let err = ValidatedJson::<Named>::from_request(request("{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.0.kind, backoffice_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(named) = ValidatedJson::<Named>::from_request(request(r#"{"name":"ok"}"#), &())
            .await
            .unwrap();
        assert_eq!(named.name, "ok");
    }
}
