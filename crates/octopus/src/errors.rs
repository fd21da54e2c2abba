use audit::ApiError;
use thiserror::Error;

/// Failures while setting up a connection to an Octopus server.
///
/// Once a client exists, request failures surface as [`ApiError`] through
/// the [`audit::OctopusApi`] port instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the URL \"{url}\" is not valid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("the credential contains characters that cannot be sent in a header")]
    InvalidCredential,

    #[error("failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("did not find space with name {name}")]
    SpaceNotFound { name: String },

    #[error("space lookup failed: {0}")]
    SpaceLookup(#[from] ApiError),
}

/// Maps a transport-level failure onto the port's error shape.
pub(crate) fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

/// Builds an [`ApiError`] from a non-success response body.
///
/// Octopus reports failures as `{"ErrorMessage": "...", "Errors": [...]}`;
/// anything else falls back to the raw body, then to the status reason.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> ApiError {
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct OctopusErrorBody {
        error_message: String,
        #[serde(default)]
        errors: Vec<String>,
    }

    let message = match serde_json::from_str::<OctopusErrorBody>(body) {
        Ok(parsed) if parsed.errors.is_empty() => parsed.error_message,
        Ok(parsed) => format!("{} {}", parsed.error_message, parsed.errors.join(" ")),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    ApiError::with_status(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn octopus_error_body_supplies_message() {
        let err = status_error(
            StatusCode::FORBIDDEN,
            r#"{"ErrorMessage":"You do not have permission to perform this action.","Errors":[]}"#,
        );

        assert_eq!(err.status, Some(403));
        assert_eq!(
            err.message,
            "You do not have permission to perform this action."
        );
    }

    #[test]
    fn detail_errors_are_appended() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"ErrorMessage":"Validation failed.","Errors":["Name is required."]}"#,
        );

        assert_eq!(err.message, "Validation failed. Name is required.");
    }

    #[test]
    fn plain_body_is_used_verbatim() {
        let err = status_error(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(err.message, "upstream down");
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        let err = status_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, "Not Found");
    }
}
