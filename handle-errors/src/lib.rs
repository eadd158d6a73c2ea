use serde::Serialize;
use warp::{
    Rejection, Reply,
    filters::{body::BodyDeserializeError, cors::CorsForbidden},
    http::StatusCode,
    reject::Reject,
};

use reqwest::Error as ReqwestError;

use tracing::{Level, event, instrument};

#[derive(Debug)]
pub enum Error {
    ConfigError(config::ConfigError),
    InvalidAddress(std::net::AddrParseError),
    MissingPrompt,
    InvalidBody(String),
    MethodNotAllowed,
    ReqwestAPIError(ReqwestError),
    AssetError(UpstreamError), // a static document answered with a non-success status
    UpstreamError(UpstreamError), // the generative-language API answered with a non-success status
    EmptyCompletion,
}

#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Status: {}, Message: {}", self.status, self.message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ConfigError(err) => {
                write!(f, "Cannot read configuration: {}", err)
            }
            Error::InvalidAddress(err) => {
                write!(f, "Cannot parse listen address: {}", err)
            }
            Error::MissingPrompt => {
                write!(f, "prompt is required")
            }
            Error::InvalidBody(msg) => {
                write!(f, "{}", msg)
            }
            Error::MethodNotAllowed => {
                write!(f, "Method Not Allowed")
            }
            Error::ReqwestAPIError(err) => {
                write!(f, "External API error: {}", err)
            }
            Error::AssetError(err) => {
                write!(f, "Asset unavailable: {}", err)
            }
            // upstream text is relayed verbatim so the caller sees what the API said
            Error::UpstreamError(err) => {
                write!(f, "Gemini API error: {}", err.message)
            }
            Error::EmptyCompletion => {
                write!(f, "No content returned from Gemini")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Reject for Error {}
impl Reject for UpstreamError {}

/// JSON body of every error answered by the `/api` routes.
#[derive(Serialize, Debug)]
pub struct ErrorMessage {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingPrompt | Error::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[instrument]
pub async fn return_error(r: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(error) = r.find::<Error>() {
        let status = error.status_code();
        if status.is_server_error() {
            event!(Level::ERROR, "{}", error);
        } else {
            event!(Level::WARN, "{}", error);
        }
        Ok(warp::reply::with_status(
            warp::reply::json(&ErrorMessage {
                error: error.to_string(),
            }),
            status,
        )
        .into_response())
    } else if let Some(error) = r.find::<CorsForbidden>() {
        event!(Level::ERROR, "CORS forbidden error: {}", error);
        Ok(warp::reply::with_status(error.to_string(), StatusCode::FORBIDDEN).into_response())
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "Cannot deserialize request body: {}", error);
        Ok(
            warp::reply::with_status(error.to_string(), StatusCode::UNPROCESSABLE_ENTITY)
                .into_response(),
        )
    } else {
        event!(Level::WARN, "Requested route was not found");
        Ok(
            warp::reply::with_status("Route not found".to_string(), StatusCode::NOT_FOUND)
                .into_response(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_of(rejection: Rejection) -> StatusCode {
        return_error(rejection).await.unwrap().into_response().status()
    }

    #[tokio::test]
    async fn missing_prompt_is_a_client_error() {
        let status = status_of(warp::reject::custom(Error::MissingPrompt)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_is_a_server_error() {
        let err = Error::UpstreamError(UpstreamError {
            status: 503,
            message: "overloaded".to_string(),
        });
        assert_eq!(err.to_string(), "Gemini API error: overloaded");
        let status = status_of(warp::reject::custom(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn wrong_method_on_api_route() {
        let status = status_of(warp::reject::custom(Error::MethodNotAllowed)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_rejection_is_not_found() {
        assert_eq!(status_of(warp::reject::not_found()).await, StatusCode::NOT_FOUND);
    }
}
