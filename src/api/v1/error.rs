use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, err.status()))
    } else if err.is_not_found() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::NotFound,
            ApiErrorCode::NotFound.to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::NOT_FOUND))
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::MethodNotAllowed,
            ApiErrorCode::MethodNotAllowed.to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::METHOD_NOT_ALLOWED))
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::BadRequest,
            ApiErrorCode::BadRequest.to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::BAD_REQUEST))
    } else {
        let json = warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                code: ApiErrorCode::InternalError,
                message: format!("Unhandled error: {:?}", err),
            }),
        });
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Missing or invalid bearer token header")]
    MissingBearer,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Token has been revoked")]
    RevokedToken,
    #[error("Wrong kind of token for this endpoint")]
    WrongTokenType,
    #[error("Token rotation is busy, retry shortly")]
    RetryLater,
    #[error("Malformed request body")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        error!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MissingBearer
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::ExpiredToken
            | ApiErrorCode::RevokedToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::WrongTokenType | ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::RetryLater => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<TokenError> for ApiErrorCode {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Malformed => ApiErrorCode::InvalidToken,
            TokenError::Expired => ApiErrorCode::ExpiredToken,
            TokenError::Revoked => ApiErrorCode::RevokedToken,
            TokenError::WrongTokenType => ApiErrorCode::WrongTokenType,
            TokenError::LockTimeout => ApiErrorCode::RetryLater,
            TokenError::StoreFailure(e) => ApiErrorCode::internal(e),
        }
    }
}
