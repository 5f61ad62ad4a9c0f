use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub async fn refresh_token(
    refresh_token: String,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = session_service
        .refresh(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: usize,
}

pub async fn logout(
    claim: Claim,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let revoked = session_service
        .logout(claim.subject)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse { revoked })))
}

pub async fn current_session(claim: Claim) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(claim)))
}

#[derive(Debug, Deserialize)]
pub struct CompleteResetRequest {
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteResetResponse {
    pub subject: Subject,
}

pub async fn complete_reset(
    body: CompleteResetRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let subject = session_service
        .complete_reset(&body.reset_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(CompleteResetResponse {
        subject,
    })))
}
