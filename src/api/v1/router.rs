use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let refresh = warp::path("refresh_token")
        .and(warp::path::end())
        .and(warp::post())
        .and(bearer())
        .and(with(session_service.clone()))
        .and_then(handler::refresh_token);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_verification(session_service.clone()))
        .and(with(session_service.clone()))
        .and_then(handler::logout);

    let session = warp::path("session")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(session_service.clone()))
        .and_then(handler::current_session);

    let complete_reset = warp::path("reset_password")
        .and(warp::path("complete"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with(session_service))
        .and_then(handler::complete_reset);

    refresh.or(logout).or(session).or(complete_reset)
}

/// `routes` mounted under `/api/v1` with rejections turned into JSON replies.
pub fn api(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(session_service))
        .recover(recover_error)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn bearer() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        |header: Option<String>| async move {
            header
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_string)
                .ok_or_else(|| reject::custom(ApiErrorCode::MissingBearer))
        },
    )
}

fn with_verification(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (Claim,), Error = warp::Rejection> + Clone {
    bearer().and_then(move |token: String| {
        let session_service = session_service.clone();
        async move {
            session_service
                .validate(&token, TokenType::Access)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}
