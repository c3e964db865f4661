//! Request gating middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use remusic_admin_access::{CookieMutation, Identity, RequestCookies, RouteDecision};
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::AppState;

/// Identity of the signed-in user, placed in request extensions by
/// [`gate_requests`] when the request is let through.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Runs the access gate on every request.
///
/// Allowed requests continue to the router; everything else gets a
/// `307 Temporary Redirect`. Cookie mutations from session resolution are
/// attached to the response either way.
pub async fn gate_requests(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookies = request_cookies(&jar);
    let path = request.uri().path().to_owned();
    let outcome = state.gate.evaluate(&path, &cookies).await;

    let response = match outcome.decision {
        RouteDecision::Continue => {
            if let Some(identity) = outcome.identity {
                request.extensions_mut().insert(CurrentUser(identity));
            }
            next.run(request).await
        }
        RouteDecision::RedirectTo(target) | RouteDecision::Block(target) => {
            Redirect::temporary(&target).into_response()
        }
    };

    with_cookies(response, &outcome.cookies)
}

/// Collects the request's cookies for the gate.
pub fn request_cookies(jar: &CookieJar) -> RequestCookies {
    jar.iter()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

/// Attaches cookie mutations to a response.
pub fn with_cookies(response: Response, mutations: &[CookieMutation]) -> Response {
    if mutations.is_empty() {
        return response;
    }
    let jar = mutations
        .iter()
        .fold(CookieJar::new(), |jar, mutation| jar.add(to_cookie(mutation)));
    (jar, response).into_response()
}

fn to_cookie(mutation: &CookieMutation) -> Cookie<'static> {
    let options = &mutation.options;
    let mut cookie = Cookie::build((mutation.name.clone(), mutation.value.clone()))
        .http_only(options.http_only)
        .secure(options.secure);

    if let Some(path) = &options.path {
        cookie = cookie.path(path.clone());
    }
    if let Some(domain) = &options.domain {
        cookie = cookie.domain(domain.clone());
    }
    if let Some(seconds) = options.max_age_secs {
        cookie = cookie.max_age(TimeDuration::seconds(seconds));
    }
    if let Some(same_site) = options.same_site {
        cookie = cookie.same_site(match same_site {
            remusic_admin_access::SameSite::Lax => SameSite::Lax,
            remusic_admin_access::SameSite::Strict => SameSite::Strict,
            remusic_admin_access::SameSite::None => SameSite::None,
        });
    }

    cookie.build()
}
