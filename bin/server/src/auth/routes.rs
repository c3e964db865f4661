//! Authentication routes.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::{AppState, request_cookies, with_cookies};

/// Ends the session and sends the browser to the login page.
///
/// The auth cookies are cleared even when the provider cannot be reached.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let mutations = state.gate.sign_out(&request_cookies(&jar)).await;
    let login = state.gate.routes().login_path();

    with_cookies(Redirect::to(login).into_response(), &mutations)
}
