//! Account endpoints: sign up, log in, log out.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use yatube_common::{AppError, AppResult};
use yatube_core::SignupInput;
use yatube_db::entities::user;

use crate::{
    extractors::MaybeAuthUser,
    forms::{LoginForm, NextQuery, SignupForm, safe_next},
    middleware::{AppState, SESSION_COOKIE},
    views::{LoginPage, SignupPage},
};

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
}

async fn signup_form() -> Html<String> {
    Html(SignupPage::default().render())
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let input = SignupInput {
        username: form.username.clone(),
        name: Some(form.name.clone()),
        password: form.password,
        password_confirm: form.password_confirm,
    };

    match state.user_service.signup(input).await {
        Ok(user) => Ok((start_session(jar, &user)?, Redirect::to("/")).into_response()),
        Err(AppError::InvalidForm(errors)) => {
            let page = SignupPage {
                username: form.username,
                name: form.name,
                errors,
            };
            Ok(Html(page.render()).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn login_form(Query(query): Query<NextQuery>) -> Html<String> {
    let page = LoginPage {
        next: safe_next(query.next.as_deref()).map(str::to_string),
        ..Default::default()
    };
    Html(page.render())
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(form.next.as_deref()).map(str::to_string);

    match state
        .user_service
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let to = next.unwrap_or_else(|| "/".to_string());
            Ok((start_session(jar, &user)?, Redirect::to(&to)).into_response())
        }
        Err(AppError::Unauthorized) => {
            let page = LoginPage {
                next,
                username: form.username,
                error: Some(INVALID_LOGIN.to_string()),
            };
            Ok(Html(page.render()).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    if let Some(user) = user {
        state.user_service.logout(&user.id).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")))
}

fn start_session(jar: CookieJar, user: &user::Model) -> AppResult<CookieJar> {
    let token = user
        .token
        .clone()
        .ok_or_else(|| AppError::Internal(format!("User {} has no session token", user.id)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}
