use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            GoogleAuthRequest, LoginRequest, LoginResponse, PublicUser, RegisterRequest,
            RegisterResponse,
        },
        google::GoogleIdentity,
        jwt::JwtKeys,
        password::{hash_password, unusable_password_hash, verify_password},
        repo_types::{NewUser, User},
    },
    error::{required, AppError, AppResult},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const BAD_CREDENTIALS: &str = "Invalid email/username or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/google-auth", post(google_auth))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let username = required(payload.username, "username")?;
    let email = required(payload.email, "email")?.to_lowercase();
    // Passwords are not trimmed.
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".into()))?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Email format is wrong".into()));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Validation("Email already exists".into()));
    }
    if state.users.find_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already taken");
        return Err(AppError::Validation("Username already exists".into()));
    }

    let hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err(AppError::Internal(e));
        }
    };

    let user = state
        .users
        .create(NewUser {
            username,
            email,
            password_hash: hash,
            google_id: None,
            picture: None,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            message: "User registered successfully",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let login = required(payload.email_or_username, "emailOrUsername")?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".into()))?;

    // Emails are stored lower-cased; usernames are matched as typed.
    let user = match state.users.find_by_login(&login).await? {
        Some(u) => Some(u),
        None => state.users.find_by_email(&login.to_lowercase()).await?,
    };
    let Some(user) = user else {
        warn!(login = %login, "login unknown user");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    let ok = match verify_password(&password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err(AppError::Internal(e));
        }
    };
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    info!(user_id = %user.id, "user logged in");
    issue_token(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn google_auth(
    State(state): State<AppState>,
    Json(payload): Json<GoogleAuthRequest>,
) -> AppResult<Json<LoginResponse>> {
    let credential = required(payload.credential, "credential")?;

    let identity = match state.google.verify(&credential).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "google credential rejected");
            return Err(AppError::Unauthorized("Invalid Google credential".into()));
        }
    };

    let user = match find_google_user(&state, &identity).await? {
        Some(u) => u,
        None => create_google_user(&state, identity).await?,
    };

    info!(user_id = %user.id, "user signed in with google");
    issue_token(&state, user)
}

async fn find_google_user(state: &AppState, identity: &GoogleIdentity) -> AppResult<Option<User>> {
    if let Some(user) = state.users.find_by_google_id(&identity.google_id).await? {
        return Ok(Some(user));
    }
    Ok(state.users.find_by_email(&identity.email).await?)
}

async fn create_google_user(state: &AppState, identity: GoogleIdentity) -> AppResult<User> {
    let base = identity
        .name
        .clone()
        .unwrap_or_else(|| identity.email.split('@').next().unwrap_or_default().to_string());
    let username = if state.users.find_by_username(&base).await?.is_some() {
        let suffix: String = identity.google_id.chars().take(6).collect();
        format!("{}_{}", base, suffix)
    } else {
        base
    };

    let user = state
        .users
        .create(NewUser {
            username,
            email: identity.email,
            password_hash: unusable_password_hash()?,
            google_id: Some(identity.google_id),
            picture: identity.picture,
        })
        .await?;
    info!(user_id = %user.id, "user created from google sign-in");
    Ok(user)
}

fn issue_token(state: &AppState, user: User) -> AppResult<Json<LoginResponse>> {
    let keys = JwtKeys::from_ref(state);
    let access_token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err(AppError::Internal(e));
        }
    };
    Ok(Json(LoginResponse {
        access_token,
        user: PublicUser::from(user),
    }))
}
