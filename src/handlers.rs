use crate::{
    AppState,
    auth::{AdminUser, AuthUser, CurrentUser},
    error::AppError,
    forms::{CommentForm, FormErrors, LoginForm, PostForm, RegisterForm},
    models::{NewUser, PostInput},
    password,
    repository::constraints,
    sanitize,
    session::Session,
    views::{self, PageContext},
};
use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use validator::Validate;

// --- Flash Messages ---

pub const FLASH_EMAIL_TAKEN: &str = "You've already signed up with that email, log in instead!";
pub const FLASH_NAME_TAKEN: &str = "That name is already taken.";
pub const FLASH_UNKNOWN_EMAIL: &str = "That email does not exist, please try again.";
pub const FLASH_WRONG_PASSWORD: &str = "Password incorrect, please try again.";
pub const FLASH_LOGIN_TO_COMMENT: &str = "You need to login or register to comment.";

/// Display format of `Post::date`, e.g. "October 18, 2026".
pub const POST_DATE_FORMAT: &str = "%B %d, %Y";

/// Renders a page with the session's pending flashes and writes the drained
/// session back to the cookie.
fn render(mut session: Session, user: Option<&AuthUser>, page: impl FnOnce(&PageContext) -> String) -> Response {
    let ctx = PageContext::new(user, session.take_flashes());
    (session, Html(page(&ctx))).into_response()
}

fn redirect_with(session: Session, to: &str) -> Response {
    (session, Redirect::to(to)).into_response()
}

// --- Post Listing & Detail ---

/// get_all_posts
///
/// [Public Route] Lists every post with its author's name.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Post listing page"))
)]
pub async fn get_all_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Response, AppError> {
    let posts = state.repo.get_posts().await?;
    Ok(render(session, user.as_ref(), |ctx| views::index(ctx, &posts)))
}

/// show_post
///
/// [Public Route] Shows one post, its comments and the comment form.
#[utoipa::path(
    get,
    path = "/post/{post_id}",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post page"),
        (status = 404, description = "No such post")
    )
)]
pub async fn show_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Path(post_id): Path<i32>,
) -> Result<Response, AppError> {
    let post = state.repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;
    let comments = state.repo.get_comments(post_id).await?;
    Ok(render(session, user.as_ref(), |ctx| {
        views::post(ctx, &post, &comments, "", &FormErrors::new())
    }))
}

/// add_comment
///
/// [Public Route, login checked] Posts a comment on a post.
///
/// Anonymous visitors are redirected to the login page with a flash and no row
/// is written. The text is stripped of all markup before insertion, and the
/// handler redirects back to the post so a refresh cannot resubmit.
#[utoipa::path(
    post,
    path = "/post/{post_id}",
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment saved, or login required"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 404, description = "No such post")
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
    Path(post_id): Path<i32>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let post = state.repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;

    let Some(author) = user else {
        session.flash(FLASH_LOGIN_TO_COMMENT);
        return Ok(redirect_with(session, "/login"));
    };

    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let text = sanitize::strip_markup(&form.comment);
    let errors = match form.validate() {
        Err(e) => FormErrors::from(e),
        Ok(()) if text.is_empty() => FormErrors::new().with("comment", "Comment cannot be empty."),
        Ok(()) => FormErrors::new(),
    };

    if !errors.is_empty() {
        let comments = state.repo.get_comments(post_id).await?;
        return Ok(render(session, Some(&author), |ctx| {
            views::post(ctx, &post, &comments, &form.comment, &errors)
        }));
    }

    let comment = state.repo.add_comment(post_id, author.id, text).await?;
    tracing::info!(comment_id = comment.id, post_id, user_id = author.id, "comment added");

    Ok(redirect_with(session, &format!("/post/{post_id}")))
}

// --- Registration & Login ---

/// register_form
///
/// [Public Route] Renders the registration form.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form"))
)]
pub async fn register_form(CurrentUser(user): CurrentUser, session: Session) -> Response {
    render(session, user.as_ref(), |ctx| {
        views::register(ctx, &RegisterForm::default(), &FormErrors::new())
    })
}

/// register
///
/// [Public Route] Creates an account and logs it in.
///
/// A known email never creates a second row: the visitor is sent to the login
/// page with a flash instead.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered and logged in, or sent to login"),
        (status = 200, description = "Form re-rendered with errors")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Err(e) = form.validate() {
        let errors = FormErrors::from(e);
        return Ok(render(session, user.as_ref(), |ctx| views::register(ctx, &form, &errors)));
    }

    if state.repo.get_user_by_email(&form.email).await?.is_some() {
        session.flash(FLASH_EMAIL_TAKEN);
        return Ok(redirect_with(session, "/login"));
    }

    let password_hash = password::hash_password(form.password).await?;
    let new_user = NewUser {
        email: form.email,
        name: form.name,
        password_hash,
    };

    let created = match state.repo.create_user(new_user).await {
        Ok(created) => created,
        // Lost a race against a concurrent registration with the same email.
        Err(e) if e.is_conflict_on(constraints::USERS_EMAIL_KEY) => {
            session.flash(FLASH_EMAIL_TAKEN);
            return Ok(redirect_with(session, "/login"));
        }
        Err(e) if e.is_conflict_on(constraints::USERS_NAME_KEY) => {
            session.flash(FLASH_NAME_TAKEN);
            return Ok(redirect_with(session, "/register"));
        }
        Err(e) => return Err(e),
    };

    tracing::info!(user_id = created.id, role = %created.role, "user registered");
    session.login(created.id);
    Ok(redirect_with(session, "/"))
}

/// login_form
///
/// [Public Route] Renders the login form.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form"))
)]
pub async fn login_form(CurrentUser(user): CurrentUser, session: Session) -> Response {
    render(session, user.as_ref(), |ctx| {
        views::login(ctx, &LoginForm::default(), &FormErrors::new())
    })
}

/// login
///
/// [Public Route] Authenticates by email and password.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, or sent back with a flash"),
        (status = 200, description = "Form re-rendered with errors")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Err(e) = form.validate() {
        let errors = FormErrors::from(e);
        return Ok(render(session, user.as_ref(), |ctx| views::login(ctx, &form, &errors)));
    }

    let Some(found) = state.repo.get_user_by_email(&form.email).await? else {
        tracing::warn!("login attempt for unregistered email");
        session.flash(FLASH_UNKNOWN_EMAIL);
        return Ok(redirect_with(session, "/login"));
    };

    if !password::verify_password(form.password, found.password_hash).await? {
        tracing::warn!(user_id = found.id, "login attempt with wrong password");
        session.flash(FLASH_WRONG_PASSWORD);
        return Ok(redirect_with(session, "/login"));
    }

    tracing::info!(user_id = found.id, "user logged in");
    session.login(found.id);
    Ok(redirect_with(session, "/"))
}

/// logout
///
/// [Public Route] Drops the session's user. No precondition.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Logged out"))
)]
pub async fn logout(mut session: Session) -> Response {
    session.logout();
    redirect_with(session, "/")
}

// --- Admin: Post Management ---

/// new_post_form
///
/// [Admin Route] Renders an empty post form.
#[utoipa::path(
    get,
    path = "/new-post",
    responses(
        (status = 200, description = "Post form"),
        (status = 403, description = "Not the admin")
    )
)]
pub async fn new_post_form(AdminUser(admin): AdminUser, session: Session) -> Response {
    render(session, Some(&admin), |ctx| {
        views::make_post(ctx, &PostForm::default(), &FormErrors::new(), None)
    })
}

/// create_post
///
/// [Admin Route] Publishes a new post authored by the admin, dated today.
#[utoipa::path(
    post,
    path = "/new-post",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 403, description = "Not the admin")
    )
)]
pub async fn create_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    if let Err(e) = form.validate() {
        let errors = FormErrors::from(e);
        return Ok(render(session, Some(&admin), |ctx| views::make_post(ctx, &form, &errors, None)));
    }

    let date = chrono::Local::now().format(POST_DATE_FORMAT).to_string();
    match state.repo.create_post(PostInput::from(form.clone()), admin.id, date).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, user_id = admin.id, "post created");
            Ok(redirect_with(session, "/"))
        }
        Err(e) if e.is_conflict_on(constraints::BLOG_POSTS_TITLE_KEY) => {
            let errors = FormErrors::new().with("title", "A post with this title already exists.");
            Ok(render(session, Some(&admin), |ctx| views::make_post(ctx, &form, &errors, None)))
        }
        Err(e) => Err(e),
    }
}

/// edit_post_form
///
/// [Admin Route] Renders the post form pre-filled with the stored values.
#[utoipa::path(
    get,
    path = "/edit-post/{post_id}",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Pre-filled post form"),
        (status = 403, description = "Not the admin"),
        (status = 404, description = "No such post")
    )
)]
pub async fn edit_post_form(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path(post_id): Path<i32>,
) -> Result<Response, AppError> {
    let post = state.repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;
    let form = PostForm::from(&post);
    Ok(render(session, Some(&admin), |ctx| {
        views::make_post(ctx, &form, &FormErrors::new(), Some(post_id))
    }))
}

/// edit_post
///
/// [Admin Route] Overwrites a post in place and hands authorship to the editing admin.
#[utoipa::path(
    post,
    path = "/edit-post/{post_id}",
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated"),
        (status = 200, description = "Form re-rendered with errors"),
        (status = 403, description = "Not the admin"),
        (status = 404, description = "No such post")
    )
)]
pub async fn edit_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    session: Session,
    Path(post_id): Path<i32>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, AppError> {
    // A missing post is a 404 whatever the body holds.
    state.repo.get_post(post_id).await?.ok_or(AppError::NotFound)?;

    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    if let Err(e) = form.validate() {
        let errors = FormErrors::from(e);
        return Ok(render(session, Some(&admin), |ctx| {
            views::make_post(ctx, &form, &errors, Some(post_id))
        }));
    }

    match state.repo.update_post(post_id, PostInput::from(form.clone()), admin.id).await {
        Ok(Some(post)) => {
            tracing::info!(post_id = post.id, user_id = admin.id, "post updated");
            Ok(redirect_with(session, &format!("/post/{post_id}")))
        }
        // Deleted between the existence check and the update.
        Ok(None) => Err(AppError::NotFound),
        Err(e) if e.is_conflict_on(constraints::BLOG_POSTS_TITLE_KEY) => {
            let errors = FormErrors::new().with("title", "A post with this title already exists.");
            Ok(render(session, Some(&admin), |ctx| {
                views::make_post(ctx, &form, &errors, Some(post_id))
            }))
        }
        Err(e) => Err(e),
    }
}

/// delete_post
///
/// [Admin Route] Removes a post together with its comments.
#[utoipa::path(
    get,
    path = "/delete/{post_id}",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted"),
        (status = 403, description = "Not the admin"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<Redirect, AppError> {
    if state.repo.delete_post(post_id).await? {
        tracing::info!(post_id, user_id = admin.id, "post deleted");
        Ok(Redirect::to("/"))
    } else {
        Err(AppError::NotFound)
    }
}

// --- Static Pages ---

/// about
///
/// [Public Route] Static "About" page.
#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page"))
)]
pub async fn about(CurrentUser(user): CurrentUser, session: Session) -> Response {
    render(session, user.as_ref(), views::about)
}

/// contact
///
/// [Public Route] Static "Contact" page.
#[utoipa::path(
    get,
    path = "/contact",
    responses((status = 200, description = "Contact page"))
)]
pub async fn contact(CurrentUser(user): CurrentUser, session: Session) -> Response {
    render(session, user.as_ref(), views::contact)
}
