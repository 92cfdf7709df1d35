//! HTML rendering for every page of the blog.
//!
//! Pages are plain `String`s built with `format!`. Every value that came from a
//! user goes through [`escape`]; only the admin-authored post body is inserted
//! as raw HTML.

use axum::http::StatusCode;
use std::fmt::Write;

use crate::{
    auth::AuthUser,
    forms::{FormErrors, LoginForm, PostForm, RegisterForm},
    models::{Comment, Post},
};

/// PageContext
///
/// Per-request values every page needs: the authentication flag, whether to
/// show admin controls, and the flash messages consumed by this render.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub logged_in: bool,
    pub is_admin: bool,
    pub flashes: Vec<String>,
}

impl PageContext {
    pub fn new(user: Option<&AuthUser>, flashes: Vec<String>) -> Self {
        PageContext {
            logged_in: user.is_some(),
            is_admin: user.is_some_and(AuthUser::is_admin),
            flashes,
        }
    }
}

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, ctx: &PageContext, content: &str) -> String {
    let auth_links = if ctx.logged_in {
        r#"<li><a href="/logout">Log Out</a></li>"#.to_string()
    } else {
        r#"<li><a href="/login">Login</a></li><li><a href="/register">Register</a></li>"#.to_string()
    };

    let flashes: String = ctx
        .flashes
        .iter()
        .map(|message| format!(r#"<p class="flash">{}</p>"#, escape(message)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<nav>
<ul>
<li><a href="/">Home</a></li>
{auth_links}
<li><a href="/about">About</a></li>
<li><a href="/contact">Contact</a></li>
</ul>
</nav>
<main>
{flashes}
{content}
</main>
<footer><p>Copyright &copy; Blog Portal</p></footer>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .for_field(field)
        .map(|message| format!(r#"<span class="error">{}</span>"#, escape(message)))
        .collect()
}

fn input(errors: &FormErrors, name: &str, label: &str, kind: &str, value: &str) -> String {
    format!(
        r#"<p><label for="{name}">{label}</label>
<input id="{name}" name="{name}" type="{kind}" value="{value}">{errs}</p>
"#,
        value = escape(value),
        errs = field_errors(errors, name),
    )
}

fn textarea(errors: &FormErrors, name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<p><label for="{name}">{label}</label>
<textarea id="{name}" name="{name}">{value}</textarea>{errs}</p>
"#,
        value = escape(value),
        errs = field_errors(errors, name),
    )
}

/// The post listing (GET /).
pub fn index(ctx: &PageContext, posts: &[Post]) -> String {
    let mut content = String::from("<h1>Blog Portal</h1>\n");

    for post in posts {
        let _ = write!(
            content,
            r#"<div class="post-preview">
<a href="/post/{id}"><h2>{title}</h2><h3>{subtitle}</h3></a>
<p class="post-meta">Posted by {author} on {date}"#,
            id = post.id,
            title = escape(&post.title),
            subtitle = escape(&post.subtitle),
            author = escape(post.author_name.as_deref().unwrap_or("Unknown")),
            date = escape(&post.date),
        );
        if ctx.is_admin {
            let _ = write!(content, r#" <a href="/delete/{}">✘</a>"#, post.id);
        }
        content.push_str("</p>\n</div>\n<hr>\n");
    }

    if ctx.is_admin {
        content.push_str(r#"<p><a class="button" href="/new-post">Create New Post</a></p>"#);
    }

    layout("Blog Portal", ctx, &content)
}

/// A single post with its comments and the comment form (GET /post/{id}).
pub fn post(ctx: &PageContext, post: &Post, comments: &[Comment], draft: &str, errors: &FormErrors) -> String {
    let mut content = format!(
        r#"<header style="background-image: url('{img}')">
<h1>{title}</h1>
<h2>{subtitle}</h2>
<p class="post-meta">Posted by {author} on {date}</p>
</header>
<article>
{body}
</article>
"#,
        img = escape(&post.img_url),
        title = escape(&post.title),
        subtitle = escape(&post.subtitle),
        author = escape(post.author_name.as_deref().unwrap_or("Unknown")),
        date = escape(&post.date),
        body = post.body,
    );

    if ctx.is_admin {
        let _ = writeln!(content, r#"<p><a class="button" href="/edit-post/{}">Edit Post</a></p>"#, post.id);
    }

    let _ = write!(
        content,
        r#"<form method="post" action="/post/{id}">
{comment}<button type="submit">Submit Comment</button>
</form>
<ul class="comment-list">
"#,
        id = post.id,
        comment = textarea(errors, "comment", "Comment", draft),
    );

    for comment in comments {
        let _ = writeln!(
            content,
            r#"<li><p>{text}</p><span class="comment-author">{author}</span></li>"#,
            text = escape(&comment.text),
            author = escape(comment.author_name.as_deref().unwrap_or("Unknown")),
        );
    }
    content.push_str("</ul>\n");

    layout(&post.title, ctx, &content)
}

/// Create or edit form for a post. `edit_id` switches the heading and target.
pub fn make_post(ctx: &PageContext, form: &PostForm, errors: &FormErrors, edit_id: Option<i32>) -> String {
    let (heading, action) = match edit_id {
        Some(id) => ("Edit Post".to_string(), format!("/edit-post/{id}")),
        None => ("New Post".to_string(), "/new-post".to_string()),
    };

    let content = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
{title}{subtitle}{img}{body}<button type="submit">Submit Post</button>
</form>
"#,
        title = input(errors, "title", "Blog Post Title", "text", &form.title),
        subtitle = input(errors, "subtitle", "Subtitle", "text", &form.subtitle),
        img = input(errors, "img_url", "Blog Image URL", "url", &form.img_url),
        body = textarea(errors, "body", "Blog Content", &form.body),
    );

    layout(&heading, ctx, &content)
}

/// Registration form. The password is never echoed back.
pub fn register(ctx: &PageContext, form: &RegisterForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Register</h1>
<form method="post" action="/register">
{email}{password}{name}<button type="submit">Sign Me Up!</button>
</form>
"#,
        email = input(errors, "email", "Email", "email", &form.email),
        password = input(errors, "password", "Password", "password", ""),
        name = input(errors, "name", "Name", "text", &form.name),
    );
    layout("Register", ctx, &content)
}

pub fn login(ctx: &PageContext, form: &LoginForm, errors: &FormErrors) -> String {
    let content = format!(
        r#"<h1>Log In</h1>
<form method="post" action="/login">
{email}{password}<button type="submit">Let Me In!</button>
</form>
"#,
        email = input(errors, "email", "Email", "email", &form.email),
        password = input(errors, "password", "Password", "password", ""),
    );
    layout("Log In", ctx, &content)
}

pub fn about(ctx: &PageContext) -> String {
    let content = r#"<h1>About Me</h1>
<p>This is what I do.</p>
<p>A small blog about the things I build, the books I read and the places I visit.</p>
"#;
    layout("About", ctx, content)
}

pub fn contact(ctx: &PageContext) -> String {
    let content = r#"<h1>Contact Me</h1>
<p>Have questions? I have answers.</p>
<p>Drop me a line and I will get back to you as soon as possible.</p>
"#;
    layout("Contact", ctx, content)
}

/// Bare page used by `AppError` responses.
pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{code} {reason}</title></head>
<body><h1>{code} {reason}</h1><p><a href="/">Back to the blog</a></p></body>
</html>
"#,
        code = status.as_u16(),
    )
}
