pub mod auth;
pub mod dashboard;
pub mod stats;

use maud::{html, Markup, DOCTYPE};

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// A transient message shown in the corner and dismissed by the client script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}
impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

// === Layout ===
pub fn page(title: &str, user: Option<&User>, notices: &[Notice], body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · ToDo App" }
                script src="https://unpkg.com/htmx.org@1.9.10" {}
                script src="https://cdn.tailwindcss.com" {}
                script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js" defer {}
                script src="/assets/app.js" defer {}
            }
            body class="bg-white font-sans leading-normal tracking-normal" {
                div class="flex flex-col min-h-screen" {
                    (navbar(user))
                    main class="flex-grow pt-16 pb-16" { (body) }
                    (footer())
                }
                div id="toasts" class="fixed top-20 right-4 space-y-2 z-50" {
                    @for notice in notices {
                        (toast(notice))
                    }
                }
            }
        }
    }
}

fn navbar(user: Option<&User>) -> Markup {
    html! {
        nav class="fixed top-0 left-0 w-full flex items-center justify-between p-4 bg-slate-800 text-white shadow-md z-40" {
            a href="/tododashboard" class="text-xl font-bold" { "ToDo App" }
            div class="space-x-4 flex items-center" {
                @if let Some(user) = user {
                    span class="text-sm text-slate-300" { (user.display_name()) }
                    a href="/tododashboard" { "Dashboard" }
                    a href="/stats" { "Stats" }
                    button class="bg-red-600 hover:bg-red-700 text-white py-1 px-3 rounded" hx-post="/signout" hx-disabled-elt="this" { "Logout" }
                } @else {
                    a href="/auth/signin" { "Sign In" }
                    a href="/auth/signup" { "Sign Up" }
                }
            }
        }
    }
}

fn footer() -> Markup {
    html! {
        footer class="fixed bottom-0 left-0 w-full border-t border-gray-300 py-4 text-center text-sm bg-slate-800 text-white z-40" {
            "ToDo App · Axum + Maud + htmx"
        }
    }
}

// === Notifications ===
pub fn toast(notice: &Notice) -> Markup {
    let color = match notice.level {
        Level::Success => "bg-green-600",
        Level::Error => "bg-red-600",
    };
    html! {
        div class={"text-white rounded shadow-lg py-2 px-4 " (color)} role="status" data-toast=(level_name(notice.level)) {
            (notice.message)
        }
    }
}

/// Toast appended to `#toasts` alongside some other swapped content.
pub fn toast_oob(notice: &Notice) -> Markup {
    html! {
        div hx-swap-oob="beforeend:#toasts" { (toast(notice)) }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Success => "success",
        Level::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_escapes_message() {
        let markup = toast(&Notice::error("<b>nope</b>")).into_string();
        assert!(markup.contains("&lt;b&gt;nope&lt;/b&gt;"));
        assert!(markup.contains(r#"data-toast="error""#));
    }

    #[test]
    fn test_navbar_depends_on_user() {
        let user = User {
            id: uuid::Uuid::nil(),
            email: "ann@example.com".into(),
            username: None,
        };
        let signed_in = page("x", Some(&user), &[], html! {}).into_string();
        assert!(signed_in.contains("Logout"));
        assert!(signed_in.contains("ann@example.com"));
        let signed_out = page("x", None, &[], html! {}).into_string();
        assert!(signed_out.contains("Sign Up"));
        assert!(!signed_out.contains("Logout"));
    }
}
