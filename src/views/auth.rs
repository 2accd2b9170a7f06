use maud::{html, Markup};

use super::{page, Notice};

const FORM_CLASS: &str = "w-full max-w-md bg-white p-6 rounded-2xl shadow-xl space-y-6";
const INPUT_CLASS: &str = "w-full border rounded p-2";
const LABEL_CLASS: &str = "block text-sm font-medium text-slate-700";

pub fn signin_page(notices: &[Notice]) -> Markup {
    page(
        "Sign In",
        None,
        notices,
        html! {
            section class="min-h-full flex items-center justify-center px-4 py-12" {
                form class=(FORM_CLASS) method="post" action="/auth/signin" hx-post="/auth/signin" hx-disabled-elt="find button[type='submit']" {
                    h1 class="text-2xl font-bold text-center mb-4 text-slate-900" { "Sign In" }
                    div {
                        label for="email" class=(LABEL_CLASS) { "Email" }
                        input class=(INPUT_CLASS) type="email" name="email" id="email" placeholder="Enter your email" required;
                    }
                    div {
                        label for="password" class=(LABEL_CLASS) { "Password" }
                        (password_input("password", "password", "Enter your password"))
                    }
                    button type="submit" class="w-full bg-slate-800 hover:bg-slate-700 text-white font-bold py-2 px-4 rounded" { "Sign In" }
                    p class="text-center text-sm text-slate-600" {
                        "Don't have an account? "
                        a href="/auth/signup" class="text-blue-600 hover:underline" { "Sign up" }
                    }
                }
            }
        },
    )
}

/// `error` is shown in the inline slot, for plain form posts that failed.
pub fn signup_page(error: Option<&str>) -> Markup {
    page(
        "Sign Up",
        None,
        &[],
        html! {
            div class="min-h-full flex items-center justify-center px-4 py-12" {
                form class=(FORM_CLASS) method="post" action="/auth/signup" hx-post="/auth/signup" hx-target="#signup-error"
                    hx-disabled-elt="find button[type='submit']" {
                    h1 class="text-2xl font-bold text-center mb-4 text-slate-900" { "Sign Up" }
                    input class=(INPUT_CLASS) type="text" name="username" placeholder="Username" required;
                    input class=(INPUT_CLASS) type="email" name="email" placeholder="Email" required;
                    (password_input("signup-password", "password", "Password"))
                    (password_input("signup-confirm", "confirm_password", "Confirm Password"))
                    div id="signup-error" {
                        @if let Some(message) = error {
                            (form_error(message))
                        }
                    }
                    button type="submit" class="w-full bg-slate-800 hover:bg-slate-700 text-white font-bold py-2 px-4 rounded" { "Sign Up" }
                    p class="text-center text-sm text-slate-600" {
                        "Already have an account? "
                        a href="/auth/signin" class="text-blue-600 hover:underline" { "Sign in" }
                    }
                }
            }
        },
    )
}

// password field with a show/hide toggle handled by app.js
fn password_input(id: &str, name: &str, placeholder: &str) -> Markup {
    html! {
        div class="relative" {
            input class=(INPUT_CLASS) type="password" id=(id) name=(name) placeholder=(placeholder) required;
            button type="button" class="absolute right-3 top-1/2 -translate-y-1/2 text-slate-500" title="Show password" data-toggle-password=(id) { "👁" }
        }
    }
}

/// Inline message under the sign-up form.
pub fn form_error(message: &str) -> Markup {
    html! {
        p class="text-red-500 text-sm text-center" { (message) }
    }
}
