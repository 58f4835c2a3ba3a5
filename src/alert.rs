//! Alert messages for HTMX responses.
//!
//! Alerts are swapped into the `#alert-container` element of the base page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A success or error message shown to the user after an HTMX request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::SuccessSimple { message } => (true, message, String::new()),
            Alert::Error { message, details } => (false, message, details),
            Alert::ErrorSimple { message } => (false, message, String::new()),
        };

        let style = if is_success {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400"
        } else {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400"
        };

        html! {
            div
                role="alert"
                class=(style)
            {
                p class="font-medium" { (message) }

                @if !details.is_empty() {
                    p { (details) }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
