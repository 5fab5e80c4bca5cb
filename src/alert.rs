//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into `#alert-container` on the base page, either as
//! the target of an htmx error response or as an out-of-band swap.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    /// The alert's contents, swapped into `#alert-container`.
    pub fn into_html(self) -> Markup {
        let is_error = self.is_error();
        let (message, details) = match self {
            Alert::Success { message, details } | Alert::Error { message, details } => {
                (message, details)
            }
            Alert::SuccessSimple { message } | Alert::ErrorSimple { message } => {
                (message, String::new())
            }
        };
        let style = if is_error {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
        } else {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400"
        };

        html! {
            div id="alert-container" hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div role="alert" class=(style)
                {
                    span class="font-medium" { (message) }

                    @if !details.is_empty() {
                        p { (details) }
                    }

                    button
                        type="button"
                        class="ms-2 underline"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "Dismiss"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status = if self.is_error() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };

        (status, self.into_html()).into_response()
    }
}
