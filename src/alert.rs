//! Alerts for displaying error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element of the page shell,
//! either as the target of a failed htmx request or as a regular swap.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with a headline and optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Error { message: String, details: String },
}

const ERROR_STYLE: &str = "text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
    dark:text-red-400 dark:border-red-800";

impl Alert {
    pub fn into_html(self) -> Markup {
        let Alert::Error { message, details } = self;

        // Template adapted from https://flowbite.com/docs/components/alerts/#border-accent
        html!(
            div
                class={ "flex items-start p-4 mb-4 border-t-4 rounded shadow " (ERROR_STYLE) }
                role="alert"
                data-alert-kind="error"
            {
                div class="ms-3 text-sm"
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    class="ms-auto -mx-1.5 -my-1.5 rounded p-1.5 inline-flex
                        items-center justify-center h-8 w-8 hover:opacity-75"
                    aria-label="Dismiss"
                    onclick="this.parentElement.remove()"
                {
                    "✕"
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}
