//! Askama template integration
//!
//! - [`HxTemplate`] renders any template as an HTML response
//! - [`views`] holds the page and partial templates with their view models

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub mod views;

pub use views::{
    AdminDetailPartial, AdminPage, AdminTablePartial, FieldErrorsPartial, FieldPresentation,
    FieldView, FormKind, FormPartial, FormView, LoginPage, NoticePartial, SignupPage, TableView,
};

/// Extension trait for Askama templates
pub trait HxTemplate: Template {
    /// Render as HTML response
    ///
    /// Rendering failures become a 500 and are logged.
    fn render_html(self) -> Response
    where
        Self: Sized,
    {
        self.render_html_with_status(StatusCode::OK)
    }

    /// Render as HTML response with a given status
    fn render_html_with_status(self, status: StatusCode) -> Response
    where
        Self: Sized,
    {
        match self.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                tracing::error!("Template rendering error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Template rendering failed",
                )
                    .into_response()
            }
        }
    }

    /// Render the full page for regular requests and `partial` for htmx
    /// requests.
    fn render_htmx<P>(self, is_htmx: bool, partial: P) -> Response
    where
        Self: Sized,
        P: Template,
    {
        if is_htmx {
            partial.render_html()
        } else {
            self.render_html()
        }
    }
}

// Blanket implementation for all Askama templates
impl<T> HxTemplate for T where T: Template {}
