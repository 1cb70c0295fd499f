//! HTTP handlers and the application router
//!
//! Form instances live in the registries of [`PortalState`] between
//! requests; admin controllers are built per request from the session cookie.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | login or admin, depending on the session cookie |
//! | GET, POST | `routes.login` | [`login::page`], [`login::submit`] |
//! | POST | `routes.login` + `/field` | [`login::field`] |
//! | GET, POST | `routes.signup` | [`signup::page`], [`signup::submit`] |
//! | POST | `routes.signup` + `/field` | [`signup::field`] |
//! | GET | `routes.admin` | [`admin::dashboard`] |
//! | GET | `/admin/submissions` | [`admin::table`] |
//! | GET, DELETE | `/admin/submissions/{id}` | [`admin::detail`], [`admin::delete`] |
//! | GET | `/admin/export.csv` | [`admin::export`] |
//! | POST | `/logout` | [`admin::logout`] |
//!
//! The login, signup and dashboard paths come from [`RouteConfig`].

pub mod admin;
pub mod login;
pub mod signup;

use crate::config::RouteConfig;
use crate::extractors::OptionalSession;
use crate::forms::{
    FieldValue, FormField, FormHandle, FormId, FormRegistry, FormState, LoginField, LoginForm,
    SignupField, SignupForm,
};
use crate::middleware::{SessionLayer, SessionSettings};
use crate::navigation::{Navigation, NavigationRecorder};
use crate::state::PortalState;
use crate::template::{FieldErrorsPartial, FieldPresentation, FormKind, FormView, HxTemplate};
use axum::{
    extract::State,
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_htmx::AutoVaryLayer;
use std::collections::HashMap;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");
const HX_LOCATION: HeaderName = HeaderName::from_static("hx-location");

/// Urlencoded body of a form post.
pub type FormBody = HashMap<String, String>;

/// Build the application router.
pub fn router(state: PortalState) -> Router {
    let session_layer = SessionLayer::with_settings(SessionSettings::from(&state.config.session));
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let routes = &state.config.routes;
    let login_path = FormKind::Login.action(routes);
    let signup_path = FormKind::Signup.action(routes);

    Router::new()
        .route("/", get(index))
        .route(login_path, get(login::page).post(login::submit))
        .route(&FormKind::Login.field_action(routes), post(login::field))
        .route(signup_path, get(signup::page).post(signup::submit))
        .route(&FormKind::Signup.field_action(routes), post(signup::field))
        .route(&routes.admin, get(admin::dashboard))
        .route("/admin/submissions", get(admin::table))
        .route(
            "/admin/submissions/{id}",
            get(admin::detail).delete(admin::delete),
        )
        .route("/admin/export.csv", get(admin::export))
        .route("/logout", post(admin::logout))
        .layer(session_layer)
        .layer(AutoVaryLayer)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

async fn index(
    State(state): State<PortalState>,
    OptionalSession(token): OptionalSession,
) -> Redirect {
    let routes = &state.config.routes;
    if token.is_some() {
        Redirect::to(&routes.admin)
    } else {
        Redirect::to(&routes.login)
    }
}

/// Send the browser to `path`: `HX-Redirect` for htmx requests, a 303
/// otherwise.
#[must_use]
pub fn redirect_response(path: &str, is_htmx: bool) -> Response {
    if is_htmx {
        (StatusCode::OK, [(HX_REDIRECT, path)]).into_response()
    } else {
        Redirect::to(path).into_response()
    }
}

/// Turn the most recent recorded navigation into a response.
///
/// In-app pushes use `HX-Location` so htmx swaps the page without a reload.
pub(crate) fn navigation_response(navigator: &NavigationRecorder, is_htmx: bool) -> Option<Response> {
    let navigation = navigator.take().pop()?;
    Some(match navigation {
        Navigation::Push(path) if is_htmx => {
            (StatusCode::OK, [(HX_LOCATION, path.as_str())]).into_response()
        }
        navigation => redirect_response(navigation.path(), is_htmx),
    })
}

/// Answer to a submit arriving while the same form is still submitting.
pub(crate) fn busy_response() -> Response {
    tracing::debug!("Form busy, submit ignored");
    (StatusCode::CONFLICT, "Submission already in progress").into_response()
}

/// What the shared form endpoints need from a form controller.
pub(crate) trait FormController: Send + 'static {
    type Field: FieldPresentation;

    const KIND: FormKind;

    fn form_state(&self) -> &FormState<Self::Field>;

    fn apply_change(&mut self, field: Self::Field, value: FieldValue);

    fn apply_blur(&mut self, field: Self::Field, value: FieldValue);
}

impl FormController for LoginForm {
    type Field = LoginField;

    const KIND: FormKind = FormKind::Login;

    fn form_state(&self) -> &FormState<LoginField> {
        self.state()
    }

    fn apply_change(&mut self, field: LoginField, value: FieldValue) {
        self.on_change(field, value);
    }

    fn apply_blur(&mut self, field: LoginField, value: FieldValue) {
        self.on_blur(field, value);
    }
}

impl FormController for SignupForm {
    type Field = SignupField;

    const KIND: FormKind = FormKind::Signup;

    fn form_state(&self) -> &FormState<SignupField> {
        self.state()
    }

    fn apply_change(&mut self, field: SignupField, value: FieldValue) {
        self.on_change(field, value);
    }

    fn apply_blur(&mut self, field: SignupField, value: FieldValue) {
        self.on_blur(field, value);
    }
}

/// Find the form instance named by the body's `form_id`.
pub(crate) fn lookup<C>(registry: &FormRegistry<C>, body: &FormBody) -> Option<(FormId, FormHandle<C>)> {
    let id = body.get("form_id")?.parse::<FormId>().ok()?;
    registry.get(&id).map(|handle| (id, handle))
}

/// Read a field's value from a form body.
///
/// Unchecked checkboxes are left out of form posts, so a missing flag field
/// reads as unchecked.
fn field_value<F: FormField>(field: F, body: &FormBody) -> FieldValue {
    let raw = body.get(field.name());
    match field.initial_value() {
        FieldValue::Flag(_) => {
            FieldValue::Flag(raw.is_some_and(|value| matches!(value.as_str(), "on" | "true")))
        }
        FieldValue::Text(_) => FieldValue::Text(raw.cloned().unwrap_or_default()),
    }
}

/// Copy every field of the body into the form, as change events.
pub(crate) fn apply_values<C: FormController>(form: &mut C, body: &FormBody) {
    for &field in <C::Field as FormField>::ALL {
        form.apply_change(field, field_value(field, body));
    }
}

/// Handle a change or blur event of one field and answer with the
/// out-of-band error slots of every field.
pub(crate) fn field_event<C: FormController>(
    registry: &FormRegistry<C>,
    routes: &RouteConfig,
    is_htmx: bool,
    body: &FormBody,
) -> Response {
    let Some((form_id, handle)) = lookup(registry, body) else {
        tracing::debug!("Field event for an unknown form, reloading");
        return redirect_response(C::KIND.action(routes), is_htmx);
    };
    let Some(field) = body
        .get("field")
        .and_then(|name| <C::Field as FormField>::from_name(name))
    else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    // Inputs are ignored while a submission runs
    let Ok(mut form) = handle.form.try_lock() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let value = field_value(field, body);
    match body.get("event").map(String::as_str) {
        Some("blur" | "focusout") => form.apply_blur(field, value),
        _ => form.apply_change(field, value),
    }

    let view = FormView::build(C::KIND, routes, form_id, form.form_state());
    FieldErrorsPartial { fields: view.fields }.render_html()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn body(pairs: &[(&str, &str)]) -> FormBody {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn test_redirect_response_variants() {
        let plain = redirect_response("/login", false);
        assert_eq!(plain.status(), StatusCode::SEE_OTHER);
        assert_eq!(plain.headers().get(LOCATION).unwrap(), "/login");

        let htmx = redirect_response("/login", true);
        assert_eq!(htmx.status(), StatusCode::OK);
        assert_eq!(htmx.headers().get(HX_REDIRECT).unwrap(), "/login");
    }

    #[test]
    fn test_navigation_response_uses_latest_request() {
        use crate::navigation::Navigator;

        let recorder = NavigationRecorder::new();
        assert!(navigation_response(&recorder, true).is_none());

        recorder.navigate_to("/first");
        recorder.router_push("/login");
        let response = navigation_response(&recorder, true).unwrap();
        assert_eq!(response.headers().get(HX_LOCATION).unwrap(), "/login");
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_field_value_reads_checkbox_and_text() {
        let form = body(&[("agreeTerms", "on"), ("email", "ann@example.com")]);
        assert_eq!(
            field_value(SignupField::AgreeTerms, &form),
            FieldValue::Flag(true)
        );
        assert_eq!(
            field_value(SignupField::Email, &form),
            FieldValue::Text("ann@example.com".to_string())
        );
        assert_eq!(field_value(SignupField::FullName, &form), FieldValue::Text(String::new()));
        assert_eq!(
            field_value(SignupField::AgreeTerms, &body(&[])),
            FieldValue::Flag(false)
        );
    }

    #[test]
    fn test_lookup_rejects_unknown_and_malformed_ids() {
        let registry: FormRegistry<u8> = FormRegistry::new(Duration::from_secs(60));
        let (id, _handle) = registry.open(|_| 7);

        assert!(lookup(&registry, &body(&[("form_id", "nope")])).is_none());
        assert!(lookup(&registry, &body(&[])).is_none());
        let (found, _) = lookup(&registry, &body(&[("form_id", &id.to_string())])).unwrap();
        assert_eq!(found, id);
    }
}
