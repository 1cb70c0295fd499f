//! Signup page handlers

use super::{apply_values, busy_response, field_event, lookup, redirect_response, FormBody};
use crate::config::RouteConfig;
use crate::forms::SIGNUP_SUCCEEDED;
use crate::state::PortalState;
use crate::template::{FormKind, FormPartial, FormView, HxTemplate, SignupPage};
use axum::{extract::State, response::Response, Form};
use axum_htmx::HxRequest;

/// Show the signup page with a fresh form instance
pub async fn page(State(state): State<PortalState>) -> Response {
    let (form_id, handle) = state
        .signup_forms
        .open(|navigator| state.signup_form(navigator));
    let routes = &state.config.routes;
    let view = FormView::build(FormKind::Signup, routes, form_id, handle.form.lock().await.state());
    render(routes, view, false)
}

/// Change or blur of one signup field
pub async fn field(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    Form(body): Form<FormBody>,
) -> Response {
    field_event(&state.signup_forms, &state.config.routes, is_htmx, &body)
}

/// Submit the signup form
///
/// After a successful registration the cleared form shows the success
/// banner and the page moves to the login route on its own after the
/// configured delay. The form instance is closed at that point, which also
/// cancels its server-side navigation timer.
pub async fn submit(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    Form(body): Form<FormBody>,
) -> Response {
    let Some((form_id, handle)) = lookup(&state.signup_forms, &body) else {
        tracing::debug!("Signup submit for an unknown form, reloading");
        return redirect_response(FormKind::Signup.action(&state.config.routes), is_htmx);
    };
    let Ok(mut form) = handle.form.try_lock() else {
        return busy_response();
    };

    apply_values(&mut *form, &body);
    form.submit().await;

    let routes = &state.config.routes;
    let mut view = FormView::build(FormKind::Signup, routes, form_id, form.state());
    let redirect = form
        .pending_navigation()
        .map(|pending| (pending.target().to_string(), pending.delay().as_millis()));

    if let Some((target, delay_ms)) = redirect {
        view = view
            .with_success(SIGNUP_SUCCEEDED)
            .with_redirect(&target, delay_ms);
        drop(form);
        state.signup_forms.remove(&form_id);
        tracing::info!(form_id = %form_id, "Signup complete, form closed");
    }

    render(routes, view, is_htmx)
}

fn render(routes: &RouteConfig, form: FormView, is_htmx: bool) -> Response {
    SignupPage {
        form: form.clone(),
        login_route: routes.login.clone(),
    }
    .render_htmx(is_htmx, FormPartial { form })
}
