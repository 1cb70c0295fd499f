//! Login page handlers

use super::{
    apply_values, busy_response, field_event, lookup, navigation_response, redirect_response,
    FormBody,
};
use crate::clients::SessionEvent;
use crate::config::RouteConfig;
use crate::forms::SubmitOutcome;
use crate::middleware::SessionCookie;
use crate::state::PortalState;
use crate::template::{FormKind, FormPartial, FormView, HxTemplate, LoginPage};
use axum::{extract::State, response::Response, Form};
use axum_htmx::HxRequest;

/// Show the login page with a fresh form instance
pub async fn page(State(state): State<PortalState>) -> Response {
    let (form_id, handle) = state.login_forms.open(|navigator| state.login_form(navigator));
    let routes = &state.config.routes;
    let view = FormView::build(FormKind::Login, routes, form_id, handle.form.lock().await.state());
    render(routes, view, false)
}

/// Change or blur of one login field
pub async fn field(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    Form(body): Form<FormBody>,
) -> Response {
    field_event(&state.login_forms, &state.config.routes, is_htmx, &body)
}

/// Submit the login form
///
/// On success the session token is stored in the session cookie and the
/// browser is sent to the landing route. Otherwise the form comes back with
/// its errors or failure banner.
pub async fn submit(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    Form(body): Form<FormBody>,
) -> Response {
    let Some((form_id, handle)) = lookup(&state.login_forms, &body) else {
        tracing::debug!("Login submit for an unknown form, reloading");
        return redirect_response(FormKind::Login.action(&state.config.routes), is_htmx);
    };
    let Ok(mut form) = handle.form.try_lock() else {
        return busy_response();
    };

    apply_values(&mut *form, &body);

    let mut session_events = form.account().subscribe_session_changes();
    let outcome = form.submit().await;
    let session = std::iter::from_fn(|| session_events.try_next()).find_map(|event| match event {
        SessionEvent::SignedIn(session) => Some(session),
        SessionEvent::TokenRefreshed(_) | SessionEvent::SignedOut => None,
    });
    session_events.release();

    if let Some(mut response) = navigation_response(&handle.navigator, is_htmx) {
        drop(form);
        state.login_forms.remove(&form_id);

        match session {
            Some(session) => {
                response
                    .extensions_mut()
                    .insert(SessionCookie::Set(session.access_token));
            }
            None => tracing::warn!("Login navigated without a session to store"),
        }
        return response;
    }

    if outcome == SubmitOutcome::Invalid {
        tracing::debug!(form_id = %form_id, "Login form returned with errors");
    }
    let routes = &state.config.routes;
    let view = FormView::build(FormKind::Login, routes, form_id, form.state());
    render(routes, view, is_htmx)
}

fn render(routes: &RouteConfig, form: FormView, is_htmx: bool) -> Response {
    LoginPage {
        form: form.clone(),
        signup_route: routes.signup.clone(),
    }
    .render_htmx(is_htmx, FormPartial { form })
}
