//! Admin dashboard handlers
//!
//! Every request builds an [`AdminListController`] for the session in the
//! cookie, mounts it (which checks the session and fetches the rows), runs
//! one operation and unmounts it again.

use super::{navigation_response, redirect_response};
use crate::admin::{AdminListController, MountOutcome, SortKey, SortOrder};
use crate::extractors::RequireSession;
use crate::middleware::{SessionCookie, SessionToken};
use crate::navigation::NavigationRecorder;
use crate::state::PortalState;
use crate::template::{
    AdminDetailPartial, AdminPage, AdminTablePartial, HxTemplate, NoticePartial, TableView,
};
use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use serde::Deserialize;
use std::sync::Arc;

/// Ordering and search term of the list, carried in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Sort column.
    #[serde(default)]
    pub sort: SortKey,
    /// Sort direction.
    #[serde(default)]
    pub order: SortOrder,
    /// Search term.
    #[serde(default)]
    pub search: String,
}

/// Mount a controller for the request's session.
///
/// When the session is gone the error is the response sending the user to
/// the login page, with the stale cookie cleared.
async fn mount(
    state: &PortalState,
    token: &SessionToken,
    query: &ListQuery,
    is_htmx: bool,
) -> Result<(AdminListController, Arc<NavigationRecorder>), Response> {
    let navigator = Arc::new(NavigationRecorder::new());
    let mut controller = state
        .admin_controller(token.as_str(), Arc::clone(&navigator) as _)
        .with_view(query.sort, query.order, &query.search);

    match controller.mount().await {
        MountOutcome::Mounted => Ok((controller, navigator)),
        MountOutcome::Redirected => {
            let mut response = navigation_response(&navigator, is_htmx)
                .unwrap_or_else(|| redirect_response(&state.config.routes.login, is_htmx));
            response.extensions_mut().insert(SessionCookie::Clear);
            Err(response)
        }
    }
}

/// Full dashboard page
pub async fn dashboard(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let (mut controller, _) = match mount(&state, &token, &query, is_htmx).await {
        Ok(mounted) => mounted,
        Err(response) => return response,
    };

    let signed_in_as = controller
        .session()
        .map(|session| session.identity.email.clone())
        .unwrap_or_default();
    let table = TableView::build(&controller, &state.config.routes.admin);
    controller.unmount().await;

    AdminPage {
        table,
        signed_in_as,
        close_detail: false,
    }
    .render_html()
}

/// Controls, stats and rows for the current search and ordering
pub async fn table(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let (mut controller, _) = match mount(&state, &token, &query, is_htmx).await {
        Ok(mounted) => mounted,
        Err(response) => return response,
    };

    let table = TableView::build(&controller, &state.config.routes.admin);
    controller.unmount().await;

    AdminTablePartial {
        table,
        close_detail: false,
    }
    .render_html()
}

/// Detail dialog for one submission
pub async fn detail(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
    Path(id): Path<String>,
) -> Response {
    let (mut controller, _) =
        match mount(&state, &token, &ListQuery::default(), is_htmx).await {
            Ok(mounted) => mounted,
            Err(response) => return response,
        };

    let detail = if controller.select(&id) {
        controller.selected().map(AdminDetailPartial::from)
    } else {
        None
    };
    controller.unmount().await;

    match detail {
        Some(detail) => detail.render_html(),
        None => {
            tracing::debug!(id = %id, "Unknown submission requested");
            (StatusCode::NOT_FOUND, "Submission not found").into_response()
        }
    }
}

/// Delete a submission and return the refreshed list
///
/// On failure the list is returned unchanged with the error above it.
pub async fn delete(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let (mut controller, _) = match mount(&state, &token, &query, is_htmx).await {
        Ok(mounted) => mounted,
        Err(response) => return response,
    };

    let dashboard = &state.config.routes.admin;
    let partial = match controller.delete(&id).await {
        Ok(()) => AdminTablePartial {
            table: TableView::build(&controller, dashboard),
            close_detail: true,
        },
        Err(err) => AdminTablePartial {
            table: TableView::build(&controller, dashboard).with_notice(err.to_string()),
            close_detail: false,
        },
    };
    controller.unmount().await;

    partial.render_html()
}

/// Download the filtered list as CSV
pub async fn export(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let (mut controller, _) = match mount(&state, &token, &query, is_htmx).await {
        Ok(mounted) => mounted,
        Err(response) => return response,
    };

    let export = controller.export_csv();
    controller.unmount().await;
    tracing::info!(file_name = %export.file_name, "Submissions exported");

    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.body,
    )
        .into_response()
}

/// Sign out and go back to the login page
pub async fn logout(
    State(state): State<PortalState>,
    HxRequest(is_htmx): HxRequest,
    RequireSession(token): RequireSession,
) -> Response {
    let (mut controller, navigator) =
        match mount(&state, &token, &ListQuery::default(), is_htmx).await {
            Ok(mounted) => mounted,
            Err(response) => return response,
        };

    // Stop watching first so the sign-out navigates only once
    controller.unmount().await;
    let result = controller.sign_out().await;

    match result {
        Ok(()) => {
            let mut response = navigation_response(&navigator, is_htmx)
                .unwrap_or_else(|| redirect_response(&state.config.routes.login, is_htmx));
            response.extensions_mut().insert(SessionCookie::Clear);
            response
        }
        Err(err) => NoticePartial {
            message: err.to_string(),
        }
        .render_html(),
    }
}
