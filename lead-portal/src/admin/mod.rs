//! Admin list controller for contact submissions.
//!
//! The controller is gated on an active session. While mounted it watches
//! session changes and sends the user back to login when the session ends.
//! It holds the fetched rows and applies search, selection and deletion
//! locally. Sorting is done by the store, so changing the sort key or
//! direction refetches.

pub mod csv;
pub mod record;

pub use csv::CsvExport;
pub use record::{ContactSubmission, SortKey, SortOrder, UnknownSortValue, NOT_PROVIDED};

use crate::clients::{
    decode_rows, AccountService, AuthSession, ClientError, RecordsStore, SessionSubscription,
};
use crate::navigation::Navigator;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Errors surfaced by admin actions. The display text is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// The store refused or failed the delete.
    #[error("Failed to delete submission")]
    Delete(#[source] ClientError),

    /// Sign-out failed.
    #[error("Error signing out: {0}")]
    SignOut(#[source] ClientError),
}

/// What happened on mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// A session is active and the rows were requested.
    Mounted,
    /// No session; the user was sent to login and nothing was fetched.
    Redirected,
}

/// State of the last fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing fetched yet, or a fetch is in flight.
    #[default]
    Loading,
    /// Rows are available.
    Ready,
    /// The fetch failed with this message.
    Failed(String),
}

/// Tables and routes the controller works with.
#[derive(Debug, Clone)]
pub struct AdminSettings {
    /// Table holding the submissions.
    pub submissions_table: String,
    /// Where to send users without a session.
    pub login_route: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            submissions_table: "contact_submissions".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

/// Controller behind the admin dashboard.
pub struct AdminListController {
    account: Arc<dyn AccountService>,
    records: Arc<dyn RecordsStore>,
    navigator: Arc<dyn Navigator>,
    settings: AdminSettings,
    session: Option<AuthSession>,
    watch: Option<JoinHandle<()>>,
    submissions: Vec<ContactSubmission>,
    load_state: LoadState,
    sort_key: SortKey,
    sort_order: SortOrder,
    search: String,
    selected: Option<String>,
}

impl std::fmt::Debug for AdminListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminListController")
            .field("settings", &self.settings)
            .field("mounted", &self.session.is_some())
            .field("rows", &self.submissions.len())
            .field("load_state", &self.load_state)
            .field("sort_key", &self.sort_key)
            .field("sort_order", &self.sort_order)
            .field("search", &self.search)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl AdminListController {
    /// Create an unmounted controller with the default view.
    #[must_use]
    pub fn new(
        account: Arc<dyn AccountService>,
        records: Arc<dyn RecordsStore>,
        navigator: Arc<dyn Navigator>,
        settings: AdminSettings,
    ) -> Self {
        Self {
            account,
            records,
            navigator,
            settings,
            session: None,
            watch: None,
            submissions: Vec::new(),
            load_state: LoadState::Loading,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            search: String::new(),
            selected: None,
        }
    }

    /// Start from a given ordering and search term instead of the defaults.
    /// Meant for use before [`mount`](Self::mount), which fetches with it.
    #[must_use]
    pub fn with_view(mut self, sort_key: SortKey, sort_order: SortOrder, search: &str) -> Self {
        self.sort_key = sort_key;
        self.sort_order = sort_order;
        self.search = search.to_string();
        self
    }

    /// Check the session, start watching for its loss and fetch the rows.
    pub async fn mount(&mut self) -> MountOutcome {
        let subscription = self.account.subscribe_session_changes();

        let session = match self.account.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::info!("No active session, redirecting to login");
                return self.redirect_to_login(subscription);
            }
            Err(err) => {
                tracing::error!(error = %err, "Auth check error");
                return self.redirect_to_login(subscription);
            }
        };

        tracing::debug!(identity_id = %session.identity.id, "Admin mounted");
        self.session = Some(session);
        self.watch = Some(tokio::spawn(watch_session(
            subscription,
            Arc::clone(&self.navigator),
            self.settings.login_route.clone(),
        )));

        self.refresh().await;
        MountOutcome::Mounted
    }

    fn redirect_to_login(&self, subscription: SessionSubscription) -> MountOutcome {
        subscription.release();
        self.navigator.router_push(&self.settings.login_route);
        MountOutcome::Redirected
    }

    /// Stop watching the session. Awaits the watch task so its subscription
    /// is released when this returns.
    pub async fn unmount(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.abort();
            // Cancellation is the expected result
            let _ = watch.await;
            tracing::debug!("Admin unmounted");
        }
        self.session = None;
    }

    /// Session found on mount.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// Fetch the rows with the current ordering.
    pub async fn refresh(&mut self) {
        self.load_state = LoadState::Loading;

        let table = &self.settings.submissions_table;
        let fetched = self
            .records
            .query(table, self.sort_key.column(), self.sort_order.is_ascending())
            .await
            .and_then(decode_rows::<ContactSubmission>);

        match fetched {
            Ok(rows) => {
                tracing::debug!(table = %table, rows = rows.len(), "Fetched submissions");
                self.submissions = rows;
                self.load_state = LoadState::Ready;
            }
            Err(err) => {
                tracing::error!(table = %table, error = %err, "Error fetching submissions");
                self.load_state = LoadState::Failed(err.to_string());
            }
        }
    }

    /// State of the last fetch.
    #[must_use]
    pub const fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Every fetched row, in store order.
    #[must_use]
    pub fn submissions(&self) -> &[ContactSubmission] {
        &self.submissions
    }

    /// Current sort key.
    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Current sort direction.
    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Change the sort key; refetches if it changed.
    pub async fn set_sort_key(&mut self, key: SortKey) {
        if self.sort_key != key {
            self.sort_key = key;
            self.refresh().await;
        }
    }

    /// Change the sort direction; refetches if it changed.
    pub async fn set_sort_order(&mut self, order: SortOrder) {
        if self.sort_order != order {
            self.sort_order = order;
            self.refresh().await;
        }
    }

    /// Flip the sort direction and refetch.
    pub async fn toggle_sort_order(&mut self) {
        self.set_sort_order(self.sort_order.toggled()).await;
    }

    /// Current search term.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Replace the search term. Local only.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Rows matching the search term, in view order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&ContactSubmission> {
        self.submissions
            .iter()
            .filter(|record| record.matches(&self.search))
            .collect()
    }

    /// Open the detail view for a row. Returns `false` for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        let known = self.submissions.iter().any(|record| record.id == id);
        if known {
            self.selected = Some(id.to_string());
        }
        known
    }

    /// Close the detail view.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Row shown in the detail view.
    #[must_use]
    pub fn selected(&self) -> Option<&ContactSubmission> {
        let id = self.selected.as_deref()?;
        self.submissions.iter().find(|record| record.id == id)
    }

    /// Delete a row remotely, then drop it from the list and close the
    /// detail view.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Delete`] if the store delete fails; the list is
    /// left unchanged.
    pub async fn delete(&mut self, id: &str) -> Result<(), AdminError> {
        let table = &self.settings.submissions_table;
        self.records.delete(table, id).await.map_err(|err| {
            tracing::error!(table = %table, id, error = %err, "Error deleting submission");
            AdminError::Delete(err)
        })?;

        tracing::info!(table = %table, id, "Submission deleted");
        self.submissions.retain(|record| record.id != id);
        self.selected = None;
        Ok(())
    }

    /// Export the filtered view as CSV.
    #[must_use]
    pub fn export_csv(&self) -> CsvExport {
        CsvExport {
            file_name: csv::file_name(Utc::now().date_naive()),
            body: csv::render(self.filtered()),
        }
    }

    /// End the session and leave for the login page.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::SignOut`] if the account service fails; no
    /// navigation happens then.
    pub async fn sign_out(&mut self) -> Result<(), AdminError> {
        self.account.end_session().await.map_err(|err| {
            tracing::error!(error = %err, "Error signing out");
            AdminError::SignOut(err)
        })?;

        self.navigator.navigate_to(&self.settings.login_route);
        Ok(())
    }
}

impl Drop for AdminListController {
    fn drop(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.abort();
        }
    }
}

async fn watch_session(
    mut subscription: SessionSubscription,
    navigator: Arc<dyn Navigator>,
    login_route: String,
) {
    while let Some(event) = subscription.next().await {
        if event.session().is_none() {
            tracing::info!("Session ended, redirecting to login");
            navigator.router_push(&login_route);
        }
    }
    subscription.release();
}

#[cfg(test)]
mod tests {
    use super::record::fixtures::submission;
    use super::*;
    use crate::clients::{
        Identity, MockAccountService, MockRecordsStore, SessionEvent, SessionHub,
    };
    use crate::navigation::{Navigation, NavigationRecorder};
    use serde_json::Value;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: None,
            identity: Identity {
                id: "admin-1".to_string(),
                email: "admin@example.com".to_string(),
                full_name: None,
            },
        }
    }

    fn rows(names: &[(&str, &str)]) -> Vec<Value> {
        names
            .iter()
            .map(|(id, name)| serde_json::to_value(submission(id, name)).unwrap())
            .collect()
    }

    fn account_with_session(hub: &SessionHub) -> MockAccountService {
        let mut account = MockAccountService::new();
        let subscribe_hub = hub.clone();
        account
            .expect_subscribe_session_changes()
            .returning(move || subscribe_hub.subscribe());
        account
            .expect_current_session()
            .returning(|| Ok(Some(session())));
        account
    }

    fn controller(
        account: MockAccountService,
        records: MockRecordsStore,
    ) -> (AdminListController, Arc<NavigationRecorder>) {
        let navigator = Arc::new(NavigationRecorder::new());
        let controller = AdminListController::new(
            Arc::new(account),
            Arc::new(records),
            navigator.clone(),
            AdminSettings::default(),
        );
        (controller, navigator)
    }

    #[tokio::test]
    async fn test_mount_without_session_redirects_without_fetch() {
        let hub = SessionHub::new();
        let mut account = MockAccountService::new();
        let subscribe_hub = hub.clone();
        account
            .expect_subscribe_session_changes()
            .returning(move || subscribe_hub.subscribe());
        account.expect_current_session().returning(|| Ok(None));
        let mut records = MockRecordsStore::new();
        records.expect_query().never();
        let (mut admin, navigator) = controller(account, records);

        assert_eq!(admin.mount().await, MountOutcome::Redirected);
        assert_eq!(navigator.take(), vec![Navigation::Push("/login".to_string())]);
        assert_eq!(hub.subscriber_count(), 0);
        assert!(admin.session().is_none());
    }

    #[tokio::test]
    async fn test_mount_with_session_error_redirects() {
        let hub = SessionHub::new();
        let mut account = MockAccountService::new();
        let subscribe_hub = hub.clone();
        account
            .expect_subscribe_session_changes()
            .returning(move || subscribe_hub.subscribe());
        account
            .expect_current_session()
            .returning(|| Err(ClientError::Transport("timed out".into())));
        let mut records = MockRecordsStore::new();
        records.expect_query().never();
        let (mut admin, navigator) = controller(account, records);

        assert_eq!(admin.mount().await, MountOutcome::Redirected);
        assert_eq!(navigator.take(), vec![Navigation::Push("/login".to_string())]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_mount_fetches_newest_first() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .withf(|table, field, ascending| {
                table.to_string() == "contact_submissions"
                    && field.to_string() == "created_at"
                    && !*ascending
            })
            .times(1)
            .returning(|_, _, _| Ok(rows(&[("1", "Ann Lee"), ("2", "Bob Stone")])));
        let (mut admin, navigator) = controller(account_with_session(&hub), records);

        assert_eq!(admin.mount().await, MountOutcome::Mounted);
        assert_eq!(admin.load_state(), &LoadState::Ready);
        assert_eq!(admin.submissions().len(), 2);
        assert!(navigator.is_empty());
        assert_eq!(hub.subscriber_count(), 1);

        admin.unmount().await;
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_session_loss_redirects_while_mounted() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records.expect_query().returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, navigator) = controller(account_with_session(&hub), records);
        admin.mount().await;

        hub.publish(SessionEvent::TokenRefreshed(session()));
        hub.publish(SessionEvent::SignedOut);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert_eq!(navigator.take(), vec![Navigation::Push("/login".to_string())]);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records.expect_query().returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;
        assert_eq!(hub.subscriber_count(), 1);

        drop(admin);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_message() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .returning(|_, _, _| Err(ClientError::Rejected("relation does not exist".into())));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        assert_eq!(
            admin.load_state(),
            &LoadState::Failed("relation does not exist".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_rows_fail_the_fetch() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .returning(|_, _, _| Ok(vec![serde_json::json!({ "id": "1" })]));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        assert!(matches!(admin.load_state(), LoadState::Failed(_)));
        assert!(admin.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_sort_changes_refetch_only_when_changed() {
        let hub = SessionHub::new();
        let mut seq = mockall::Sequence::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .withf(|_, field, ascending| field.to_string() == "created_at" && !*ascending)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Vec::new()));
        records
            .expect_query()
            .withf(|_, field, ascending| field.to_string() == "full_name" && !*ascending)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Vec::new()));
        records
            .expect_query()
            .withf(|_, field, ascending| field.to_string() == "full_name" && *ascending)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        admin.set_sort_key(SortKey::FullName).await;
        admin.set_sort_key(SortKey::FullName).await;
        admin.toggle_sort_order().await;
        admin.set_sort_order(SortOrder::Asc).await;
        assert_eq!(admin.sort_order(), SortOrder::Asc);
    }

    #[tokio::test]
    async fn test_search_filters_locally() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .times(1)
            .returning(|_, _, _| Ok(rows(&[("1", "Ann Lee"), ("2", "Bob Stone")])));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        admin.set_search("BOB");
        let names: Vec<&str> = admin.filtered().iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Bob Stone"]);

        admin.set_search("");
        assert_eq!(admin.filtered().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_selection() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .returning(|_, _, _| Ok(rows(&[("1", "Ann Lee"), ("2", "Bob Stone")])));
        records
            .expect_delete()
            .withf(|table, id| table.to_string() == "contact_submissions" && id.to_string() == "2")
            .times(1)
            .returning(|_, _| Ok(()));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        assert!(admin.select("2"));
        assert_eq!(admin.selected().map(|r| r.id.as_str()), Some("2"));

        admin.delete("2").await.unwrap();
        assert!(admin.selected().is_none());
        assert_eq!(admin.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_row() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .returning(|_, _, _| Ok(rows(&[("1", "Ann Lee")])));
        records
            .expect_delete()
            .returning(|_, _| Err(ClientError::Rejected("permission denied".into())));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;
        admin.select("1");

        let err = admin.delete("1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete submission");
        assert_eq!(admin.submissions().len(), 1);
        assert!(admin.selected().is_some());
    }

    #[tokio::test]
    async fn test_select_unknown_id() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records.expect_query().returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;

        assert!(!admin.select("missing"));
        assert!(admin.selected().is_none());
    }

    #[tokio::test]
    async fn test_export_uses_filtered_view() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .returning(|_, _, _| Ok(rows(&[("1", "Ann Lee"), ("2", "Bob Stone")])));
        let (mut admin, _) = controller(account_with_session(&hub), records);
        admin.mount().await;
        admin.set_search("ann");

        let export = admin.export_csv();
        assert!(export.file_name.starts_with("contact-submissions-"));
        assert!(export.file_name.ends_with(".csv"));
        assert_eq!(export.body.lines().count(), 2);
        assert!(export.body.contains("\"Ann Lee\""));
    }

    #[tokio::test]
    async fn test_sign_out_navigates_to_login() {
        let hub = SessionHub::new();
        let mut account = account_with_session(&hub);
        account.expect_end_session().times(1).returning(|| Ok(()));
        let mut records = MockRecordsStore::new();
        records.expect_query().returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, navigator) = controller(account, records);
        admin.mount().await;

        admin.sign_out().await.unwrap();
        assert_eq!(navigator.take(), vec![Navigation::Reload("/login".to_string())]);
    }

    #[tokio::test]
    async fn test_sign_out_failure_reports_message() {
        let hub = SessionHub::new();
        let mut account = account_with_session(&hub);
        account
            .expect_end_session()
            .returning(|| Err(ClientError::Rejected("network down".into())));
        let mut records = MockRecordsStore::new();
        records.expect_query().returning(|_, _, _| Ok(Vec::new()));
        let (mut admin, navigator) = controller(account, records);
        admin.mount().await;

        let err = admin.sign_out().await.unwrap_err();
        assert_eq!(err.to_string(), "Error signing out: network down");
        assert!(navigator.is_empty());
    }

    #[tokio::test]
    async fn test_with_view_sets_initial_query() {
        let hub = SessionHub::new();
        let mut records = MockRecordsStore::new();
        records
            .expect_query()
            .withf(|_, field, ascending| field.to_string() == "budget" && *ascending)
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        let (admin, _) = controller(account_with_session(&hub), records);
        let mut admin = admin.with_view(SortKey::Budget, SortOrder::Asc, "ann");
        admin.mount().await;

        assert_eq!(admin.search(), "ann");
        assert_eq!(admin.sort_key(), SortKey::Budget);
    }
}
