//! Signup form controller.
//!
//! Signing up is two steps: create the identity with the account service,
//! then store a profile row keyed by the new identity id. The second step
//! only starts once the first has finished. A failed profile insert leaves
//! the identity in place and is reported with its own message.

use super::field::FieldValue;
use super::login::SubmitOutcome;
use super::state::{FormState, SubmissionStatus, UNEXPECTED_ERROR};
use super::validate::SignupField;
use crate::clients::{AccountService, ClientError, Identity, ProfileHints, RecordsStore};
use crate::navigation::{DeferredNavigation, Navigator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shown when the identity exists but its profile row could not be stored.
pub const PROFILE_SAVE_FAILED: &str =
    "Account created but failed to save profile data. Please contact support.";

/// Shown after a successful signup.
pub const SIGNUP_SUCCEEDED: &str =
    "Account created successfully! Please check your email to verify your account.";

/// Profile row written after the identity is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    /// Identity id.
    pub id: String,
    /// Email entered on the form.
    pub email: String,
    /// Full name entered on the form.
    pub full_name: String,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

/// Where the signup flow sends people and which table it writes.
#[derive(Debug, Clone)]
pub struct SignupSettings {
    /// Table receiving profile rows.
    pub profiles_table: String,
    /// Route navigated to after success.
    pub login_route: String,
    /// Absolute URL for the confirmation email link.
    pub email_redirect_target: String,
    /// Delay before navigating to `login_route`.
    pub redirect_delay: Duration,
}

impl Default for SignupSettings {
    fn default() -> Self {
        Self {
            profiles_table: "users".to_string(),
            login_route: "/login".to_string(),
            email_redirect_target: "http://localhost:3000/login".to_string(),
            redirect_delay: Duration::from_secs(2),
        }
    }
}

struct Registration {
    email: String,
    password: String,
    full_name: String,
}

/// One signup form instance.
///
/// Owns the post-signup navigation timer: dropping the form cancels it.
pub struct SignupForm {
    state: FormState<SignupField>,
    account: Arc<dyn AccountService>,
    records: Arc<dyn RecordsStore>,
    navigator: Arc<dyn Navigator>,
    settings: SignupSettings,
    pending_navigation: Option<DeferredNavigation>,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("pending_navigation", &self.pending_navigation)
            .finish_non_exhaustive()
    }
}

impl SignupForm {
    /// Create a form wired to its collaborators.
    #[must_use]
    pub fn new(
        account: Arc<dyn AccountService>,
        records: Arc<dyn RecordsStore>,
        navigator: Arc<dyn Navigator>,
        settings: SignupSettings,
    ) -> Self {
        Self {
            state: FormState::new(),
            account,
            records,
            navigator,
            settings,
            pending_navigation: None,
        }
    }

    /// Form state.
    #[must_use]
    pub const fn state(&self) -> &FormState<SignupField> {
        &self.state
    }

    /// Navigation scheduled by the last successful submit.
    #[must_use]
    pub const fn pending_navigation(&self) -> Option<&DeferredNavigation> {
        self.pending_navigation.as_ref()
    }

    /// Forward a change event.
    pub fn on_change(&mut self, field: SignupField, value: impl Into<FieldValue>) {
        self.state.on_change(field, value.into());
    }

    /// Forward a blur event.
    pub fn on_blur(&mut self, field: SignupField, value: impl Into<FieldValue>) {
        self.state.on_blur(field, value.into());
    }

    /// Validate and, if everything is valid, register the account.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.state.validate_all().is_empty() {
            tracing::debug!("Signup blocked by validation");
            return SubmitOutcome::Invalid;
        }

        let values = self.state.values();
        let registration = Registration {
            email: values.text(SignupField::Email).to_string(),
            password: values.text(SignupField::Password).to_string(),
            full_name: values.text(SignupField::FullName).to_string(),
        };

        let registrar = Registrar {
            account: self.account.as_ref(),
            records: self.records.as_ref(),
            settings: &self.settings,
        };
        let guard = self.state.begin_submission();
        let status = registrar.register(&registration).await;
        let succeeded = status == SubmissionStatus::Succeeded;
        guard.complete(status);

        if succeeded {
            self.state.reset();
            self.pending_navigation = Some(DeferredNavigation::schedule(
                self.navigator.clone(),
                &self.settings.login_route,
                self.settings.redirect_delay,
            ));
        }

        SubmitOutcome::Attempted
    }

    /// Cancel anything the form still has scheduled.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending_navigation.take() {
            pending.cancel();
        }
    }
}

/// Borrows the collaborators a submission needs, disjoint from the form state.
struct Registrar<'a> {
    account: &'a dyn AccountService,
    records: &'a dyn RecordsStore,
    settings: &'a SignupSettings,
}

impl Registrar<'_> {
    async fn register(&self, registration: &Registration) -> SubmissionStatus {
        let hints = ProfileHints {
            full_name: registration.full_name.clone(),
        };

        let created = self
            .account
            .create_identity(
                &registration.email,
                &registration.password,
                &hints,
                &self.settings.email_redirect_target,
            )
            .await;

        let identity = match created {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::error!("Signup returned no identity");
                return SubmissionStatus::Failed(UNEXPECTED_ERROR.to_string());
            }
            Err(ClientError::Rejected(message)) => {
                tracing::info!(reason = %message, "Signup rejected");
                return SubmissionStatus::Failed(message);
            }
            Err(err) => {
                tracing::error!(error = %err, "Signup error");
                return SubmissionStatus::Failed(UNEXPECTED_ERROR.to_string());
            }
        };

        self.save_profile(&identity, registration).await
    }

    async fn save_profile(
        &self,
        identity: &Identity,
        registration: &Registration,
    ) -> SubmissionStatus {
        let profile = ProfileRecord {
            id: identity.id.clone(),
            email: registration.email.clone(),
            full_name: registration.full_name.clone(),
            created_at: Utc::now(),
        };

        let record = match serde_json::to_value(&profile) {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(error = %err, "Failed to encode profile");
                return SubmissionStatus::Failed(PROFILE_SAVE_FAILED.to_string());
            }
        };

        match self.records.insert(&self.settings.profiles_table, record).await {
            Ok(()) => {
                tracing::info!(identity_id = %identity.id, "Signup completed");
                SubmissionStatus::Succeeded
            }
            Err(err) => {
                tracing::error!(
                    identity_id = %identity.id,
                    error = %err,
                    "Identity created but profile insert failed"
                );
                SubmissionStatus::Failed(PROFILE_SAVE_FAILED.to_string())
            }
        }
    }
}

impl Drop for SignupForm {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockAccountService, MockRecordsStore};
    use crate::forms::field::FormValues;
    use crate::forms::validate::{
        PASSWORDS_DIFFER, PASSWORD_NEEDS_DIGIT, PASSWORD_NEEDS_LOWERCASE,
        PASSWORD_NEEDS_UPPERCASE, TERMS_REQUIRED,
    };
    use crate::navigation::{Navigation, NavigationRecorder};
    use mockall::Sequence;

    fn identity() -> Identity {
        Identity {
            id: "3f1c".to_string(),
            email: "ann@example.com".to_string(),
            full_name: Some("Ann Lee".to_string()),
        }
    }

    fn form(
        account: MockAccountService,
        records: MockRecordsStore,
    ) -> (SignupForm, Arc<NavigationRecorder>) {
        let navigator = Arc::new(NavigationRecorder::new());
        let form = SignupForm::new(
            Arc::new(account),
            Arc::new(records),
            navigator.clone(),
            SignupSettings::default(),
        );
        (form, navigator)
    }

    fn fill_valid(form: &mut SignupForm) {
        form.on_change(SignupField::FullName, "Ann Lee");
        form.on_change(SignupField::Email, "ann@example.com");
        form.on_change(SignupField::Password, "Secret123");
        form.on_change(SignupField::ConfirmPassword, "Secret123");
        form.on_change(SignupField::AgreeTerms, true);
    }

    #[test]
    fn test_password_scenarios() {
        let (mut form, _) = form(MockAccountService::new(), MockRecordsStore::new());
        for (password, expected) in [
            ("alllower1", PASSWORD_NEEDS_UPPERCASE),
            ("ALLUPPER1", PASSWORD_NEEDS_LOWERCASE),
            ("NoDigitsHere", PASSWORD_NEEDS_DIGIT),
        ] {
            form.on_blur(SignupField::Password, password);
            assert_eq!(form.state().visible_error(SignupField::Password), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_invalid_signup_makes_no_calls() {
        let mut account = MockAccountService::new();
        account.expect_create_identity().never();
        let mut records = MockRecordsStore::new();
        records.expect_insert().never();
        let (mut form, _) = form(account, records);
        fill_valid(&mut form);
        form.on_change(SignupField::AgreeTerms, false);
        form.on_change(SignupField::ConfirmPassword, "Secret12");

        assert_eq!(form.submit().await, SubmitOutcome::Invalid);
        let state = form.state();
        assert_eq!(state.visible_error(SignupField::AgreeTerms), Some(TERMS_REQUIRED));
        assert_eq!(
            state.visible_error(SignupField::ConfirmPassword),
            Some(PASSWORDS_DIFFER)
        );
        assert_eq!(state.status(), &SubmissionStatus::Idle);
        assert!(form.pending_navigation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_signup_resets_and_schedules_login() {
        let mut seq = Sequence::new();
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .withf(|email, password, hints, redirect_to| {
                email.to_string() == "ann@example.com"
                    && password.to_string() == "Secret123"
                    && hints.full_name == "Ann Lee"
                    && redirect_to.to_string() == "http://localhost:3000/login"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(Some(identity())));
        let mut records = MockRecordsStore::new();
        records
            .expect_insert()
            .withf(|table, record| {
                table.to_string() == "users"
                    && record["id"] == "3f1c"
                    && record["email"] == "ann@example.com"
                    && record["full_name"] == "Ann Lee"
                    && record["created_at"].is_string()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let (mut form, navigator) = form(account, records);
        fill_valid(&mut form);

        assert_eq!(form.submit().await, SubmitOutcome::Attempted);

        let state = form.state();
        assert_eq!(state.status(), &SubmissionStatus::Succeeded);
        assert_eq!(state.values(), &FormValues::initial());
        assert!(!state.is_touched(SignupField::Email));

        let pending = form.pending_navigation().unwrap();
        assert_eq!(pending.target(), "/login");
        assert_eq!(pending.delay(), Duration::from_secs(2));
        assert!(navigator.is_empty());

        tokio::time::sleep(Duration::from_millis(2001)).await;
        tokio::task::yield_now().await;
        assert_eq!(navigator.take(), vec![Navigation::Reload("/login".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_form_cancels_redirect() {
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .returning(|_, _, _, _| Ok(Some(identity())));
        let mut records = MockRecordsStore::new();
        records.expect_insert().returning(|_, _| Ok(()));
        let (mut form, navigator) = form(account, records);
        fill_valid(&mut form);

        form.submit().await;
        assert!(form.pending_navigation().is_some());
        drop(form);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(navigator.is_empty());
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_identity_and_reports() {
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .times(1)
            .returning(|_, _, _, _| Ok(Some(identity())));
        // No compensating call is made
        account.expect_end_session().never();
        let mut records = MockRecordsStore::new();
        records
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(ClientError::Rejected("permission denied".into())));
        records.expect_delete().never();
        let (mut form, navigator) = form(account, records);
        fill_valid(&mut form);

        form.submit().await;
        let state = form.state();
        assert_eq!(state.status().failure(), Some(PROFILE_SAVE_FAILED));
        assert_eq!(state.values().text(SignupField::Email), "ann@example.com");
        assert!(form.pending_navigation().is_none());
        assert!(navigator.is_empty());
    }

    #[tokio::test]
    async fn test_identity_rejection_skips_profile_insert() {
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .returning(|_, _, _, _| Err(ClientError::Rejected("User already registered".into())));
        let mut records = MockRecordsStore::new();
        records.expect_insert().never();
        let (mut form, _) = form(account, records);
        fill_valid(&mut form);

        form.submit().await;
        assert_eq!(form.state().status().failure(), Some("User already registered"));
    }

    #[tokio::test]
    async fn test_unexpected_errors_use_generic_message() {
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .returning(|_, _, _, _| Err(ClientError::Decode("unexpected body".into())));
        let (mut form, _) = form(account, MockRecordsStore::new());
        fill_valid(&mut form);

        form.submit().await;
        assert_eq!(form.state().status().failure(), Some(UNEXPECTED_ERROR));
    }

    #[tokio::test]
    async fn test_missing_identity_is_a_failure() {
        let mut account = MockAccountService::new();
        account
            .expect_create_identity()
            .returning(|_, _, _, _| Ok(None));
        let mut records = MockRecordsStore::new();
        records.expect_insert().never();
        let (mut form, _) = form(account, records);
        fill_valid(&mut form);

        form.submit().await;
        assert_eq!(form.state().status().failure(), Some(UNEXPECTED_ERROR));
    }
}
