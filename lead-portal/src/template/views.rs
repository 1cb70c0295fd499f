//! Page and partial templates with their view models.

use crate::admin::{AdminListController, ContactSubmission, LoadState, SortKey};
use crate::config::RouteConfig;
use crate::forms::{FormField, FormId, FormState, LoginField, SignupField};
use askama::Template;

/// How a field is presented.
pub trait FieldPresentation: FormField {
    /// Label above the input.
    fn label(self) -> &'static str;
    /// HTML input type.
    fn input_type(self) -> &'static str;
    /// Placeholder text.
    fn placeholder(self) -> &'static str {
        ""
    }
}

impl FieldPresentation for LoginField {
    fn label(self) -> &'static str {
        match self {
            Self::Email => "Email Address",
            Self::Password => "Password",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Email => "you@example.com",
            Self::Password => "••••••••",
        }
    }
}

impl FieldPresentation for SignupField {
    fn label(self) -> &'static str {
        match self {
            Self::FullName => "Full Name",
            Self::Email => "Email Address",
            Self::Password => "Password",
            Self::ConfirmPassword => "Confirm Password",
            Self::AgreeTerms => "I agree to the Terms of Service and Privacy Policy",
        }
    }

    fn input_type(self) -> &'static str {
        match self {
            Self::FullName => "text",
            Self::Email => "email",
            Self::Password | Self::ConfirmPassword => "password",
            Self::AgreeTerms => "checkbox",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::FullName => "John Doe",
            Self::Email => "you@example.com",
            Self::Password | Self::ConfirmPassword => "••••••••",
            Self::AgreeTerms => "",
        }
    }
}

/// One input with its current value and visible error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    /// Field name used in requests.
    pub name: &'static str,
    /// Label text.
    pub label: &'static str,
    /// HTML input type.
    pub input_type: &'static str,
    /// Placeholder text.
    pub placeholder: &'static str,
    /// Current text value. Always empty for password inputs.
    pub value: String,
    /// Checkbox state.
    pub checked: bool,
    /// Message shown under the field.
    pub error: Option<&'static str>,
    /// Element id of the error slot.
    pub error_id: String,
    /// Element id of the input.
    pub input_id: String,
}

impl FieldView {
    /// Whether the field renders as a checkbox.
    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.input_type == "checkbox"
    }

    fn build<F: FieldPresentation>(form_id: &str, field: F, state: &FormState<F>) -> Self {
        let value = state.values().get(field);
        let input_type = field.input_type();
        // Secrets are never written back into the page
        let text = if input_type == "password" {
            String::new()
        } else {
            value.as_text().to_string()
        };
        Self {
            name: field.name(),
            label: field.label(),
            input_type,
            placeholder: field.placeholder(),
            value: text,
            checked: value.is_truthy(),
            error: state.visible_error(field),
            error_id: format!("{form_id}-{}-error", field.name()),
            input_id: format!("{form_id}-{}", field.name()),
        }
    }
}

/// Which form is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Login form.
    Login,
    /// Signup form.
    Signup,
}

impl FormKind {
    /// Page and submit path.
    #[must_use]
    pub fn action(self, routes: &RouteConfig) -> &str {
        match self {
            Self::Login => &routes.login,
            Self::Signup => &routes.signup,
        }
    }

    /// Field event path.
    #[must_use]
    pub fn field_action(self, routes: &RouteConfig) -> String {
        format!("{}/field", self.action(routes).trim_end_matches('/'))
    }

    const fn submit_label(self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::Signup => "Create Account",
        }
    }

    const fn submitting_label(self) -> &'static str {
        match self {
            Self::Login => "Signing in...",
            Self::Signup => "Creating account...",
        }
    }
}

/// Navigation the page performs on its own after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedRedirectView {
    /// Target path.
    pub path: String,
    /// Delay in milliseconds.
    pub delay_ms: u128,
}

/// A whole form: inputs, banners and submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    /// Form instance id.
    pub form_id: String,
    /// Submit endpoint.
    pub action: String,
    /// Field event endpoint.
    pub field_action: String,
    /// Inputs in display order.
    pub fields: Vec<FieldView>,
    /// Inputs and button disabled.
    pub disabled: bool,
    /// Failure banner.
    pub failure: Option<String>,
    /// Success banner.
    pub success: Option<String>,
    /// Button text.
    pub submit_label: &'static str,
    /// Delayed navigation after success.
    pub redirect: Option<DelayedRedirectView>,
}

impl FormView {
    /// View of a form instance.
    #[must_use]
    pub fn build<F: FieldPresentation>(
        kind: FormKind,
        routes: &RouteConfig,
        form_id: FormId,
        state: &FormState<F>,
    ) -> Self {
        let form_id = form_id.to_string();
        let disabled = state.status().is_submitting();
        Self {
            fields: F::ALL
                .iter()
                .map(|&field| FieldView::build(&form_id, field, state))
                .collect(),
            form_id,
            action: kind.action(routes).to_string(),
            field_action: kind.field_action(routes),
            disabled,
            failure: state.status().failure().map(ToString::to_string),
            success: None,
            submit_label: if disabled {
                kind.submitting_label()
            } else {
                kind.submit_label()
            },
            redirect: None,
        }
    }

    /// Show a success banner.
    #[must_use]
    pub fn with_success(mut self, message: &str) -> Self {
        self.success = Some(message.to_string());
        self
    }

    /// Navigate to `path` after `delay_ms`.
    #[must_use]
    pub fn with_redirect(mut self, path: &str, delay_ms: u128) -> Self {
        self.redirect = Some(DelayedRedirectView {
            path: path.to_string(),
            delay_ms,
        });
        self
    }
}

/// Login page.
#[derive(Debug, Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    /// The form.
    pub form: FormView,
    /// Link to the signup page.
    pub signup_route: String,
}

/// Signup page.
#[derive(Debug, Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    /// The form.
    pub form: FormView,
    /// Link to the login page.
    pub login_route: String,
}

/// Form markup alone, swapped in after a submit.
#[derive(Debug, Template)]
#[template(path = "partials/form.html")]
pub struct FormPartial {
    /// The form.
    pub form: FormView,
}

/// Out-of-band error slots for every field of a form.
#[derive(Debug, Template)]
#[template(path = "partials/field_errors.html")]
pub struct FieldErrorsPartial {
    /// Fields with their current visible errors.
    pub fields: Vec<FieldView>,
}

/// One submission row of the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Row id.
    pub id: String,
    /// Formatted submission time.
    pub date: String,
    /// Name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Timeline.
    pub timeline: String,
    /// Budget.
    pub budget: String,
}

impl From<&ContactSubmission> for RowView {
    fn from(record: &ContactSubmission) -> Self {
        Self {
            id: record.id.clone(),
            date: record.display_date(),
            full_name: record.full_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            timeline: record.timeline.clone(),
            budget: record.budget.clone(),
        }
    }
}

/// Entry of the sort menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    /// Query value.
    pub value: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Currently selected.
    pub selected: bool,
}

/// Controls, stats and rows of the admin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// Rows matching the search, in view order.
    pub rows: Vec<RowView>,
    /// Number of matching rows.
    pub total: usize,
    /// Current search term.
    pub search: String,
    /// Sort menu.
    pub sort_options: Vec<SortOption>,
    /// Current order as a query value.
    pub sort_order: &'static str,
    /// Order the toggle button switches to.
    pub toggled_order: &'static str,
    /// Toggle button label.
    pub order_label: &'static str,
    /// Fetch failure.
    pub failure: Option<String>,
    /// Message from the last action.
    pub notice: Option<String>,
    /// Dashboard path, the target of the controls without htmx.
    pub dashboard: String,
}

impl TableView {
    /// View of the controller's current list.
    #[must_use]
    pub fn build(controller: &AdminListController, dashboard: &str) -> Self {
        let rows: Vec<RowView> = controller.filtered().into_iter().map(RowView::from).collect();
        let order = controller.sort_order();
        Self {
            total: rows.len(),
            rows,
            search: controller.search().to_string(),
            sort_options: SortKey::ALL
                .into_iter()
                .map(|key| SortOption {
                    value: key.column(),
                    label: key.label(),
                    selected: key == controller.sort_key(),
                })
                .collect(),
            sort_order: order.as_str(),
            toggled_order: order.toggled().as_str(),
            order_label: order.label(),
            failure: match controller.load_state() {
                LoadState::Failed(message) => Some(message.clone()),
                LoadState::Loading | LoadState::Ready => None,
            },
            notice: None,
            dashboard: dashboard.to_string(),
        }
    }

    /// Show a message above the table.
    #[must_use]
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Admin dashboard page.
#[derive(Debug, Template)]
#[template(path = "admin.html")]
pub struct AdminPage {
    /// The list.
    pub table: TableView,
    /// Email of the signed-in user.
    pub signed_in_as: String,
    /// Always false on a full page.
    pub close_detail: bool,
}

/// Admin list alone, swapped in after search, sort or delete.
#[derive(Debug, Template)]
#[template(path = "partials/admin_table.html")]
pub struct AdminTablePartial {
    /// The list.
    pub table: TableView,
    /// Also empty the detail dialog out of band.
    pub close_detail: bool,
}

/// Detail dialog for one submission.
#[derive(Debug, Template)]
#[template(path = "partials/admin_detail.html")]
pub struct AdminDetailPartial {
    /// Row id.
    pub id: String,
    /// Formatted submission time.
    pub date: String,
    /// Name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Timeline.
    pub timeline: String,
    /// Budget.
    pub budget: String,
    /// Project details or a placeholder.
    pub project_details: String,
    /// Referral source or a placeholder.
    pub hear_about: String,
}

impl From<&ContactSubmission> for AdminDetailPartial {
    fn from(record: &ContactSubmission) -> Self {
        Self {
            id: record.id.clone(),
            date: record.display_date(),
            full_name: record.full_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            timeline: record.timeline.clone(),
            budget: record.budget.clone(),
            project_details: record.project_details_or_default().to_string(),
            hear_about: record.hear_about_or_default().to_string(),
        }
    }
}

/// Message banner swapped into the page.
#[derive(Debug, Template)]
#[template(path = "partials/notice.html")]
pub struct NoticePartial {
    /// Text to show.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validate::EMAIL_INVALID;
    use crate::forms::SubmissionStatus;
    use uuid::Uuid;

    fn routes() -> RouteConfig {
        RouteConfig::default()
    }

    #[test]
    fn test_form_view_shows_touched_errors_only() {
        let mut state = FormState::<LoginField>::new();
        state.on_blur(LoginField::Email, "bad".into());
        state.on_change(LoginField::Password, "x".into());

        let view = FormView::build(FormKind::Login, &routes(), Uuid::nil(), &state);
        assert_eq!(view.fields.len(), 2);
        assert_eq!(view.fields[0].error, Some(EMAIL_INVALID));
        assert_eq!(view.fields[0].value, "bad");
        assert_eq!(view.fields[1].error, None);
        assert_eq!(view.action, "/login");
        assert_eq!(view.submit_label, "Sign In");
        assert!(!view.disabled);
    }

    #[test]
    fn test_checkbox_field_view() {
        let mut state = FormState::<SignupField>::new();
        state.on_change(SignupField::AgreeTerms, true.into());

        let view = FormView::build(FormKind::Signup, &routes(), Uuid::nil(), &state);
        let terms = view.fields.last().unwrap();
        assert!(terms.is_checkbox());
        assert!(terms.checked);
        assert_eq!(
            terms.error_id,
            "00000000-0000-0000-0000-000000000000-agreeTerms-error"
        );
    }

    #[test]
    fn test_form_partial_renders_fields_and_failure() {
        let mut state = FormState::<LoginField>::new();
        state.begin_submission().complete(SubmissionStatus::Failed(
            "Invalid login credentials".to_string(),
        ));

        let html = FormPartial {
            form: FormView::build(FormKind::Login, &routes(), Uuid::nil(), &state),
        }
        .render()
        .unwrap();
        assert!(html.contains("name=\"email\""));
        assert!(html.contains("name=\"password\""));
        assert!(html.contains("Invalid login credentials"));
    }

    #[test]
    fn test_field_errors_partial_is_out_of_band() {
        let mut state = FormState::<LoginField>::new();
        state.on_blur(LoginField::Email, String::new().into());
        let view = FormView::build(FormKind::Login, &routes(), Uuid::nil(), &state);

        let html = FieldErrorsPartial { fields: view.fields }.render().unwrap();
        assert!(html.contains("hx-swap-oob=\"true\""));
        assert!(html.contains("Email is required"));
    }

    #[test]
    fn test_password_values_are_not_echoed() {
        let mut state = FormState::<SignupField>::new();
        state.on_change(SignupField::FullName, "Jane Doe".into());
        state.on_change(SignupField::Password, "Secret123".into());
        state.on_change(SignupField::ConfirmPassword, "Secret123".into());

        let view = FormView::build(FormKind::Signup, &routes(), Uuid::nil(), &state);
        assert_eq!(view.fields[0].value, "Jane Doe");
        assert_eq!(view.fields[2].value, "");
        assert_eq!(view.fields[3].value, "");

        let html = FormPartial { form: view }.render().unwrap();
        assert!(!html.contains("Secret123"));
        assert!(html.contains("value=\"Jane Doe\""));
    }

    #[test]
    fn test_form_disables_inputs_while_submitting() {
        let state = FormState::<LoginField>::new();
        let html = FormPartial {
            form: FormView::build(FormKind::Login, &routes(), Uuid::nil(), &state),
        }
        .render()
        .unwrap();
        assert!(html.contains("hx-disabled-elt=\"find input, find button\""));
    }

    #[test]
    fn test_form_actions_follow_configured_routes() {
        let routes = RouteConfig {
            login: "/sign-in".to_string(),
            signup: "/register/".to_string(),
            ..RouteConfig::default()
        };
        let login = FormView::build(
            FormKind::Login,
            &routes,
            Uuid::nil(),
            &FormState::<LoginField>::new(),
        );
        assert_eq!(login.action, "/sign-in");
        assert_eq!(login.field_action, "/sign-in/field");

        let signup = FormView::build(
            FormKind::Signup,
            &routes,
            Uuid::nil(),
            &FormState::<SignupField>::new(),
        );
        assert_eq!(signup.field_action, "/register/field");
    }
}
