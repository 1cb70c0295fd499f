//! Login and signup forms.
//!
//! A form instance is a [`FormState`] plus a controller that knows how to
//! submit it:
//!
//! - [`LoginForm`] signs in through the account service
//! - [`SignupForm`] registers an identity, then stores its profile row
//!
//! Field rules live in [`validate`]; the HTTP layer keeps live instances in a
//! [`FormRegistry`].

pub mod field;
pub mod login;
pub mod registry;
pub mod signup;
pub mod state;
pub mod validate;

pub use field::{FieldValue, FormField, FormValues};
pub use login::{LoginForm, SubmitOutcome};
pub use registry::{FormHandle, FormId, FormRegistry};
pub use signup::{ProfileRecord, SignupForm, SignupSettings, PROFILE_SAVE_FAILED, SIGNUP_SUCCEEDED};
pub use state::{ErrorMap, FormState, SubmissionGuard, SubmissionStatus, UNEXPECTED_ERROR};
pub use validate::{LoginField, SignupField};
