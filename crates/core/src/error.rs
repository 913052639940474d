use crate::result::VerifyResult;

/// Configuration and misuse errors.
///
/// Data problems never surface here; they are reported inside a
/// [`VerifyResult`]. These variants indicate a programming mistake and are
/// always returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Type name must not be blank")]
    BlankTypeName,

    #[error("Project name must not be blank")]
    BlankProjectName,

    #[error("Member name must not be blank")]
    BlankMemberName,

    #[error("Member '{member}' is not declared on type {type_name}")]
    MemberNotFound { type_name: String, member: String },

    #[error("Member '{member}' is declared more than once on type {type_name}")]
    DuplicateMember { type_name: String, member: String },

    #[error("Invalid option {key}: {reason}")]
    InvalidOption { key: &'static str, reason: String },

    #[error("Verification failed for {} member(s)", .0.member_names().len())]
    Invalid(VerifyResult),
}
