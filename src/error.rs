/// Coarse classification shared by every error in this crate.
///
/// Concrete error enums stay module-local, but callers that only need to
/// know *why* something was rejected can match on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transaction fields are malformed, or it was routed to an account that cannot run it.
    InvalidTransaction,
    /// A directly supplied argument broke a precondition.
    InvalidArgument,
    /// The patron lacks the cash or shares needed.
    InsufficientAssets,
    /// A structural bank rule was violated.
    ApplicationDenied,
}
