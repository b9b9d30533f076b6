//! Core identifier and error types for the injection subsystem

/// Raw form identifier used by the host for every record kind.
///
/// Form id 0 is the host's null form and is never a valid actor or topic.
pub type FormId = u32;

/// Opaque actor identity. The host owns the actor; this crate only
/// correlates by id and never dereferences host actor storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub FormId);

/// Opaque dialogue topic identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicId(pub FormId);

/// Identity of a single speakable line (topic-info) within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicInfoId(pub FormId);

impl ActorId {
    /// Whether this is a real actor id (non-null form).
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl TopicId {
    /// Whether this is a real topic id (non-null form).
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// Error type for injection operations
///
/// The display path itself is best-effort and infallible; errors only
/// arise from precondition violations at registration and from host
/// compatibility validation at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    /// A caller passed a null form id where a real one is required
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The host event payload layout does not match the compiled mirror
    #[error("Host event layout mismatch: {0}")]
    LayoutMismatch(String),

    /// The host reported an ABI version this build does not support
    #[error("Unsupported host ABI version {got} (supported: {supported})")]
    UnsupportedHostAbi { got: u32, supported: u32 },

    /// Subsystem already initialized
    #[error("Injection subsystem already initialized")]
    AlreadyInitialized,
}

/// Result type for injection operations
pub type InjectResult<T> = Result<T, InjectError>;
