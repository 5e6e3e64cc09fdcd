use vkguard_types::ObjectHandle;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("duplicate handle: {0:?}")]
    DuplicateHandle(ObjectHandle),

    #[error("handle not found: {0:?}")]
    HandleNotFound(ObjectHandle),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
