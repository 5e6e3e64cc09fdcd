#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("not representable in the legacy shape: {0}")]
    NotLegacyRepresentable(&'static str),
}
