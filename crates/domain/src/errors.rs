use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("No instruction matches the shipment ({0} instructions evaluated)")]
    InstructionNotFound(usize),

    #[error("No carrier by the name {0}")]
    CarrierNotFound(String),

    #[error("Carrier setup {0} not found in data document")]
    MissingSetup(String),

    #[error("Invalid data document: {0}")]
    InvalidDataDocument(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// 運用者の対応で解消する業務上の失敗か（システム障害ではない）
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            DomainError::InstructionNotFound(_)
                | DomainError::CarrierNotFound(_)
                | DomainError::MissingSetup(_)
                | DomainError::InvalidDataDocument(_)
        )
    }
}
