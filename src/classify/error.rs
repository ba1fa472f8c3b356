use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Rule set '{flag}' requires variable '{variable}', which is absent from the input")]
    MissingRequiredVariable { flag: String, variable: String },
}
