use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    /// Фатально для одного вызова, частичного результата нет
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}
