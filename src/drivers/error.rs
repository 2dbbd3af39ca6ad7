// src/drivers/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DatalogError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DatalogError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for DatalogError {
    fn from(value: image::ImageError) -> Self {
        DatalogError::Plot(value.to_string())
    }
}
