use thiserror::Error;
#[derive(Debug, Error)]
pub enum SpecanError {
    #[error("device {vid:04x}:{pid:04x} not found")]
    DeviceNotFound { vid: u16, pid: u16 },
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),
    #[error("timed out waiting for sweep data")]
    Timeout,
    #[error("invalid display range: {0}")]
    InvalidRange(String),
    #[error("history depth must be greater than zero")]
    InvalidDepth,
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
impl SpecanError {
    /// Timeouts only mean the dongle had nothing to say yet.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SpecanError::Timeout | SpecanError::Usb(rusb::Error::Timeout))
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SpecanError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SpecanError::Plot(format!("sweep chart drawing failed: {value}"))
    }
}
impl From<image::ImageError> for SpecanError {
    fn from(value: image::ImageError) -> Self {
        SpecanError::Plot(format!("snapshot PNG encoding failed: {value}"))
    }
}
