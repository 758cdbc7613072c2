use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("short read from light sensor: got {got} of 2 bytes")]
    ShortRead { got: usize },
    #[error("light sensor not initialized")]
    NotInitialized,
    #[error("simulated fault: {0}")]
    Simulated(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
