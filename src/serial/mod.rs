//! Serial port access and the AT command transport built on it.

pub mod device;
pub mod errors;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use device::{SerialDeviceHandle, SerialOpener, TokioSerialOpener};
pub use errors::{AtError, SerialError};
pub use transport::{
    AtCommandState, AtResponse, AtStep, CTRL_Z, ERROR_TOKEN, OK_TOKEN, PROMPT_TOKEN,
    SerialAtTransport, Terminator,
};
