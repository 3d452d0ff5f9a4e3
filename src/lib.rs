pub mod address;
pub mod channel;
pub mod cli;
pub mod detect;
pub mod error;
pub mod line;
pub mod poll;
pub mod scaling;
pub mod scan;
pub mod serial;
pub mod transport;

#[cfg(test)]
mod mock;

pub use address::Addressing;
pub use channel::{Channel, Measurement, Profile, Quantity, Value, read_channels};
pub use detect::{Detection, Phase, SweepPlan, detect};
pub use error::{Result, VfdError};
pub use line::{LineSettings, Parity, StopBits};
pub use poll::{Poller, Sample};
pub use scaling::Scaling;
pub use serial::{SerialConnector, SerialTransport};
pub use transport::{Connector, MAX_READ_REGISTERS, Transport};
