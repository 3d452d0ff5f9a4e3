use crate::address::manual;
use crate::error::Result;
use crate::scaling::{Scaling, as_signed};
use crate::transport::Transport;
use std::fmt;
use uom::si::electric_potential::volt;
use uom::si::f32::{ElectricPotential, Ratio, ThermodynamicTemperature};
use uom::si::ratio::percent;
use uom::si::thermodynamic_temperature::degree_celsius;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Temperature,
    Humidity,
    Voltage,
}

impl Quantity {
    pub fn value(self, magnitude: f32) -> Value {
        match self {
            Quantity::Temperature => Value::Temperature(
                ThermodynamicTemperature::new::<degree_celsius>(magnitude),
            ),
            Quantity::Humidity => Value::Humidity(Ratio::new::<percent>(magnitude)),
            Quantity::Voltage => Value::Voltage(ElectricPotential::new::<volt>(magnitude)),
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Quantity::Temperature => "°C",
            Quantity::Humidity => "%RH",
            Quantity::Voltage => "V",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Temperature(ThermodynamicTemperature),
    Humidity(Ratio),
    Voltage(ElectricPotential),
}

impl Value {
    /// Magnitude in the unit reported by [`Quantity::unit`].
    pub fn magnitude(&self) -> f32 {
        match self {
            Value::Temperature(t) => t.get::<degree_celsius>(),
            Value::Humidity(h) => h.get::<percent>(),
            Value::Voltage(v) => v.get::<volt>(),
        }
    }

    pub const fn quantity(&self) -> Quantity {
        match self {
            Value::Temperature(_) => Quantity::Temperature,
            Value::Humidity(_) => Quantity::Humidity,
            Value::Voltage(_) => Quantity::Voltage,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.magnitude(), self.quantity().unit())
    }
}

/// One sensor input exposed as a single holding register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub label: &'static str,
    pub quantity: Quantity,
    /// Wire (zero-based) register address.
    pub address: u16,
    pub scaling: Scaling,
}

impl Channel {
    pub const fn new(
        label: &'static str,
        quantity: Quantity,
        address: u16,
        scaling: Scaling,
    ) -> Self {
        Self {
            label,
            quantity,
            address,
            scaling,
        }
    }

    pub fn measure(&self, raw: u16) -> Measurement {
        Measurement {
            label: self.label,
            address: self.address,
            raw,
            value: self.quantity.value(self.scaling.scale(raw)),
            input_voltage: self.scaling.input_voltage(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub label: &'static str,
    pub address: u16,
    pub raw: u16,
    pub value: Value,
    /// Terminal voltage for channels wired as ±10 V inputs.
    pub input_voltage: Option<f32>,
}

impl Measurement {
    /// The raw word as the drive means it: two's complement for ±10 V
    /// inputs, unsigned otherwise.
    pub fn raw_value(&self) -> i32 {
        if self.input_voltage.is_some() {
            i32::from(as_signed(self.raw))
        } else {
            i32::from(self.raw)
        }
    }
}

/// Read every channel of one device.
///
/// Channels on consecutive registers are fetched with one request; a gap
/// starts a new request. Any failed request fails the whole read.
pub async fn read_channels<T: Transport>(
    transport: &mut T,
    device_id: u8,
    channels: &[Channel],
) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::with_capacity(channels.len());
    for group in contiguous_groups(channels) {
        let start = group[0].address;
        let words = transport
            .read_holding_registers(device_id, start, group.len() as u16)
            .await?;
        measurements.extend(group.iter().zip(words).map(|(ch, raw)| ch.measure(raw)));
    }
    Ok(measurements)
}

fn contiguous_groups(channels: &[Channel]) -> Vec<&[Channel]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=channels.len() {
        let split = i == channels.len()
            || channels[i].address != channels[i - 1].address.wrapping_add(1);
        if split {
            groups.push(&channels[start..i]);
            start = i;
        }
    }
    groups
}

/// Register layouts and calibrations worked out on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// AI1/AI2 at 2120/2121 with the offset calibration
    OffsetCalibrated,
    /// AI1 at 2120 as a 4-20 mA temperature loop, AI2 at 2121 as 0-10 V humidity
    CurrentLoop,
    /// 2121/2122 in data format 29 (±20000 = ±100 %), 0-60 °C and 0-100 %RH
    DataFormat29,
    /// Manual register 2098 and the word after it with coarse gains
    Coarse,
    /// Manual registers 2098 and 2103 with calibrated gains
    Calibrated,
    /// Calibrated temperature and humidity plus the M49 and M54 terminal voltages
    AnalogInputs,
    /// Manual registers 2098 and 2103 read as ±10 V inputs spanning 0-60 °C and 0-100 %RH
    BipolarSpan,
}

const TEMPERATURE: &str = "Temperature";
const HUMIDITY: &str = "Humidity";

const CALIBRATED_TEMP_GAIN: f32 = 0.001755;
const CALIBRATED_RH_GAIN: f32 = 0.00504;

const M49_REGISTER: u16 = 3000;
const M54_REGISTER: u16 = 3005;

impl Profile {
    pub fn channels(self) -> Vec<Channel> {
        match self {
            Profile::OffsetCalibrated => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    2120,
                    Scaling::offset_gain(2990.0, 60.0 / 16000.0),
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    2121,
                    Scaling::offset_gain(-4000.0, 0.00358),
                ),
            ],
            Profile::CurrentLoop => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    2120,
                    Scaling::offset_gain(-4000.0, 60.0 / 16000.0),
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    2121,
                    Scaling::gain(100.0 / 10000.0),
                ),
            ],
            Profile::DataFormat29 => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    2121,
                    Scaling::PercentOfSpan { full_scale: 60.0 },
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    2122,
                    Scaling::PercentOfSpan { full_scale: 100.0 },
                ),
            ],
            Profile::Coarse => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    manual(2098),
                    Scaling::gain(0.00755),
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    manual(2099),
                    Scaling::gain(0.00269),
                ),
            ],
            Profile::Calibrated => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    manual(2098),
                    Scaling::gain(CALIBRATED_TEMP_GAIN),
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    manual(2103),
                    Scaling::gain(CALIBRATED_RH_GAIN),
                ),
            ],
            Profile::AnalogInputs => {
                let mut channels = Profile::Calibrated.channels();
                channels.push(Channel::new(
                    "M49 terminal [12]",
                    Quantity::Voltage,
                    manual(M49_REGISTER),
                    Scaling::Bipolar10V,
                ));
                channels.push(Channel::new(
                    "M54 terminal [V2]",
                    Quantity::Voltage,
                    manual(M54_REGISTER),
                    Scaling::Bipolar10V,
                ));
                channels
            }
            Profile::BipolarSpan => vec![
                Channel::new(
                    TEMPERATURE,
                    Quantity::Temperature,
                    manual(2098),
                    Scaling::Bipolar10VSpan { full_scale: 60.0 },
                ),
                Channel::new(
                    HUMIDITY,
                    Quantity::Humidity,
                    manual(2103),
                    Scaling::Bipolar10VSpan { full_scale: 100.0 },
                ),
            ],
        }
    }
}
