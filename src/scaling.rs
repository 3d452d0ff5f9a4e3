//! Conversions from raw holding-register words to engineering values.
//!
//! The drive reports its analog inputs in a few different formats depending
//! on how the terminal is configured, and the sensors behind them were
//! calibrated by hand. Each [`Scaling`] variant is one of those formulas.

/// Full scale of a bipolar ±10 V input word.
const BIPOLAR_FULL_SCALE: f32 = 32767.0;
const BIPOLAR_VOLTS: f32 = 10.0;

/// Fuji data format 29: ±20000 corresponds to ±100 % of span.
const SPAN_FULL_SCALE: f32 = 20000.0;

/// Current loop readings are in µA; the live range is 4..20 mA.
const LOOP_MICROAMPS_PER_MILLIAMP: f32 = 1000.0;
const LOOP_ZERO_MA: f32 = 4.0;
const LOOP_SPAN_MA: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// `(raw + offset) * gain`, with `raw` read as `i16` when `signed`.
    Linear { gain: f32, offset: f32, signed: bool },
    /// 4..20 mA loop reported in µA, mapped onto `0..full_scale`.
    CurrentLoop { full_scale: f32 },
    /// Signed percentage of span (±20000 = ±100 %) times `full_scale`.
    PercentOfSpan { full_scale: f32 },
    /// Signed word mapped onto ±10 V.
    Bipolar10V,
    /// ±10 V input shifted so that −10 V is 0 and +10 V is `full_scale`.
    Bipolar10VSpan { full_scale: f32 },
}

/// Two's complement reading of a register word.
pub const fn as_signed(raw: u16) -> i16 {
    raw as i16
}

impl Scaling {
    /// Plain multiplication of the unsigned word.
    pub const fn gain(gain: f32) -> Self {
        Scaling::Linear {
            gain,
            offset: 0.0,
            signed: false,
        }
    }

    /// `(raw + offset) * gain` on the unsigned word.
    pub const fn offset_gain(offset: f32, gain: f32) -> Self {
        Scaling::Linear {
            gain,
            offset,
            signed: false,
        }
    }

    pub fn scale(&self, raw: u16) -> f32 {
        match *self {
            Scaling::Linear {
                gain,
                offset,
                signed,
            } => {
                let raw = if signed {
                    as_signed(raw) as f32
                } else {
                    raw as f32
                };
                (raw + offset) * gain
            }
            Scaling::CurrentLoop { full_scale } => {
                (raw as f32 / LOOP_MICROAMPS_PER_MILLIAMP - LOOP_ZERO_MA) * full_scale
                    / LOOP_SPAN_MA
            }
            Scaling::PercentOfSpan { full_scale } => {
                as_signed(raw) as f32 / SPAN_FULL_SCALE * full_scale
            }
            Scaling::Bipolar10V => bipolar_volts(raw),
            Scaling::Bipolar10VSpan { full_scale } => {
                (bipolar_volts(raw) + BIPOLAR_VOLTS) / (2.0 * BIPOLAR_VOLTS) * full_scale
            }
        }
    }

    /// Terminal voltage behind a span-mapped reading, for display next to
    /// the scaled value.
    pub fn input_voltage(&self, raw: u16) -> Option<f32> {
        match self {
            Scaling::Bipolar10V | Scaling::Bipolar10VSpan { .. } => Some(bipolar_volts(raw)),
            _ => None,
        }
    }
}

fn bipolar_volts(raw: u16) -> f32 {
    as_signed(raw) as f32 / BIPOLAR_FULL_SCALE * BIPOLAR_VOLTS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_signed_interpretation() {
        assert_eq!(as_signed(32767), 32767);
        assert_eq!(as_signed(32768), -32768);
        assert_eq!(as_signed(65535), -1);
    }

    #[test]
    fn test_linear_gain() {
        assert_close(Scaling::gain(0.001755).scale(10000), 17.55);
        assert_close(Scaling::gain(0.00504).scale(10000), 50.4);
        assert_close(Scaling::gain(100.0 / 10000.0).scale(4500), 45.0);
    }

    #[test]
    fn test_linear_offset() {
        // (raw + 2990) * 60 / 16000
        assert_close(
            Scaling::offset_gain(2990.0, 60.0 / 16000.0).scale(3410),
            24.0,
        );
        // (raw - 4000) * 60 / 16000 can go negative below 4 mA
        assert_close(
            Scaling::offset_gain(-4000.0, 60.0 / 16000.0).scale(0),
            -15.0,
        );
    }

    #[test]
    fn test_linear_signed() {
        let scaling = Scaling::Linear {
            gain: 0.1,
            offset: 0.0,
            signed: true,
        };
        assert_close(scaling.scale(0xFFF6), -1.0);
    }

    #[test]
    fn test_current_loop() {
        let temp = Scaling::CurrentLoop { full_scale: 60.0 };
        assert_close(temp.scale(4000), 0.0);
        assert_close(temp.scale(12000), 30.0);
        assert_close(temp.scale(20000), 60.0);

        let rh = Scaling::CurrentLoop { full_scale: 100.0 };
        assert_close(rh.scale(10400), 40.0);
    }

    #[test]
    fn test_percent_of_span() {
        let temp = Scaling::PercentOfSpan { full_scale: 60.0 };
        assert_close(temp.scale(10000), 30.0);
        assert_close(temp.scale(20000), 60.0);
        assert_close(temp.scale((-10000i16) as u16), -30.0);
    }

    #[test]
    fn test_bipolar_voltage() {
        assert_close(Scaling::Bipolar10V.scale(32767), 10.0);
        assert_close(Scaling::Bipolar10V.scale(0), 0.0);
        assert_close(Scaling::Bipolar10V.scale((-32767i16) as u16), -10.0);
        assert_eq!(Scaling::Bipolar10V.input_voltage(0), Some(0.0));
    }

    #[test]
    fn test_bipolar_span() {
        let rh = Scaling::Bipolar10VSpan { full_scale: 100.0 };
        assert_close(rh.scale(0), 50.0);
        assert_close(rh.scale(32767), 100.0);
        assert_close(rh.scale((-32767i16) as u16), 0.0);
        let volts = rh.input_voltage(16384).unwrap();
        assert_close(volts, 5.0);
    }

    #[test]
    fn test_no_input_voltage_for_linear() {
        assert_eq!(Scaling::gain(1.0).input_voltage(100), None);
    }
}
