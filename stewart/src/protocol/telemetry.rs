use serde::{Deserialize, Serialize};

pub const TELEMETRY_PREFIX: &str = "FB:";

/// Orientation and temperature reported by the controller board's IMU.
///
/// Angles in degrees, temperature in degrees Celsius. Display only; it never
/// feeds back into the solver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub temperature: f64,
}

impl Telemetry {
    /// Parses an inbound `FB:` line. Anything else, including non-finite
    /// fields, yields `None`.
    pub fn parse(line: &str) -> Option<Telemetry> {
        let data = line.strip_prefix(TELEMETRY_PREFIX)?.trim();
        let parts: Vec<&str> = data.split(',').collect();
        if parts.len() != 4 {
            return None;
        }
        let field = |i: usize| {
            parts[i]
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
        };
        Some(Telemetry {
            roll: field(0)?,
            pitch: field(1)?,
            yaw: field(2)?,
            temperature: field(3)?,
        })
    }

    /// Formats the line the board sends, one decimal per field.
    pub fn to_line(&self) -> String {
        format!(
            "{}{:.1},{:.1},{:.1},{:.1}\n",
            TELEMETRY_PREFIX, self.roll, self.pitch, self.yaw, self.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feedback_line() {
        let telemetry = Telemetry::parse("FB:1.2,-3.4,5.6,7.8\n").unwrap();
        assert_eq!(telemetry.roll, 1.2);
        assert_eq!(telemetry.pitch, -3.4);
        assert_eq!(telemetry.yaw, 5.6);
        assert_eq!(telemetry.temperature, 7.8);
    }

    #[test]
    fn tolerates_carriage_return_and_spaces() {
        let telemetry = Telemetry::parse("FB: 0.5, 1 ,2,36.6\r").unwrap();
        assert_eq!(telemetry.temperature, 36.6);
        assert_eq!(telemetry.pitch, 1.0);
    }

    #[test]
    fn ignores_malformed_lines() {
        assert_eq!(Telemetry::parse("FB:bad\n"), None);
        assert_eq!(Telemetry::parse("FB:1,2,3\n"), None);
        assert_eq!(Telemetry::parse("FB:1,2,3,4,5\n"), None);
        assert_eq!(Telemetry::parse("FB:1,2,x,4\n"), None);
        assert_eq!(Telemetry::parse("1.2,-3.4,5.6,7.8\n"), None);
        assert_eq!(Telemetry::parse("READY\n"), None);
        assert_eq!(Telemetry::parse(""), None);
    }

    #[test]
    fn rejects_non_finite_fields() {
        assert_eq!(Telemetry::parse("FB:NaN,inf,1,2\n"), None);
        assert_eq!(Telemetry::parse("FB:1,2,3,-inf\n"), None);
        assert_eq!(Telemetry::parse("FB:1,nan,3,4\n"), None);
        assert!(Telemetry::parse("FB:1,2,3,4\n").is_some());
    }

    #[test]
    fn formatted_line_parses_back() {
        let telemetry = Telemetry {
            roll: 1.0,
            pitch: -2.5,
            yaw: 180.0,
            temperature: 24.5,
        };
        let line = telemetry.to_line();
        assert_eq!(line, "FB:1.0,-2.5,180.0,24.5\n");
        assert_eq!(Telemetry::parse(&line), Some(telemetry));
    }
}
