use serde::{Deserialize, Serialize};
use serde_json::json;

/// Wire shape the simulated device emits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    Json,
    Prefixed,
}

/// Renders one detection line without its terminator.
pub fn format_line(
    format: LineFormat,
    label: &str,
    confidence: f64,
    locator: Option<&str>,
) -> String {
    match (format, locator) {
        (LineFormat::Json, Some(locator)) => json!({
            "Detected": label,
            "Confidence": confidence,
            "RTSP": locator,
        })
        .to_string(),
        (LineFormat::Json, None) => json!({
            "Detected": label,
            "Confidence": confidence,
        })
        .to_string(),
        (LineFormat::Prefixed, Some(locator)) => format!(
            "Detected: {}, Confidence: {:.2}, RTSP: {}",
            label, confidence, locator
        ),
        (LineFormat::Prefixed, None) => {
            format!("Detected: {}, Confidence: {:.2}", label, confidence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_lines_round_to_two_places() {
        assert_eq!(
            format_line(LineFormat::Prefixed, "close", 0.876, None),
            "Detected: close, Confidence: 0.88"
        );
    }

    #[test]
    fn json_lines_carry_locator() {
        let line = format_line(LineFormat::Json, "Open", 0.5, Some("rtsp://cam1"));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["RTSP"], "rtsp://cam1");
        assert_eq!(value["Detected"], "Open");
    }
}
