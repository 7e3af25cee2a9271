use crate::prelude::{DecodeError, DecodeResult};
use serde::Deserialize;

const TEXT_PREFIX: &str = "Detected:";

/// JSON form: `{"Detected":"Open","Confidence":0.5,"RTSP":"rtsp://cam1"}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StructuredMessage {
    #[serde(rename = "Detected")]
    pub detected: Option<String>,
    #[serde(rename = "Confidence")]
    pub confidence: Option<f64>,
    #[serde(rename = "RTSP")]
    pub rtsp: Option<String>,
}

/// Text form: `Detected: close, Confidence: 0.85[, RTSP: rtsp://cam1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixedMessage {
    pub label: String,
    pub confidence: String,
    pub rtsp: Option<String>,
}

/// The two inbound message shapes the device has been seen to emit.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionMessage {
    Structured(StructuredMessage),
    PrefixedText(PrefixedMessage),
}

impl DetectionMessage {
    pub fn parse(line: &str) -> DecodeResult<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(DecodeError::Empty);
        }

        if line.starts_with('{') {
            parse_structured(line).map(DetectionMessage::Structured)
        } else if line.starts_with(TEXT_PREFIX) {
            parse_prefixed(line).map(DetectionMessage::PrefixedText)
        } else {
            Err(DecodeError::UnrecognizedShape)
        }
    }

    /// Returns `(label, confidence, stream locator)` with the raw label untouched.
    pub fn into_fields(self) -> DecodeResult<(String, f64, Option<String>)> {
        match self {
            DetectionMessage::Structured(msg) => {
                let label = non_empty(msg.detected).ok_or(DecodeError::MissingField("Detected"))?;
                let confidence = msg
                    .confidence
                    .ok_or(DecodeError::MissingField("Confidence"))?;
                Ok((label, confidence, non_empty(msg.rtsp)))
            }
            DetectionMessage::PrefixedText(msg) => {
                if msg.label.is_empty() {
                    return Err(DecodeError::MissingField("Detected"));
                }
                let confidence = msg
                    .confidence
                    .parse::<f64>()
                    .map_err(|_| DecodeError::InvalidConfidence(msg.confidence.clone()))?;
                Ok((msg.label, confidence, msg.rtsp))
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_structured(line: &str) -> DecodeResult<StructuredMessage> {
    serde_json::from_str(line).map_err(|err| DecodeError::Structured(err.to_string()))
}

fn parse_prefixed(line: &str) -> DecodeResult<PrefixedMessage> {
    let rest = &line[TEXT_PREFIX.len()..];
    let mut segments = rest.splitn(3, ',');

    let label = segments.next().unwrap_or_default().trim().to_string();
    let confidence = segments
        .next()
        .and_then(|segment| segment.split_once(':'))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("Confidence"))
        .map(|(_, value)| value)
        .ok_or(DecodeError::MissingSegment("Confidence"))?;

    // RTSP URLs carry their own colons, so only the first one separates the key.
    let rtsp = segments.next().and_then(|segment| {
        let (key, value) = segment.split_once(':')?;
        let value = value.trim();
        (key.trim().eq_ignore_ascii_case("RTSP") && !value.is_empty()).then(|| value.to_string())
    });

    Ok(PrefixedMessage {
        label,
        confidence: confidence.trim().to_string(),
        rtsp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_record() {
        let msg =
            DetectionMessage::parse(r#"{"Detected":"Open","Confidence":0.5,"RTSP":"rtsp://cam1"}"#)
                .unwrap();
        let (label, confidence, rtsp) = msg.into_fields().unwrap();
        assert_eq!(label, "Open");
        assert_eq!(confidence, 0.5);
        assert_eq!(rtsp.as_deref(), Some("rtsp://cam1"));
    }

    #[test]
    fn structured_record_without_label_is_rejected() {
        let msg = DetectionMessage::parse(r#"{"Confidence":0.5}"#).unwrap();
        assert_eq!(
            msg.into_fields().unwrap_err(),
            DecodeError::MissingField("Detected")
        );
    }

    #[test]
    fn structured_record_with_text_confidence_is_rejected() {
        let err = DetectionMessage::parse(r#"{"Detected":"Close","Confidence":"high"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Structured(_)));
    }

    #[test]
    fn truncated_json_is_rejected() {
        let err = DetectionMessage::parse(r#"{"Detected":"Close","#).unwrap_err();
        assert!(matches!(err, DecodeError::Structured(_)));
    }

    #[test]
    fn parses_prefixed_text() {
        let msg = DetectionMessage::parse("Detected: close, Confidence: 0.85").unwrap();
        assert_eq!(
            msg,
            DetectionMessage::PrefixedText(PrefixedMessage {
                label: "close".into(),
                confidence: "0.85".into(),
                rtsp: None,
            })
        );
    }

    #[test]
    fn prefixed_text_may_carry_locator() {
        let msg = DetectionMessage::parse(
            "Detected: open, Confidence: 0.7, RTSP: rtsp://192.168.1.20:554/live",
        )
        .unwrap();
        let (_, _, rtsp) = msg.into_fields().unwrap();
        assert_eq!(rtsp.as_deref(), Some("rtsp://192.168.1.20:554/live"));
    }

    #[test]
    fn prefixed_text_without_comma_is_rejected() {
        assert_eq!(
            DetectionMessage::parse("Detected: close").unwrap_err(),
            DecodeError::MissingSegment("Confidence")
        );
    }

    #[test]
    fn prefixed_text_with_wrong_confidence_key_is_rejected() {
        assert_eq!(
            DetectionMessage::parse("Detected: close, Foo: 0.9").unwrap_err(),
            DecodeError::MissingSegment("Confidence")
        );
        assert!(DetectionMessage::parse("Detected: close, confidence: 0.9").is_ok());
    }

    #[test]
    fn prefixed_text_with_non_numeric_confidence_is_rejected() {
        let msg = DetectionMessage::parse("Detected: close, Confidence: abc").unwrap();
        assert_eq!(
            msg.into_fields().unwrap_err(),
            DecodeError::InvalidConfidence("abc".into())
        );
    }

    #[test]
    fn lines_without_known_shape_are_rejected() {
        assert_eq!(
            DetectionMessage::parse("boot ok").unwrap_err(),
            DecodeError::UnrecognizedShape
        );
        assert_eq!(
            DetectionMessage::parse("detected: close, Confidence: 0.1").unwrap_err(),
            DecodeError::UnrecognizedShape
        );
        assert_eq!(DetectionMessage::parse("   ").unwrap_err(), DecodeError::Empty);
    }
}
