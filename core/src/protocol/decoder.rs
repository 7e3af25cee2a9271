use crate::prelude::{AlarmConfig, ConfidencePolicy, DecodeError, DecodeResult};
use crate::protocol::message::DetectionMessage;
use crate::protocol::record::{CategoryMap, DetectionRecord};
use log::warn;

/// Turns raw transport lines into detection records.
pub struct LineDecoder {
    categories: CategoryMap,
    confidence_policy: ConfidencePolicy,
}

impl LineDecoder {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            categories: CategoryMap::new(config.categories.clone()),
            confidence_policy: config.confidence_policy,
        }
    }

    pub fn decode(&self, line: &str) -> DecodeResult<DetectionRecord> {
        let (raw_label, confidence, stream_locator) = DetectionMessage::parse(line)?.into_fields()?;

        if !confidence.is_finite() {
            return Err(DecodeError::InvalidConfidence(confidence.to_string()));
        }
        let confidence = match self.confidence_policy {
            ConfidencePolicy::Clamp if !(0.0..=1.0).contains(&confidence) => {
                warn!("confidence {} out of range, clamping", confidence);
                confidence.clamp(0.0, 1.0)
            }
            _ => confidence,
        };

        let (category, canonical) = self.categories.classify(&raw_label);
        let label = canonical.map(str::to_string).unwrap_or(raw_label);

        Ok(DetectionRecord::new(label, confidence, stream_locator, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::record::Category;

    fn decoder_with(policy: ConfidencePolicy) -> LineDecoder {
        LineDecoder::new(&AlarmConfig {
            confidence_policy: policy,
            ..Default::default()
        })
    }

    #[test]
    fn decodes_mixed_case_labels_to_canonical_names() {
        let decoder = decoder_with(ConfidencePolicy::Clamp);
        for (line, label, category) in [
            (r#"{"Detected":"close","Confidence":0.25}"#, "Close", Category::Fatigue),
            (r#"{"Detected":"OPEN","Confidence":1.0}"#, "Open", Category::Alert),
            ("Detected: cLoSe, Confidence: 0.0", "Close", Category::Fatigue),
        ] {
            let record = decoder.decode(line).unwrap();
            assert_eq!(record.label, label);
            assert_eq!(record.category, category);
        }
    }

    #[test]
    fn keeps_exact_confidence_in_range() {
        let record = decoder_with(ConfidencePolicy::Clamp)
            .decode("Detected: close, Confidence: 0.90")
            .unwrap();
        assert_eq!(record.confidence, 0.90);
        assert!(record.is_fatigue());
    }

    #[test]
    fn unknown_label_is_kept_verbatim() {
        let record = decoder_with(ConfidencePolicy::Clamp)
            .decode(r#"{"Detected":"Yawn","Confidence":0.4}"#)
            .unwrap();
        assert_eq!(record.label, "Yawn");
        assert_eq!(record.category, Category::Unknown);
    }

    #[test]
    fn clamp_policy_bounds_confidence() {
        let decoder = decoder_with(ConfidencePolicy::Clamp);
        assert_eq!(decoder.decode("Detected: open, Confidence: 1.7").unwrap().confidence, 1.0);
        assert_eq!(decoder.decode("Detected: open, Confidence: -2").unwrap().confidence, 0.0);
    }

    #[test]
    fn pass_through_policy_keeps_confidence() {
        let decoder = decoder_with(ConfidencePolicy::PassThrough);
        assert_eq!(decoder.decode("Detected: open, Confidence: 1.7").unwrap().confidence, 1.7);
    }

    #[test]
    fn non_finite_confidence_is_rejected() {
        let err = decoder_with(ConfidencePolicy::PassThrough)
            .decode("Detected: open, Confidence: NaN")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidConfidence(_)));
    }
}
