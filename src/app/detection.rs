// SPDX-License-Identifier: GPL-3.0-only

//! Detection sources for capture sessions
//!
//! A session is parameterised by what drives it: the shutter button, a code
//! scanner or a face detector. The source decides which stream analysis is
//! requested and which events the session reacts to.

use crate::backends::camera::types::{CodeKind, FaceDelivery, StreamAnalysis};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionSource {
    /// Manual capture through the shutter, with a confirm step
    PhotoOnly,
    /// First decoded code completes the session
    CodeScanner { kinds: Vec<CodeKind> },
    /// A face appearing in view triggers one capture
    FaceTrigger { delivery: FaceDelivery },
}

impl DetectionSource {
    /// Stream analysis requested when the session goes live
    pub fn analysis(&self) -> StreamAnalysis {
        match self {
            DetectionSource::PhotoOnly => StreamAnalysis::none(),
            DetectionSource::CodeScanner { kinds } => StreamAnalysis {
                codes: kinds.clone(),
                faces: None,
            },
            DetectionSource::FaceTrigger { delivery } => StreamAnalysis {
                codes: Vec::new(),
                faces: Some(*delivery),
            },
        }
    }

    /// Whether the user triggers captures with the shutter
    pub fn has_shutter(&self) -> bool {
        matches!(self, DetectionSource::PhotoOnly)
    }

    /// Whether a detector runs passively while live
    pub fn is_passive(&self) -> bool {
        !self.has_shutter()
    }

    /// Whether photo results need an explicit confirm
    pub fn confirms_result(&self) -> bool {
        matches!(self, DetectionSource::PhotoOnly)
    }

    pub fn accepts_code(&self, kind: CodeKind) -> bool {
        match self {
            DetectionSource::CodeScanner { kinds } => kinds.contains(&kind),
            _ => false,
        }
    }

    pub fn is_face_trigger(&self) -> bool {
        matches!(self, DetectionSource::FaceTrigger { .. })
    }

    /// Short label for status lines
    pub fn label(&self) -> &'static str {
        match self {
            DetectionSource::PhotoOnly => "photo",
            DetectionSource::CodeScanner { .. } => "scanner",
            DetectionSource::FaceTrigger {
                delivery: FaceDelivery::FrameProcessor,
            } => "faces (frame processor)",
            DetectionSource::FaceTrigger {
                delivery: FaceDelivery::Callback,
            } => "faces (callback)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_per_source() {
        assert!(!DetectionSource::PhotoOnly.analysis().is_active());

        let scanner = DetectionSource::CodeScanner {
            kinds: vec![CodeKind::Qr],
        };
        assert_eq!(scanner.analysis().codes, vec![CodeKind::Qr]);
        assert!(scanner.accepts_code(CodeKind::Qr));
        assert!(!scanner.accepts_code(CodeKind::Ean13));

        let faces = DetectionSource::FaceTrigger {
            delivery: FaceDelivery::Callback,
        };
        assert_eq!(faces.analysis().faces, Some(FaceDelivery::Callback));
        assert!(faces.is_passive());
        assert!(!faces.has_shutter());
    }
}
