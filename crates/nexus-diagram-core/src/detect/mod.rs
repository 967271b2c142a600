use serde::Serialize;

/// Diagram dialects the pipeline knows how to repair or simplify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    EntityRelationship,
    Class,
    Unknown,
}

impl DiagramKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::EntityRelationship => "entityRelationship",
            Self::Class => "classDiagram",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type DetectorFn = fn(text: &str) -> bool;

#[derive(Debug, Clone)]
pub struct Detector {
    pub kind: DiagramKind,
    pub detector: DetectorFn,
}

/// Ordered list of substring detectors; the first match wins.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        let mut reg = Self::new();

        // The order is significant: a source mentioning both `graph ` and `sequenceDiagram`
        // is simplified as a flowchart.
        reg.add_fn(DiagramKind::Flowchart, detector_flowchart);
        reg.add_fn(DiagramKind::Sequence, detector_sequence);
        reg.add_fn(DiagramKind::EntityRelationship, detector_er);
        reg.add_fn(DiagramKind::Class, detector_class);

        reg
    }
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add(&mut self, detector: Detector) {
        self.detectors.push(detector);
    }

    pub fn add_fn(&mut self, kind: DiagramKind, detector: DetectorFn) {
        self.add(Detector { kind, detector });
    }

    pub fn detect(&self, text: &str) -> DiagramKind {
        self.detectors
            .iter()
            .find(|det| (det.detector)(text))
            .map(|det| det.kind)
            .unwrap_or(DiagramKind::Unknown)
    }
}

/// Detects the diagram kind with the default detector order.
pub fn detect_kind(text: &str) -> DiagramKind {
    static REGISTRY: std::sync::OnceLock<DetectorRegistry> = std::sync::OnceLock::new();
    REGISTRY.get_or_init(DetectorRegistry::default).detect(text)
}

fn detector_flowchart(text: &str) -> bool {
    text.contains("flowchart") || text.contains("graph ")
}

fn detector_sequence(text: &str) -> bool {
    text.contains("sequenceDiagram")
}

pub(crate) fn detector_er(text: &str) -> bool {
    text.contains("erDiagram")
}

fn detector_class(text: &str) -> bool {
    text.contains("classDiagram")
}
