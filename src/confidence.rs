use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Coarse reliability hint derived from how many chunks backed the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfidenceSignal {
    pub level: ConfidenceLevel,
    /// Percentage, 0-100.
    pub score: u8,
}

pub fn estimate(chunk_count: usize) -> ConfidenceSignal {
    let (level, score) = match chunk_count {
        n if n >= 4 => (ConfidenceLevel::High, 85),
        n if n >= 2 => (ConfidenceLevel::Medium, 65),
        _ => (ConfidenceLevel::Low, 40),
    };
    ConfidenceSignal { level, score }
}
