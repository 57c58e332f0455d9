use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Server-side weighting requested with each prediction. Opaque to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Conservative,
        Strategy::Balanced,
        Strategy::Aggressive,
        Strategy::Random,
    ];

    /// Value sent as the `strategy` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Conservative => "conservative",
            Strategy::Balanced => "balanced",
            Strategy::Aggressive => "aggressive",
            Strategy::Random => "random",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Conservative => "Conservative",
            Strategy::Balanced => "Balanced",
            Strategy::Aggressive => "Aggressive",
            Strategy::Random => "Random",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            Strategy::Conservative => "mostly hot numbers",
            Strategy::Balanced => "hot and warm mix",
            Strategy::Aggressive => "hot, warm and cold mix",
            Strategy::Random => "uniform exploration",
        }
    }

    /// 1-based position in the selector, used for the number-key shortcuts.
    pub fn from_index(idx: usize) -> Option<Self> {
        idx.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == key)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallKind {
    Red,
    Blue,
}

impl BallKind {
    pub fn label(self) -> &'static str {
        match self {
            BallKind::Red => "Red ball",
            BallKind::Blue => "Blue ball",
        }
    }
}

/// Per-ball annotation, only sent by the realtime prediction endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BallDetail {
    pub number: u32,
    pub probability: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelInfo {
    pub window_size: Option<u32>,
    pub trained_at: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionResult {
    pub red_balls: Vec<u32>,
    pub blue_balls: Vec<u32>,
    pub confidence: Option<f64>,
    pub model: Option<String>,
    pub based_on_count: Option<u32>,
    pub strategy: Option<String>,
    pub data_source: Option<String>,
    pub timestamp: Option<String>,
    pub red_details: Vec<BallDetail>,
    pub blue_details: Vec<BallDetail>,
    pub model_info: Option<ModelInfo>,
}

impl PredictionResult {
    pub fn new(red_balls: Vec<u32>, blue_balls: Vec<u32>) -> Self {
        Self {
            red_balls,
            blue_balls,
            ..Self::default()
        }
    }

    pub fn balls(&self, kind: BallKind) -> &[u32] {
        match kind {
            BallKind::Red => &self.red_balls,
            BallKind::Blue => &self.blue_balls,
        }
    }

    pub fn detail_for(&self, kind: BallKind, number: u32) -> Option<&BallDetail> {
        let details = match kind {
            BallKind::Red => &self.red_details,
            BallKind::Blue => &self.blue_details,
        };
        details.iter().find(|d| d.number == number)
    }

    /// Sample size, from the flat field or the realtime `model_info` block.
    pub fn sample_size(&self) -> Option<u32> {
        self.based_on_count
            .or_else(|| self.model_info.as_ref().and_then(|m| m.window_size))
    }

    pub fn model_label(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or_else(|| self.model_info.as_ref().and_then(|m| m.method.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryEntry {
    pub period: String,
    pub date: String,
    pub red_balls: Vec<u32>,
    pub blue_balls: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryResult {
    /// Most recent draw first.
    pub history: Vec<HistoryEntry>,
    pub total: Option<u32>,
    /// Entries dropped because they were not objects.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionLogEntry {
    pub timestamp: String,
    pub strategy: Strategy,
    pub data: PredictionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Aggressive".parse::<Strategy>(), Ok(Strategy::Aggressive));
        assert_eq!(" random ".parse::<Strategy>(), Ok(Strategy::Random));
        assert!("greedy".parse::<Strategy>().is_err());
    }

    #[test]
    fn strategy_index_is_one_based() {
        assert_eq!(Strategy::from_index(1), Some(Strategy::Conservative));
        assert_eq!(Strategy::from_index(4), Some(Strategy::Random));
        assert_eq!(Strategy::from_index(0), None);
        assert_eq!(Strategy::from_index(5), None);
    }

    #[test]
    fn sample_size_falls_back_to_model_info() {
        let mut result = PredictionResult::new(vec![1], vec![2]);
        assert_eq!(result.sample_size(), None);
        result.model_info = Some(ModelInfo {
            window_size: Some(50),
            ..ModelInfo::default()
        });
        assert_eq!(result.sample_size(), Some(50));
        result.based_on_count = Some(100);
        assert_eq!(result.sample_size(), Some(100));
    }
}
