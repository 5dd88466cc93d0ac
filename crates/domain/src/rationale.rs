//! Structured scoring rationale.
//!
//! Kept as a tagged union internally; flattened to a key/value JSON map only at
//! the API boundary. Drift feature extraction reads `amount_diff_ratio` from
//! outcome snapshots, so that field must survive every representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Which amount-agreement band a candidate pair landed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountBand {
    Exact,
    Close,
    Approximate,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountMatch {
    /// `|bank − outstanding| / outstanding`.
    pub diff_ratio: f64,
    pub band: AmountBand,
    pub score: u8,
}

/// Description/name agreement. Mutually exclusive; invoice number preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextMatch {
    InvoiceNumber { score: u8 },
    CustomerName { score: u8 },
    None,
}

impl TextMatch {
    pub fn score(&self) -> u8 {
        match self {
            TextMatch::InvoiceNumber { score } | TextMatch::CustomerName { score } => *score,
            TextMatch::None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMatch {
    /// Absolute day distance between bank date and invoice due date.
    pub day_diff: i64,
    pub score: u8,
}

/// Full explanation of one confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchRationale {
    pub amount: AmountMatch,
    pub text: TextMatch,
    pub date: DateMatch,
}

impl MatchRationale {
    /// Sum of sub-scores, capped at 100.
    pub fn total_score(&self) -> u8 {
        let sum =
            self.amount.score as u16 + self.text.score() as u16 + self.date.score as u16;
        sum.min(100) as u8
    }

    pub fn amount_diff_ratio(&self) -> f64 {
        self.amount.diff_ratio
    }

    /// Flat key/value map for API responses and audit snapshots.
    pub fn to_api_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("amount_diff_ratio".into(), json!(self.amount.diff_ratio));
        map.insert("amount_band".into(), json!(self.amount.band));
        map.insert("amount_score".into(), json!(self.amount.score));
        let (text_kind, text_score) = match self.text {
            TextMatch::InvoiceNumber { score } => ("invoice_number", score),
            TextMatch::CustomerName { score } => ("customer_name", score),
            TextMatch::None => ("none", 0),
        };
        map.insert("text_match".into(), json!(text_kind));
        map.insert("text_score".into(), json!(text_score));
        map.insert("date_day_diff".into(), json!(self.date.day_diff));
        map.insert("date_score".into(), json!(self.date.score));
        map.insert("total_score".into(), json!(self.total_score()));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_score_is_capped_at_100() {
        let r = MatchRationale {
            amount: AmountMatch {
                diff_ratio: 0.0,
                band: AmountBand::Exact,
                score: 90,
            },
            text: TextMatch::InvoiceNumber { score: 30 },
            date: DateMatch { day_diff: 0, score: 15 },
        };
        assert_eq!(r.total_score(), 100);
    }

    #[test]
    fn api_map_exposes_amount_diff_ratio() {
        let r = MatchRationale {
            amount: AmountMatch {
                diff_ratio: 0.034,
                band: AmountBand::Close,
                score: 25,
            },
            text: TextMatch::None,
            date: DateMatch { day_diff: 9, score: 5 },
        };
        let map = r.to_api_map();
        assert!((map["amount_diff_ratio"].as_f64().unwrap() - 0.034).abs() < 1e-12);
        assert_eq!(map["text_match"], "none");
        assert_eq!(map["total_score"], 30);
    }
}
