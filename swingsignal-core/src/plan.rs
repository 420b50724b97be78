//! Trade plan: whether and how large to act on a decision given the entry quality.

use serde::{Deserialize, Serialize};

use crate::decision::{Action, Decision, RiskLevel};
use crate::entry::{EntryGrade, EntryQuality};

/// Size factor per entry grade. Grades without an entry (poor) size to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeFactorTable {
    pub excellent: f64,
    pub good: f64,
    pub neutral: f64,
}

impl Default for SizeFactorTable {
    fn default() -> Self {
        Self {
            excellent: 1.0,
            good: 0.7,
            neutral: 0.4,
        }
    }
}

impl SizeFactorTable {
    pub fn factor(&self, grade: EntryGrade) -> f64 {
        match grade {
            EntryGrade::Excellent => self.excellent,
            EntryGrade::Good => self.good,
            EntryGrade::Neutral => self.neutral,
            EntryGrade::Poor => 0.0,
        }
    }
}

/// Why a plan does not execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTradeSignal,
    PoorEntryQuality,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::NoTradeSignal => "no trade signal",
            SkipReason::PoorEntryQuality => "entry quality too poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TradePlan {
    Execute {
        direction: Action,
        size_factor: f64,
        risk_level: RiskLevel,
        confidence: f64,
    },
    Skip {
        reason: SkipReason,
    },
}

impl TradePlan {
    pub fn execute(&self) -> bool {
        matches!(self, TradePlan::Execute { .. })
    }

    pub fn size_factor(&self) -> f64 {
        match self {
            TradePlan::Execute { size_factor, .. } => *size_factor,
            TradePlan::Skip { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradePlanBuilder {
    size_factors: SizeFactorTable,
}

impl TradePlanBuilder {
    pub fn new(size_factors: SizeFactorTable) -> Self {
        Self { size_factors }
    }

    pub fn build(&self, decision: &Decision, entry: &EntryQuality) -> TradePlan {
        if !decision.action.is_entry() {
            return TradePlan::Skip {
                reason: SkipReason::NoTradeSignal,
            };
        }
        if entry.grade == EntryGrade::Poor {
            return TradePlan::Skip {
                reason: SkipReason::PoorEntryQuality,
            };
        }
        TradePlan::Execute {
            direction: decision.action,
            size_factor: self.size_factors.factor(entry.grade),
            risk_level: decision.risk_level,
            confidence: decision.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{DecisionNarrative, PositionType};

    fn decision(action: Action) -> Decision {
        Decision {
            action,
            position_type: Some(PositionType::MeanReversion),
            confidence: 0.55,
            risk_level: RiskLevel::Moderate,
            reason: "test",
            narrative: DecisionNarrative {
                summary: "",
                short: "",
                long: "",
                action_hint: "",
            },
        }
    }

    fn entry(grade: EntryGrade) -> EntryQuality {
        EntryQuality {
            score: 0.0,
            grade,
            notes: vec![],
        }
    }

    #[test]
    fn non_entry_actions_do_not_execute() {
        let builder = TradePlanBuilder::default();
        for action in [Action::Hold, Action::Wait, Action::NoTrade, Action::Reduce] {
            let plan = builder.build(&decision(action), &entry(EntryGrade::Excellent));
            assert_eq!(
                plan,
                TradePlan::Skip {
                    reason: SkipReason::NoTradeSignal
                }
            );
            assert!(!plan.execute());
        }
    }

    #[test]
    fn poor_entry_blocks_execution() {
        let plan = TradePlanBuilder::default().build(&decision(Action::Buy), &entry(EntryGrade::Poor));
        assert_eq!(
            plan,
            TradePlan::Skip {
                reason: SkipReason::PoorEntryQuality
            }
        );
        assert_eq!(plan.size_factor(), 0.0);
    }

    #[test]
    fn size_factor_by_grade() {
        let builder = TradePlanBuilder::default();
        let cases = [
            (EntryGrade::Excellent, 1.0),
            (EntryGrade::Good, 0.7),
            (EntryGrade::Neutral, 0.4),
        ];
        for (grade, factor) in cases {
            let plan = builder.build(&decision(Action::Sell), &entry(grade));
            assert!(plan.execute());
            assert_eq!(plan.size_factor(), factor);
        }
    }

    #[test]
    fn execute_carries_decision_fields() {
        let plan = TradePlanBuilder::default().build(&decision(Action::Buy), &entry(EntryGrade::Good));
        assert_eq!(
            plan,
            TradePlan::Execute {
                direction: Action::Buy,
                size_factor: 0.7,
                risk_level: RiskLevel::Moderate,
                confidence: 0.55,
            }
        );
    }

    #[test]
    fn plan_serializes_with_status_tag() {
        let plan = TradePlan::Skip {
            reason: SkipReason::NoTradeSignal,
        };
        let json = serde_json::to_string(&plan).unwrap();
        assert_eq!(json, r#"{"status":"skip","reason":"no_trade_signal"}"#);
    }
}
