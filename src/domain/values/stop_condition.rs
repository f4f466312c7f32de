use crate::domain::entities::instruction::Instruction;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopDecision {
    pub stop: bool,
    pub reason: Option<String>,
}

impl StopDecision {
    pub fn proceed() -> Self {
        Self { stop: false, reason: None }
    }

    pub fn stop(reason: String) -> Self {
        Self { stop: true, reason: Some(reason) }
    }
}

/// Decides whether an instruction has reached a terminal condition before
/// `target` is serviced. The cap is checked first.
pub fn should_stop(instruction: &Instruction, target: NaiveDate) -> StopDecision {
    if let Some(cap) = instruction.installment_cap {
        if instruction.execution_count >= cap {
            return StopDecision::stop(format!(
                "Installment cap reached ({}/{})",
                instruction.execution_count, cap
            ));
        }
    }
    if let Some(end) = instruction.end_date {
        if target > end {
            return StopDecision::stop(format!("End date {end} has passed"));
        }
    }
    StopDecision::proceed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::instruction::NewInstruction;
    use crate::domain::values::frequency::Frequency;
    use crate::domain::values::transaction_kind::TransactionKind;
    use rust_decimal::Decimal;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn instruction(cap: Option<u32>, end: Option<&str>) -> Instruction {
        Instruction::new(
            NewInstruction {
                account_id: 1,
                security_code: "VTI".into(),
                security_name: None,
                kind: TransactionKind::RecurringBuy,
                amount: Decimal::from(100),
                frequency: Some(Frequency::Monthly),
                start_date: d("2026-01-01"),
                end_date: end.map(d),
                installment_cap: cap,
            },
            d("2026-01-01"),
        )
        .unwrap()
    }

    #[test]
    fn test_no_limits_never_stops() {
        let i = instruction(None, None);
        assert_eq!(should_stop(&i, d("2099-01-01")), StopDecision::proceed());
    }

    #[test]
    fn test_cap_reached() {
        let mut i = instruction(Some(3), None);
        i.execution_count = 2;
        assert!(!should_stop(&i, d("2026-03-01")).stop);
        i.execution_count = 3;
        let decision = should_stop(&i, d("2026-04-01"));
        assert!(decision.stop);
        assert!(decision.reason.unwrap().contains("3/3"));
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let i = instruction(None, Some("2026-06-30"));
        assert!(!should_stop(&i, d("2026-06-30")).stop);
        let decision = should_stop(&i, d("2026-07-01"));
        assert!(decision.stop);
        assert!(decision.reason.unwrap().contains("2026-06-30"));
    }
}
