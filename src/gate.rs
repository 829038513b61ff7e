//! Budget gate - decides whether phase-2 planning is worth paying for
//!
//! One completion call combines the computed minimum stay cost with the
//! free-text transport findings, constrained to a two-shape answer grammar.
//! The parser is a total function over a closed outcome set: anything the
//! model says that does not match the grammar becomes `Unparseable`, never a
//! panic and never a silent misclassification.

use std::sync::Arc;

use tracing::{debug, info};

use crate::budget::BudgetParameters;
use crate::crew::{AgentProfile, CompletionError, CompletionService};

/// Sufficiency verdict for one budget evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Sufficient,
    /// Estimated minimum total the trip actually needs
    Insufficient(f64),
    /// The model's answer did not match the expected grammar
    Unparseable(String),
}

/// Gate over the completion service
pub struct BudgetGate {
    service: Arc<dyn CompletionService>,
}

impl BudgetGate {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Evaluate budget sufficiency against phase-1 transport findings
    pub async fn evaluate(
        &self,
        params: &BudgetParameters,
        transport_findings: &str,
    ) -> Result<ValidationOutcome, CompletionError> {
        let minimum_stay = params.minimum_stay_cost();
        let unit = params.currency.symbol();
        debug!(minimum_stay, budget = params.ceiling, "evaluate: called");

        let instruction = format!(
            "Analyze travel data:\n\
             Budget: {unit}{budget}. People: {people}. Duration: {days} days.\n\
             Transport Found: {findings}\n\
             Rule: A {days}-day stay for {people} people typically requires {unit}{minimum_stay} for food/hotel.\n\n\
             If (Transport + Stay) > {budget}, answer exactly 'INSUFFICIENT: <estimated minimum total>'.\n\
             Otherwise answer exactly 'SUFFICIENT'.",
            budget = params.ceiling,
            people = params.travelers,
            days = params.duration_days,
            findings = transport_findings,
        );

        let auditor = AgentProfile::new(
            "Budget Auditor",
            "Judge whether the trip budget covers transport plus minimum stay costs",
            "A strict accountant who answers only in the required format.",
            [],
        );

        let answer = self
            .service
            .complete(&auditor, &instruction, "SUFFICIENT or INSUFFICIENT: <amount>", "")
            .await?;

        let outcome = parse_verdict(&answer);
        info!(?outcome, "evaluate: verdict parsed");
        Ok(outcome)
    }
}

/// Parse the gate answer into a verdict
///
/// Accepted shapes (leading token case-insensitive, surrounding whitespace
/// ignored): `SUFFICIENT` and `INSUFFICIENT: <amount>`. The amount may carry
/// a currency symbol and thousands separators and must be positive.
/// Everything else is `Unparseable`.
pub fn parse_verdict(raw: &str) -> ValidationOutcome {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();

    if upper.starts_with("INSUFFICIENT") {
        let Some((_, remainder)) = trimmed.split_once(':') else {
            return ValidationOutcome::Unparseable(raw.to_string());
        };
        return match parse_amount(remainder) {
            Some(amount) => ValidationOutcome::Insufficient(amount),
            None => ValidationOutcome::Unparseable(raw.to_string()),
        };
    }

    if upper.starts_with("SUFFICIENT") {
        return ValidationOutcome::Sufficient;
    }

    ValidationOutcome::Unparseable(raw.to_string())
}

/// Parse a currency amount, tolerating symbols and thousands separators
///
/// An estimated minimum is a cost, so zero and negative amounts are rejected.
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '₹' | ',') && !c.is_whitespace())
        .collect();
    let amount = cleaned.parse::<f64>().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::CurrencyUnit;
    use crate::crew::mock::ScriptedCompletion;

    #[tokio::test]
    async fn test_evaluate_embeds_findings_and_minimum() {
        let service = Arc::new(ScriptedCompletion::new(vec![Ok("SUFFICIENT".to_string())]));
        let gate = BudgetGate::new(service.clone());

        let params = BudgetParameters::new(CurrencyUnit::Usd, 2000.0, 3, 1, 100.0).unwrap();
        let outcome = gate.evaluate(&params, "Round trip $800 on AI-130").await.unwrap();
        assert_eq!(outcome, ValidationOutcome::Sufficient);

        let call = &service.calls()[0];
        assert!(call.instruction.contains("$300"), "minimum stay missing: {}", call.instruction);
        assert!(call.instruction.contains("Round trip $800 on AI-130"));
        assert_eq!(call.role, "Budget Auditor");
    }

    #[tokio::test]
    async fn test_evaluate_propagates_collaborator_failure() {
        let service = Arc::new(ScriptedCompletion::new(vec![Err(CompletionError::EmptyResponse)]));
        let gate = BudgetGate::new(service);

        let params = BudgetParameters::new(CurrencyUnit::Usd, 2000.0, 3, 1, 100.0).unwrap();
        assert!(gate.evaluate(&params, "findings").await.is_err());
    }

    #[test]
    fn test_sufficient_plain() {
        assert_eq!(parse_verdict("SUFFICIENT"), ValidationOutcome::Sufficient);
    }

    #[test]
    fn test_sufficient_any_casing_and_whitespace() {
        assert_eq!(parse_verdict("  sufficient  "), ValidationOutcome::Sufficient);
        assert_eq!(parse_verdict("\nSufficient."), ValidationOutcome::Sufficient);
    }

    #[test]
    fn test_insufficient_with_amount() {
        assert_eq!(parse_verdict("INSUFFICIENT: 450"), ValidationOutcome::Insufficient(450.0));
    }

    #[test]
    fn test_insufficient_strips_symbol_and_commas() {
        assert_eq!(
            parse_verdict("insufficient:$1,200"),
            ValidationOutcome::Insufficient(1200.0)
        );
        assert_eq!(
            parse_verdict("INSUFFICIENT: ₹ 85,000"),
            ValidationOutcome::Insufficient(85000.0)
        );
    }

    #[test]
    fn test_insufficient_decimal_amount() {
        assert_eq!(
            parse_verdict("INSUFFICIENT: 3200.50"),
            ValidationOutcome::Insufficient(3200.5)
        );
    }

    #[test]
    fn test_insufficient_without_colon_is_unparseable() {
        assert_eq!(
            parse_verdict("INSUFFICIENT 450"),
            ValidationOutcome::Unparseable("INSUFFICIENT 450".to_string())
        );
    }

    #[test]
    fn test_insufficient_with_garbage_amount_is_unparseable() {
        assert!(matches!(
            parse_verdict("INSUFFICIENT: [Estimated Minimum Total]"),
            ValidationOutcome::Unparseable(_)
        ));
        assert!(matches!(
            parse_verdict("INSUFFICIENT: about 450 dollars"),
            ValidationOutcome::Unparseable(_)
        ));
    }

    #[test]
    fn test_insufficient_non_positive_amount_is_unparseable() {
        assert!(matches!(
            parse_verdict("INSUFFICIENT: -450"),
            ValidationOutcome::Unparseable(_)
        ));
        assert!(matches!(parse_verdict("INSUFFICIENT: 0"), ValidationOutcome::Unparseable(_)));
    }

    #[test]
    fn test_free_text_is_unparseable() {
        assert_eq!(
            parse_verdict("I'm not sure"),
            ValidationOutcome::Unparseable("I'm not sure".to_string())
        );
        assert!(matches!(parse_verdict(""), ValidationOutcome::Unparseable(_)));
    }

    #[test]
    fn test_insufficient_not_mistaken_for_sufficient() {
        // "INSUFFICIENT" contains "SUFFICIENT" as a substring; the prefix
        // check must win.
        assert!(matches!(
            parse_verdict("INSUFFICIENT: 100"),
            ValidationOutcome::Insufficient(_)
        ));
    }
}
