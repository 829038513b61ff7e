//! Agent and task registry
//!
//! Builds the three agent profiles and the two task phases from one trip
//! request. All goal and instruction text is interpolated with the run's
//! parameters, so everything here is constructed fresh per run.

use std::sync::Arc;

use crate::crew::{AgentProfile, Capability, TaskId, TaskSpec};

use super::TripRequest;

/// Task id of the sights/weather research task
pub const RESEARCH_TASK: &str = "research";

/// Task id of the flight-options task
pub const TRANSPORT_TASK: &str = "transport";

/// Task id of the final itinerary task
pub const ITINERARY_TASK: &str = "itinerary";

/// The per-run agent roster
pub struct AgentRegistry {
    pub researcher: Arc<AgentProfile>,
    pub transporter: Arc<AgentProfile>,
    pub planner: Arc<AgentProfile>,
}

impl AgentRegistry {
    pub fn for_trip(req: &TripRequest) -> Self {
        let researcher = AgentProfile::new(
            "Local Destination Expert",
            format!(
                "Discover activities in {} for {} suitable for {} people",
                req.destination, req.month, req.travelers
            ),
            "Local expert focusing on group-friendly gems and weather.",
            [Capability::Search],
        );

        let transporter = AgentProfile::new(
            "Global Transport Specialist",
            format!(
                "Find flight details from {} to {} for {} people",
                req.origin, req.destination, req.travelers
            ),
            "Expert in group travel logistics and ticket costs.",
            [Capability::Search],
        );

        let planner = AgentProfile::new(
            "Travel Logistics Pro",
            format!(
                "Assemble a {}-day itinerary for {} people and create a cost breakdown",
                req.duration_days, req.travelers
            ),
            "Meticulous planner balancing flights and group costs with a final split-bill analysis.",
            [Capability::Search],
        );

        Self {
            researcher: Arc::new(researcher),
            transporter: Arc::new(transporter),
            planner: Arc::new(planner),
        }
    }
}

/// Phase-1 tasks: research and transport, independent of each other
pub fn phase_one_tasks(req: &TripRequest, agents: &AgentRegistry) -> Vec<TaskSpec> {
    let unit = req.currency.symbol();

    let research = TaskSpec {
        id: TaskId::from(RESEARCH_TASK),
        description: format!(
            "Identify top 5 sights in {} for {} people during {}.",
            req.destination, req.travelers, req.month
        ),
        expected_output: "A report on destination highlights.".to_string(),
        agent: Arc::clone(&agents.researcher),
        dependencies: vec![],
    };

    let transport = TaskSpec {
        id: TaskId::from(TRANSPORT_TASK),
        description: format!(
            "Find flight options from {origin} to {city} for {people} travelers. \
             Provide the TOTAL cost for all {people} people in {unit}.\n\
             - Include Airline, Flight Number, and Times.",
            origin = req.origin,
            city = req.destination,
            people = req.travelers,
        ),
        expected_output: format!(
            "A list containing flight details and total cost for {} in {}.",
            req.travelers, unit
        ),
        agent: Arc::clone(&agents.transporter),
        dependencies: vec![],
    };

    vec![research, transport]
}

/// Phase-2 task: the final itinerary, depending on both phase-1 outputs
pub fn phase_two_tasks(req: &TripRequest, agents: &AgentRegistry) -> Vec<TaskSpec> {
    let unit = req.currency.symbol();

    let split_bill = if req.travelers >= 2 {
        "\n- COST PER PERSON (split bill)."
    } else {
        "\n- COST PER PERSON."
    };

    let itinerary = TaskSpec {
        id: TaskId::from(ITINERARY_TASK),
        description: format!(
            "Create a {days}-day itinerary for {people} people in {city}.\n\
             MANDATORY:\n\
             1. Include 'Travel Logistics' at the top with total flight costs.\n\
             2. Provide the daily itinerary.\n\
             3. AT THE VERY END, provide a 'Group Cost Summary' table with:\n\
             - Total Flight Cost\n\
             - Estimated Total Hotel/Food Cost\n\
             - Total Trip Cost{split_bill}",
            days = req.duration_days,
            people = req.travelers,
            city = req.destination,
        ),
        expected_output: format!(
            "A {}-day Markdown plan for {} people in {} including a cost-split table.",
            req.duration_days, req.travelers, unit
        ),
        agent: Arc::clone(&agents.planner),
        dependencies: vec![TaskId::from(RESEARCH_TASK), TaskId::from(TRANSPORT_TASK)],
    };

    vec![itinerary]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::CurrencyUnit;

    fn request() -> TripRequest {
        TripRequest {
            origin: "Mumbai".to_string(),
            destination: "London".to_string(),
            month: "June 2026".to_string(),
            duration_days: 3,
            travelers: 2,
            budget: 2000.0,
            currency: CurrencyUnit::Usd,
        }
    }

    #[test]
    fn test_goals_carry_run_parameters() {
        let agents = AgentRegistry::for_trip(&request());
        assert!(agents.researcher.goal.contains("London"));
        assert!(agents.researcher.goal.contains("June 2026"));
        assert!(agents.transporter.goal.contains("Mumbai"));
        assert!(agents.planner.goal.contains("3-day"));
    }

    #[test]
    fn test_phase_one_tasks_are_independent() {
        let req = request();
        let agents = AgentRegistry::for_trip(&req);
        let tasks = phase_one_tasks(&req, &agents);

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.dependencies.is_empty()));
        assert_eq!(tasks[0].id, TaskId::from(RESEARCH_TASK));
        assert_eq!(tasks[1].id, TaskId::from(TRANSPORT_TASK));
    }

    #[test]
    fn test_itinerary_depends_on_both_phase_one_outputs() {
        let req = request();
        let agents = AgentRegistry::for_trip(&req);
        let tasks = phase_two_tasks(&req, &agents);

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].dependencies, vec![
            TaskId::from(RESEARCH_TASK),
            TaskId::from(TRANSPORT_TASK)
        ]);
    }

    #[test]
    fn test_split_bill_wording_for_groups() {
        let req = request();
        let agents = AgentRegistry::for_trip(&req);
        assert!(phase_two_tasks(&req, &agents)[0].description.contains("split bill"));

        let solo = TripRequest { travelers: 1, ..request() };
        let agents = AgentRegistry::for_trip(&solo);
        assert!(!phase_two_tasks(&solo, &agents)[0].description.contains("split bill"));
    }
}
