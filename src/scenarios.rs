use crate::error::EvalError;

/// A named business-operations context and the question the user writes a prompt for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioEntry {
    pub name: &'static str,
    pub question: &'static str,
}

const fn entry(name: &'static str, question: &'static str) -> ScenarioEntry {
    ScenarioEntry { name, question }
}

/// Fixed catalog, in selector order
pub const SCENARIOS: [ScenarioEntry; 30] = [
    entry(
        "Banking Operations",
        "You are part of a banking operations team. Explain how an end-to-end transaction is processed, starting from customer initiation to final settlement, including key checkpoints.",
    ),
    entry(
        "IT Service Management",
        "As an IT operations analyst, list common operational errors that occur during system deployments and suggest corrective actions for each.",
    ),
    entry(
        "Business Operations",
        "You are launching a new back-office operations process. Create a detailed Standard Operating Procedure (SOP) covering roles, steps, controls, and escalation paths.",
    ),
    entry(
        "Incident Management",
        "You are handling a critical production incident. Summarize a detailed incident report into a concise update suitable for senior management.",
    ),
    entry(
        "Operations Analytics",
        "You have been given turnaround time data for multiple process stages. Analyze the data and identify bottlenecks affecting overall efficiency.",
    ),
    entry(
        "Process Automation",
        "As an operations transformation consultant, identify areas within an operations workflow where automation can reduce manual effort and improve accuracy.",
    ),
    entry(
        "High-Volume Operations",
        "Simulate a scenario where transaction volumes spike unexpectedly. Describe how the operations team should respond to ensure continuity and minimize impact.",
    ),
    entry(
        "Healthcare Administration",
        "You work in hospital administration. Explain the end-to-end patient admission and discharge process, highlighting compliance and documentation steps.",
    ),
    entry(
        "Supply Chain & Logistics",
        "Identify common operational issues in warehouse management and recommend solutions to improve order fulfillment accuracy.",
    ),
    entry(
        "Retail Operations",
        "Analyze a retail store’s daily operations and suggest process improvements to reduce customer wait times and inventory mismatches.",
    ),
    entry(
        "Human Resources Operations",
        "Explain the end-to-end employee onboarding process and identify areas where delays typically occur.",
    ),
    entry(
        "Manufacturing Operations",
        "List common production floor operational failures and propose preventive controls to minimize downtime.",
    ),
    entry(
        "FinTech Operations",
        "Explain how a digital payment transaction is validated, authorized, and settled across multiple systems.",
    ),
    entry(
        "Customer Support Operations",
        "Summarize a high-priority customer complaint escalation report for leadership review.",
    ),
    entry(
        "Quality & Compliance",
        "Identify operational compliance risks in a regulated environment and suggest mitigation strategies.",
    ),
    entry(
        "Data Operations",
        "Analyze operational data latency issues and identify root causes affecting reporting timelines.",
    ),
    entry(
        "Telecom Operations",
        "Explain the process flow of a service outage resolution from detection to closure.",
    ),
    entry(
        "E-Commerce Operations",
        "Identify bottlenecks in order processing during peak sales periods and recommend corrective actions.",
    ),
    entry(
        "Insurance Operations",
        "Explain the end-to-end insurance claims processing workflow and common failure points.",
    ),
    entry(
        "Facilities Operations",
        "Describe how facility maintenance requests are processed and suggest ways to improve turnaround time.",
    ),
    entry(
        "Cybersecurity Operations",
        "Summarize a security incident report into key risks and actions for non-technical stakeholders.",
    ),
    entry(
        "Procurement Operations",
        "Explain the purchase-to-pay (P2P) process and identify inefficiencies that impact cost control.",
    ),
    entry(
        "Airline Operations",
        "Simulate a flight disruption scenario and outline the operational response required to manage passengers effectively.",
    ),
    entry(
        "Energy & Utilities",
        "Identify operational challenges in meter reading and billing processes and propose automation solutions.",
    ),
    entry(
        "Shared Services",
        "Explain how shared services handle multi-region operations while maintaining SLA compliance.",
    ),
    entry(
        "Project Operations",
        "Analyze delays in project execution and identify operational constraints affecting delivery timelines.",
    ),
    entry(
        "Education Operations",
        "Explain how student enrollment and examination processes are managed end-to-end.",
    ),
    entry(
        "Hospitality Operations",
        "Identify operational gaps in hotel check-in/check-out processes and suggest improvements.",
    ),
    entry(
        "Legal Operations",
        "Summarize a case handling workflow and identify operational risks related to documentation and deadlines.",
    ),
    entry(
        "Enterprise Operations",
        "Assess enterprise-wide operational dependencies and identify critical points of failure.",
    ),
];

/// Question text for a scenario name
pub fn lookup(name: &str) -> Result<&'static str, EvalError> {
    find(name)
        .map(|entry| entry.question)
        .ok_or_else(|| EvalError::NotFound(name.to_string()))
}

/// Scenario names in selector order
pub fn names() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|entry| entry.name)
}

/// First scenario in the selector
pub fn default_scenario() -> &'static ScenarioEntry {
    &SCENARIOS[0]
}

/// Resolve a selector input: an exact name, a case-insensitive name, or a
/// 1-based position in the listing
pub fn select(input: &str) -> Result<&'static ScenarioEntry, EvalError> {
    let input = input.trim();
    if let Some(entry) = find(input) {
        return Ok(entry);
    }
    if let Some(entry) = SCENARIOS.iter().find(|e| e.name.eq_ignore_ascii_case(input)) {
        return Ok(entry);
    }
    match input.parse::<usize>() {
        Ok(index) if (1..=SCENARIOS.len()).contains(&index) => Ok(&SCENARIOS[index - 1]),
        _ => Err(EvalError::NotFound(input.to_string())),
    }
}

fn find(name: &str) -> Option<&'static ScenarioEntry> {
    SCENARIOS.iter().find(|entry| entry.name == name)
}
