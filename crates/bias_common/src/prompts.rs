//! Persona and context text framing every oracle request.
//!
//! A `Framing` is the fixed half of a request; only the user text varies.

/// Fixed persona/context pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    pub persona: &'static str,
    pub context: &'static str,
}

pub const ANALYST_PERSONA: &str = "\
You are a senior fairness auditor on the security operations team of one of the largest \
companies in the world. You review automated and human security decisions for bias.";

pub const ANALYST_CONTEXT: &str = "\
Assess the security decision described by the user for fairness.
Start with a one-line determination: either \"No bias detected\" or \"Potential bias detected\".
Then name the bias category that applies, choosing from: geographic bias, demographic bias, \
behavioral profiling, temporal bias, device or platform bias, automation bias, \
confirmation bias, or none.
Explain briefly which attributes of the decision drove your assessment and whether they are \
legitimate security signals or proxies for protected characteristics.
If bias is possible, finish with concrete remediation suggestions for the policy or model.
Answer in plain text without markdown, code blocks or backticks.";

pub const BANNER_PERSONA: &str = "\
Your task is to return a banner that will be shown as the first thing after running the application.";

pub const BANNER_CONTEXT: &str = "\
Return only the text that can be immediately printed.
Do not include functions or any additional code elements.
Avoid using backticks.
Do not add any comments.
Start with an ASCII art image representing your choice of design.";

/// Framing for bias classification
pub const ANALYST: Framing = Framing {
    persona: ANALYST_PERSONA,
    context: ANALYST_CONTEXT,
};

/// Framing for the welcome banner
pub const BANNER: Framing = Framing {
    persona: BANNER_PERSONA,
    context: BANNER_CONTEXT,
};

/// User text asking for the welcome banner
pub fn banner_request(app_name: &str, now: &str, location: &str) -> String {
    format!(
        "Return me a banner for an application called {app_name}.\n\
         It is a security tool that checks decisions made by people and AI systems for bias.\n\
         Include the current date and time ({now}) and the approximate location ({location})."
    )
}
