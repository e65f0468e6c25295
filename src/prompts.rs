//! Prompt templates for business-intelligence agents.
//!
//! Every template is plain text with `{name}` placeholders, rendered by
//! [`render_template`]. Literal braces are written as `{{` and `}}`.

use crate::models::{AnalysisKind, ResolvedRequest};

/// Error raised while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("no value bound for placeholder '{0}'")]
    MissingVariable(String),

    #[error("unterminated placeholder starting at byte {0}")]
    UnterminatedPlaceholder(usize),

    #[error("unmatched '}}' at byte {0}")]
    UnmatchedBrace(usize),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

/// System prompt shared by all agents.
pub const SYSTEM_PROMPT: &str = r#"You are a senior business-intelligence analyst advising founders, investors and enterprise strategy teams.
You write structured, evidence-minded analyses in plain English.
State assumptions explicitly, quantify wherever a reasonable estimate exists, and flag uncertainty instead of hiding it.
Never invent named sources, citations or statistics you cannot attribute."#;

const MARKET_TEMPLATE: &str = r#"=== MARKET ANALYSIS ===

Scenario: {scenario}
Business concept: {business_concept}
Target market: {target_market}

Analyse the market opportunity for the business concept above within the target market. Cover:
1. Market size: estimate TAM, SAM and SOM with the reasoning behind each figure.
2. Growth: current growth rate, the drivers behind it, and the outlook for the next 3-5 years.
3. Customer demand: the core problem being solved, how acute it is, and who feels it most.
4. Trends: technology, regulatory and behavioural shifts that help or hurt the concept.
5. Entry barriers: capital, distribution, regulation and switching costs.
6. Verdict: an overall attractiveness rating (low / medium / high) with the two or three facts that decide it.

Keep the analysis specific to {target_market}; avoid generic statements that would apply to any market."#;

const RISK_TEMPLATE: &str = r#"=== RISK ASSESSMENT ===

Scenario: {scenario}
Business concept: {business_concept}
Target market: {target_market}

Produce a risk assessment for launching and operating the business concept above in the target market.
For each of the following categories list the top risks, rate likelihood and impact (low / medium / high), and propose a mitigation:
- Market risk (demand, pricing pressure, timing)
- Operational risk (supply chain, key people, technology)
- Financial risk (cash runway, funding, currency, credit)
- Regulatory and legal risk (licensing, data protection, liability)
- Reputational and ESG risk

Close with a risk matrix summary and the single risk that most threatens the venture, with an early-warning indicator to monitor."#;

const KYC_TEMPLATE: &str = r#"=== KYC & COMPLIANCE REVIEW ===

Scenario: {scenario}
Business concept: {business_concept}
Jurisdiction / target market: {target_market}

Review the know-your-customer and anti-money-laundering obligations that apply to the business concept above in the stated jurisdiction.
1. Identify which customer due diligence tiers apply (simplified, standard, enhanced) and the triggers for each.
2. List the identity, beneficial-ownership and source-of-funds checks required at onboarding.
3. Describe sanctions and politically-exposed-person screening requirements and how often screening must be repeated.
4. Outline ongoing transaction monitoring expectations and the typologies most relevant to this business.
5. Note record-keeping periods and suspicious-activity reporting duties.
6. Rate the overall inherent compliance risk (low / medium / high) and recommend the minimum viable compliance program.

This is an analytical overview, not legal advice; call out areas where local counsel should confirm requirements."#;

const COMPETITIVE_TEMPLATE: &str = r#"=== COMPETITIVE INTELLIGENCE ===

Scenario: {scenario}
Business concept: {business_concept}
Target market: {target_market}

Map the competitive landscape for the business concept above in the target market.
1. Direct competitors: the most relevant players, their positioning, pricing and apparent strengths.
2. Indirect competitors and substitutes, including the status quo customers use today.
3. Porter's Five Forces: assess each force and its intensity.
4. SWOT for the business concept relative to the field.
5. Differentiation: where a defensible advantage could come from (technology, network effects, brand, cost, distribution).
6. Competitive response: how incumbents are likely to react to a new entrant and how to prepare.

Finish with a positioning statement the venture could credibly own."#;

const FINANCIAL_TEMPLATE: &str = r#"=== FINANCIAL ANALYSIS ===

Scenario: {scenario}
Business concept: {business_concept}
Target market: {target_market}

Build a first-pass financial view of the business concept above for the target market.
1. Revenue model: how the business earns money and the main pricing levers.
2. Unit economics: estimate customer acquisition cost, lifetime value, gross margin and payback period, stating assumptions.
3. Cost structure: fixed versus variable costs and the largest cost drivers.
4. Five-year projection: revenue, gross profit and operating result under conservative, base and optimistic cases.
5. Funding: capital required to reach break-even and the milestones each tranche should buy.
6. Key metrics: the five numbers management should track monthly.

Present figures as ranges where uncertainty is high and explain what would move them."#;

const CUSTOMER_INSIGHT_TEMPLATE: &str = r#"=== CUSTOMER INSIGHTS ===

Scenario: {scenario}
Business concept: {business_concept}
Target market: {target_market}

Develop customer insights for the business concept above in the target market.
1. Segments: define three to five customer segments with demographics, firmographics or behaviours that separate them.
2. Personas: one short persona for the most valuable segment, including goals, frustrations and buying triggers.
3. Jobs to be done: the functional, emotional and social jobs the concept addresses.
4. Buying journey: how customers discover, evaluate and purchase, and who influences the decision.
5. Willingness to pay: price sensitivity per segment and the value metric customers would accept.
6. Retention: what drives repeat use and the most likely churn reasons.

Recommend the beachhead segment to target first and explain why."#;

/// Return the instruction template for an analysis kind.
pub fn template_for(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Market => MARKET_TEMPLATE,
        AnalysisKind::Risk => RISK_TEMPLATE,
        AnalysisKind::Kyc => KYC_TEMPLATE,
        AnalysisKind::Competitive => COMPETITIVE_TEMPLATE,
        AnalysisKind::Financial => FINANCIAL_TEMPLATE,
        AnalysisKind::CustomerInsight => CUSTOMER_INSIGHT_TEMPLATE,
    }
}

/// Substitute `{name}` placeholders in `template` with values from `vars`.
///
/// `{{` and `}}` produce literal braces. Values are inserted verbatim and are
/// never re-scanned for placeholders.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    output.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, nc) in chars.by_ref() {
                    if nc == '}' {
                        closed = true;
                        break;
                    }
                    if nc == '{' {
                        break;
                    }
                    name.push(nc);
                }

                if !closed {
                    return Err(PromptError::UnterminatedPlaceholder(pos));
                }

                if name.is_empty() {
                    return Err(PromptError::EmptyPlaceholder(pos));
                }

                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                output.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    output.push('}');
                } else {
                    return Err(PromptError::UnmatchedBrace(pos));
                }
            }
            _ => output.push(c),
        }
    }

    Ok(output)
}

/// Build the user prompt for an analysis kind from a resolved request.
pub fn build_prompt(kind: AnalysisKind, request: &ResolvedRequest) -> Result<String, PromptError> {
    render_template(
        template_for(kind),
        &[
            ("scenario", request.scenario.as_str()),
            ("business_concept", request.business_concept.as_str()),
            ("target_market", request.target_market.as_str()),
        ],
    )
}
