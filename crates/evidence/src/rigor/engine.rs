//! Composite methodological rigor score.

use serde::{Deserialize, Serialize};

use super::inputs::{AnalysisResult, IssueSeverity, QualityReport};

/// Points available in each category.
pub const CATEGORY_MAX: u32 = 25;

const CRITICAL_PENALTY: i32 = 5;
const WARNING_PENALTY: i32 = 2;
const HIGH_MISSING_PCT: f64 = 20.0;
const FAILED_ASSUMPTION_PENALTY: i32 = 5;
const UNCHECKED_ASSUMPTIONS_SCORE: u32 = 10;
const REPORTING_ITEM: u32 = 5;
const RECOMMENDATION_THRESHOLD: u32 = 15;

/// Letter-style grade of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Grade::Excellent,
            65..=79 => Grade::Good,
            50..=64 => Grade::Fair,
            _ => Grade::Poor,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Fair => "Fair",
            Grade::Poor => "Poor",
        };
        write!(f, "{}", label)
    }
}

/// Score of one category with the findings that explain it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: u32,
    pub max: u32,
    pub findings: Vec<String>,
}

impl CategoryScore {
    /// Clamp a running total into `0..=max`.
    fn from_running(score: i32, findings: Vec<String>) -> Self {
        Self {
            score: score.clamp(0, CATEGORY_MAX as i32) as u32,
            max: CATEGORY_MAX,
            findings,
        }
    }

    fn fixed(score: u32, finding: &str) -> Self {
        Self {
            score,
            max: CATEGORY_MAX,
            findings: vec![finding.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigorBreakdown {
    pub data_quality: CategoryScore,
    pub methodology: CategoryScore,
    pub assumptions: CategoryScore,
    pub reporting: CategoryScore,
}

impl RigorBreakdown {
    pub fn total(&self) -> u32 {
        self.data_quality.score + self.methodology.score + self.assumptions.score + self.reporting.score
    }
}

/// Output of [`RigorScoringEngine::score`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigorResult {
    pub overall_score: u32,
    pub grade: Grade,
    pub max_score: u32,
    pub breakdown: RigorBreakdown,
    pub recommendations: Vec<String>,
    pub summary: String,
}

/// Grades a study from its data-quality report and analysis result.
///
/// Scoring never fails: missing inputs map to low category scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigorScoringEngine;

impl RigorScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, quality: &QualityReport, analysis: &AnalysisResult) -> RigorResult {
        let breakdown = RigorBreakdown {
            data_quality: score_data_quality(quality),
            methodology: score_methodology(analysis),
            assumptions: score_assumptions(analysis),
            reporting: score_reporting(analysis),
        };

        let overall_score = breakdown.total();
        let grade = Grade::from_score(overall_score);
        let recommendations = recommendations(&breakdown);
        let summary = format!(
            "Rigor score: {}/100 ({}). Data quality: {}/25. Methodology: {}/25. \
             Assumptions: {}/25. Reporting: {}/25.",
            overall_score,
            grade,
            breakdown.data_quality.score,
            breakdown.methodology.score,
            breakdown.assumptions.score,
            breakdown.reporting.score,
        );

        tracing::debug!("{}", summary);

        RigorResult {
            overall_score,
            grade,
            max_score: 4 * CATEGORY_MAX,
            breakdown,
            recommendations,
            summary,
        }
    }
}

fn score_data_quality(report: &QualityReport) -> CategoryScore {
    let mut score = CATEGORY_MAX as i32;
    let mut findings = Vec::new();

    score -= report.count_severity(IssueSeverity::Critical) as i32 * CRITICAL_PENALTY;
    score -= report.count_severity(IssueSeverity::Warning) as i32 * WARNING_PENALTY;

    if report.row_count < 30 {
        score -= 10;
        findings.push("Sample size critically small".to_string());
    } else if report.row_count < 100 {
        score -= 3;
        findings.push("Sample size moderate".to_string());
    } else {
        findings.push("Adequate sample size".to_string());
    }

    // Missingness is already charged through the issues list
    let high_missing = report.columns_missing_above(HIGH_MISSING_PCT);
    if high_missing.is_empty() {
        findings.push("Missing data within acceptable limits".to_string());
    } else {
        findings.push(format!("High missingness in: {}", high_missing.join(", ")));
    }

    CategoryScore::from_running(score, findings)
}

fn score_methodology(result: &AnalysisResult) -> CategoryScore {
    if result.is_error() {
        return CategoryScore::fixed(0, "Analysis failed to complete");
    }

    let mut score = CATEGORY_MAX as i32;
    let mut findings = Vec::new();

    match result.model.as_deref().filter(|m| !m.is_empty()) {
        Some(model) => findings.push(format!("Appropriate model used: {}", model)),
        None => {
            score -= 10;
            findings.push("No statistical model specified".to_string());
        }
    }

    let n = result.sample_size();
    if n >= 100 {
        findings.push("Adequate sample for chosen model".to_string());
    } else if n >= 30 {
        score -= 3;
        findings.push("Borderline sample size for model".to_string());
    } else {
        score -= 8;
        findings.push("Insufficient sample size for model".to_string());
    }

    if !result.model_fit.is_empty() {
        findings.push("Model fit statistics reported".to_string());
    } else {
        if result.has_model() {
            score -= 3;
        }
        findings.push("Model fit statistics not available".to_string());
    }

    CategoryScore::from_running(score, findings)
}

fn score_assumptions(result: &AnalysisResult) -> CategoryScore {
    if result.assumptions.is_empty() {
        return CategoryScore::fixed(UNCHECKED_ASSUMPTIONS_SCORE, "Assumption checks not recorded");
    }

    let passed = result.assumptions.values().filter(|c| c.passed == Some(true)).count();
    let failed = result.assumptions.values().filter(|c| c.passed == Some(false)).count();

    let mut findings: Vec<String> = result
        .assumptions
        .iter()
        .map(|(name, check)| {
            let status = match check.passed {
                Some(true) => "PASSED",
                Some(false) => "FAILED",
                None => "NOT CHECKED",
            };
            format!("{}: {} - {}", name, status, check.detail)
        })
        .collect();
    findings.push(format!(
        "{} of {} assumptions passed",
        passed,
        result.assumptions.len()
    ));

    let score = CATEGORY_MAX as i32 - failed as i32 * FAILED_ASSUMPTION_PENALTY;
    CategoryScore::from_running(score, findings)
}

fn score_reporting(result: &AnalysisResult) -> CategoryScore {
    let items = [
        (result.has_model(), "Model clearly specified"),
        (result.sample_size() > 0, "Sample size reported"),
        (!result.model_fit.is_empty(), "Model fit statistics included"),
        (result.has_interpretation(), "Results interpreted in plain language"),
        (!result.assumptions.is_empty(), "Assumption checks documented"),
    ];

    let findings: Vec<String> = items
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, finding)| finding.to_string())
        .collect();

    CategoryScore {
        score: findings.len() as u32 * REPORTING_ITEM,
        max: CATEGORY_MAX,
        findings,
    }
}

fn recommendations(breakdown: &RigorBreakdown) -> Vec<String> {
    let mut recs = Vec::new();
    if breakdown.data_quality.score < RECOMMENDATION_THRESHOLD {
        recs.push(
            "Improve data quality: address missing values and remove duplicates before analysis"
                .to_string(),
        );
    }
    if breakdown.methodology.score < RECOMMENDATION_THRESHOLD {
        recs.push(
            "Review methodology: ensure chosen statistical model matches study design and sample size"
                .to_string(),
        );
    }
    if breakdown.assumptions.score < RECOMMENDATION_THRESHOLD {
        recs.push("Address assumption violations before interpreting results".to_string());
    }
    if breakdown.reporting.score < RECOMMENDATION_THRESHOLD {
        recs.push(
            "Improve reporting: include model fit statistics, sample size, and plain language interpretation"
                .to_string(),
        );
    }
    if recs.is_empty() {
        recs.push(
            "Analysis meets quality standards. Suitable for donor reporting and journal submission."
                .to_string(),
        );
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigor::inputs::{AssumptionCheck, QualityIssue};

    fn issue(severity: IssueSeverity) -> QualityIssue {
        QualityIssue::new("test", None, severity, String::new())
    }

    fn complete_analysis() -> AnalysisResult {
        let mut result = AnalysisResult {
            model: Some("Logistic Regression".to_string()),
            n: Some(250),
            interpretation: Some("Age increases the odds of death".to_string()),
            ..AnalysisResult::default()
        };
        result.model_fit.insert("aic".to_string(), 210.4);
        result
            .assumptions
            .insert("sample_size".to_string(), AssumptionCheck::new(Some(true), "60 events for 2 predictors"));
        result
            .assumptions
            .insert("multicollinearity".to_string(), AssumptionCheck::new(Some(true), "VIF < 10"));
        result
    }

    #[test]
    fn test_sparse_inputs_score_low() {
        let quality = QualityReport {
            row_count: 20,
            issues: vec![issue(IssueSeverity::Critical), issue(IssueSeverity::Critical)],
            ..QualityReport::default()
        };
        let result = RigorScoringEngine::new().score(&quality, &AnalysisResult::default());

        assert_eq!(result.breakdown.data_quality.score, 5);
        assert_eq!(result.breakdown.methodology.score, 7);
        assert_eq!(result.breakdown.assumptions.score, 10);
        assert_eq!(result.breakdown.reporting.score, 0);
        assert_eq!(result.overall_score, 22);
        assert_eq!(result.grade, Grade::Poor);
        assert_eq!(result.recommendations.len(), 4);
    }

    #[test]
    fn test_complete_analysis_scores_full() {
        let quality = QualityReport {
            row_count: 250,
            ..QualityReport::default()
        };
        let result = RigorScoringEngine::new().score(&quality, &complete_analysis());

        assert_eq!(result.overall_score, 100);
        assert_eq!(result.grade, Grade::Excellent);
        assert_eq!(
            result.breakdown.assumptions.findings.last().map(String::as_str),
            Some("2 of 2 assumptions passed")
        );
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].starts_with("Analysis meets quality standards"));
        assert_eq!(
            result.summary,
            "Rigor score: 100/100 (Excellent). Data quality: 25/25. Methodology: 25/25. \
             Assumptions: 25/25. Reporting: 25/25."
        );
    }

    #[test]
    fn test_error_forces_methodology_to_zero() {
        let mut analysis = complete_analysis();
        analysis.error = Some("singular matrix".to_string());
        let result = RigorScoringEngine::new().score(&QualityReport::default(), &analysis);
        assert_eq!(result.breakdown.methodology.score, 0);
        assert_eq!(
            result.breakdown.methodology.findings,
            vec!["Analysis failed to complete".to_string()]
        );
    }

    #[test]
    fn test_named_model_without_fit_loses_three() {
        let analysis = AnalysisResult {
            model: Some("Kaplan-Meier Survival Analysis".to_string()),
            n: Some(150),
            ..AnalysisResult::default()
        };
        let result = RigorScoringEngine::new().score(&QualityReport::default(), &analysis);
        assert_eq!(result.breakdown.methodology.score, 22);
    }

    #[test]
    fn test_failed_and_unchecked_assumptions() {
        let mut analysis = complete_analysis();
        analysis
            .assumptions
            .insert("linearity".to_string(), AssumptionCheck::new(Some(false), "curvature"));
        analysis
            .assumptions
            .insert("independence".to_string(), AssumptionCheck::new(None, "not testable"));
        let category = score_assumptions(&analysis);
        assert_eq!(category.score, 20);
        assert_eq!(category.findings[2], "linearity: FAILED - curvature");
        assert_eq!(category.findings[3], "independence: NOT CHECKED - not testable");
        assert_eq!(category.findings[4], "2 of 4 assumptions passed");
    }

    #[test]
    fn test_data_quality_floors_at_zero_and_lists_missing() {
        let mut quality = QualityReport {
            row_count: 50,
            issues: (0..6).map(|_| issue(IssueSeverity::Warning)).collect(),
            ..QualityReport::default()
        };
        quality.issues.push(issue(IssueSeverity::Critical));
        quality.issues.push(issue(IssueSeverity::Critical));
        quality.missing_percentage.insert("age".to_string(), 40.0);
        quality.missing_percentage.insert("sex".to_string(), 0.0);

        let category = score_data_quality(&quality);
        assert_eq!(category.score, 0);
        assert_eq!(category.findings, vec!["Sample size moderate", "High missingness in: age"]);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(80), Grade::Excellent);
        assert_eq!(Grade::from_score(79), Grade::Good);
        assert_eq!(Grade::from_score(65), Grade::Good);
        assert_eq!(Grade::from_score(50), Grade::Fair);
        assert_eq!(Grade::from_score(49), Grade::Poor);
    }
}
