use crate::errors::{QueryError, Result};
use database::graph::{KnowledgeGraph, NodeType};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use ts_rs::TS;

/// Weight of the per-method decision density in the score
const DENSITY_WEIGHT: f64 = 0.7;
/// Weight of the file's size relative to the largest file
const SIZE_WEIGHT: f64 = 0.3;
/// Density at which the density term reaches half its weight
const DENSITY_MIDPOINT: f64 = 5.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "api.ts")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            ComplexityLevel::VeryHigh
        } else if score >= 0.50 {
            ComplexityLevel::High
        } else if score >= 0.25 {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FileComplexity {
    pub file_path: String,
    pub cyclomatic_complexity: u32,
    pub lines_of_code: u32,
    pub number_of_methods: u32,
    pub complexity_score: f64,
    pub complexity_level: ComplexityLevel,
}

/// Score in [0, 1]; strictly increasing in `cyclomatic_complexity` and
/// non-decreasing in `lines_of_code`
pub fn complexity_score(
    cyclomatic_complexity: u32,
    number_of_methods: u32,
    lines_of_code: u32,
    max_lines_of_code: u32,
) -> f64 {
    let density = f64::from(cyclomatic_complexity) / f64::from(number_of_methods.max(1));
    let density_term = DENSITY_WEIGHT * density / (density + DENSITY_MIDPOINT);
    let size_term = if max_lines_of_code == 0 {
        0.0
    } else {
        SIZE_WEIGHT * f64::from(lines_of_code) / f64::from(max_lines_of_code)
    };
    (density_term + size_term).clamp(0.0, 1.0)
}

fn measure(graph: &KnowledgeGraph, file_path: &str, max_lines_of_code: u32) -> FileComplexity {
    let callables: Vec<_> = graph
        .store()
        .nodes_in_file(file_path)
        .into_iter()
        .filter(|node| {
            matches!(
                node.node_type,
                NodeType::Method | NodeType::Constructor | NodeType::Function
            )
        })
        .collect();

    let decision_points: u32 = callables
        .iter()
        .map(|node| graph.facts().decision_points(node.id))
        .sum();
    let cyclomatic_complexity = 1 + decision_points;
    let number_of_methods = callables.len() as u32;
    let lines_of_code = graph
        .facts()
        .file(file_path)
        .map(|f| f.lines_of_code)
        .unwrap_or(0);

    let complexity_score = complexity_score(
        cyclomatic_complexity,
        number_of_methods,
        lines_of_code,
        max_lines_of_code,
    );

    FileComplexity {
        file_path: file_path.to_string(),
        cyclomatic_complexity,
        lines_of_code,
        number_of_methods,
        complexity_score,
        complexity_level: ComplexityLevel::from_score(complexity_score),
    }
}

pub fn file_complexity(graph: &KnowledgeGraph, file_path: &str) -> Result<FileComplexity> {
    if graph.facts().file(file_path).is_none() {
        return Err(QueryError::not_found("File", file_path));
    }
    Ok(measure(graph, file_path, graph.facts().max_lines_of_code()))
}

/// Every file under `path_prefix`, highest score first
pub fn project_complexity(graph: &KnowledgeGraph, path_prefix: Option<&str>) -> Vec<FileComplexity> {
    let max_lines_of_code = graph.facts().max_lines_of_code();
    let mut files: Vec<FileComplexity> = graph
        .facts()
        .files()
        .filter(|f| path_prefix.is_none_or(|prefix| f.file_path.starts_with(prefix)))
        .map(|f| measure(graph, &f.file_path, max_lines_of_code))
        .collect();

    files.sort_by(|a, b| {
        b.complexity_score
            .total_cmp(&a.complexity_score)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::graph::FileFacts;
    use database::testing::GraphFixture;

    fn record(fixture: &mut GraphFixture, file_path: &str, lines_of_code: u32) {
        fixture.facts_mut().record_file(FileFacts {
            file_path: file_path.to_string(),
            package_name: String::new(),
            lines_of_code,
        });
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ComplexityLevel::from_score(0.0), ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_score(0.2499), ComplexityLevel::Low);
        assert_eq!(ComplexityLevel::from_score(0.25), ComplexityLevel::Medium);
        assert_eq!(ComplexityLevel::from_score(0.50), ComplexityLevel::High);
        assert_eq!(ComplexityLevel::from_score(0.75), ComplexityLevel::VeryHigh);
        assert_eq!(ComplexityLevel::from_score(1.0), ComplexityLevel::VeryHigh);
    }

    #[test]
    fn test_score_monotonic_and_bounded() {
        let mut previous = complexity_score(1, 2, 40, 100);
        for cc in 2..200 {
            let score = complexity_score(cc, 2, 40, 100);
            assert!(score > previous, "cc {cc}");
            assert!((0.0..=1.0).contains(&score));
            previous = score;
        }
        assert!(complexity_score(10, 2, 80, 100) > complexity_score(10, 2, 40, 100));
        assert_eq!(complexity_score(1, 0, 0, 0), 0.7 * 1.0 / 6.0);
    }

    #[test]
    fn test_file_complexity_sums_callables() {
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Order", "src/Order.java");
        let place = fixture.method(class, "place", 3);
        let ship = fixture.method(class, "ship", 12);
        let ctor = fixture.member(class, "Order", NodeType::Constructor, 2, true);
        fixture.facts_mut().record_decision_points(place, 4);
        fixture.facts_mut().record_decision_points(ship, 2);
        fixture.facts_mut().record_decision_points(ctor, 0);
        record(&mut fixture, "src/Order.java", 50);
        record(&mut fixture, "src/Big.java", 200);
        let graph = fixture.build();

        let report = file_complexity(&graph, "src/Order.java").unwrap();
        assert_eq!(report.cyclomatic_complexity, 7);
        assert_eq!(report.number_of_methods, 3);
        assert_eq!(report.lines_of_code, 50);
        assert_eq!(report.complexity_score, complexity_score(7, 3, 50, 200));

        assert_eq!(
            file_complexity(&graph, "src/Missing.java"),
            Err(QueryError::not_found("File", "src/Missing.java"))
        );
    }

    #[test]
    fn test_project_report_sorted_by_score() {
        let mut fixture = GraphFixture::new();
        let simple = fixture.class("Simple", "src/a/Simple.java");
        fixture.method(simple, "get", 2);
        let tangled = fixture.class("Tangled", "src/a/Tangled.java");
        let knot = fixture.method(tangled, "knot", 2);
        fixture.facts_mut().record_decision_points(knot, 30);
        fixture.class("Elsewhere", "lib/Elsewhere.java");
        record(&mut fixture, "src/a/Simple.java", 10);
        record(&mut fixture, "src/a/Tangled.java", 90);
        record(&mut fixture, "lib/Elsewhere.java", 100);
        let graph = fixture.build();

        let scoped = project_complexity(&graph, Some("src/"));
        let order: Vec<&str> = scoped.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(order, vec!["src/a/Tangled.java", "src/a/Simple.java"]);
        assert_eq!(scoped[0].complexity_level, ComplexityLevel::VeryHigh);
        assert_eq!(project_complexity(&graph, None).len(), 3);
    }
}
