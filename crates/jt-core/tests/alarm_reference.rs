//! Reference values for Pearl's burglary alarm network.
//!
//! Expected probabilities are computed by hand from the CPTs.

mod support;

use jt_common::{Combination, Error, Evidence};
use jt_core::inference::{EnumerationEngine, Inference, InferAllOptions, JunctionTreeEngine};
use support::{alarm, approx_eq, TOLERANCE};

fn query(pairs: &[(&str, &str)]) -> Combination {
    pairs
        .iter()
        .map(|(n, s)| (n.to_string(), s.to_string()))
        .collect()
}

fn p_true(engine: &JunctionTreeEngine, node: &str, evidence: &Evidence) -> f64 {
    engine
        .infer(&alarm(), &query(&[(node, "T")]), evidence)
        .expect("inference succeeds")
}

#[test]
fn priors_without_evidence() {
    let engine = JunctionTreeEngine::default();
    let none = Evidence::new();
    assert!(approx_eq(p_true(&engine, "ALARM", &none), 0.002516442, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "JOHN_CALLS", &none), 0.052138976, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "MARY_CALLS", &none), 0.011736344, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "BURGLARY", &none), 0.001, TOLERANCE));
}

#[test]
fn burglary_observed() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("BURGLARY", "T");
    assert!(approx_eq(p_true(&engine, "ALARM", &evidence), 0.94002, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "JOHN_CALLS", &evidence), 0.849017, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "MARY_CALLS", &evidence), 0.6586138, TOLERANCE));
    // Roots stay independent.
    assert!(approx_eq(p_true(&engine, "EARTHQUAKE", &evidence), 0.002, TOLERANCE));
}

#[test]
fn burglary_and_earthquake_observed() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("BURGLARY", "T").hard("EARTHQUAKE", "T");
    assert!(approx_eq(p_true(&engine, "ALARM", &evidence), 0.95, TOLERANCE));
    assert!(approx_eq(p_true(&engine, "JOHN_CALLS", &evidence), 0.8575, TOLERANCE));
}

#[test]
fn earthquake_observed() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("EARTHQUAKE", "T");
    assert!(approx_eq(p_true(&engine, "ALARM", &evidence), 0.29066, TOLERANCE));
}

#[test]
fn diagnostic_query_from_both_calls() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("JOHN_CALLS", "T").hard("MARY_CALLS", "T");
    let p = p_true(&engine, "BURGLARY", &evidence);
    assert!(approx_eq(p, 0.284171835, TOLERANCE), "got {}", p);
}

#[test]
fn joint_query_inside_one_clique() {
    let engine = JunctionTreeEngine::default();
    let p = engine
        .infer(&alarm(), &query(&[("ALARM", "T"), ("JOHN_CALLS", "T")]), &Evidence::new())
        .unwrap();
    assert!(approx_eq(p, 0.002516442 * 0.9, TOLERANCE));
}

#[test]
fn query_across_cliques_needs_enumeration() {
    let network = alarm();
    let across = query(&[("BURGLARY", "T"), ("JOHN_CALLS", "T")]);

    let err = JunctionTreeEngine::default()
        .infer(&network, &across, &Evidence::new())
        .unwrap_err();
    assert!(matches!(err, Error::QueryNotCovered { .. }));

    let p = EnumerationEngine::default()
        .infer(&network, &across, &Evidence::new())
        .unwrap();
    assert!(approx_eq(p, 0.001 * 0.849017, TOLERANCE));
}

#[test]
fn soft_evidence_on_an_observed_effect() {
    let network = alarm();
    let evidence = Evidence::new().soft("MARY_CALLS", [("T", 0.7), ("F", 0.3)]);

    let engine = JunctionTreeEngine::default();
    let marginals = engine.marginals(&network, &evidence).unwrap();
    assert!(approx_eq(marginals["MARY_CALLS"]["T"], 0.7, 1e-4));

    // Jeffrey's rule: P(A=T) = sum over m of P(A=T | M=m) * target(m).
    let given = |state: &str| {
        engine
            .infer(&network, &query(&[("ALARM", "T")]), &Evidence::new().hard("MARY_CALLS", state))
            .unwrap()
    };
    let expected = given("T") * 0.7 + given("F") * 0.3;
    assert!(approx_eq(marginals["ALARM"]["T"], expected, 1e-4));
}

#[test]
fn infer_all_reports_every_node() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("BURGLARY", "T");
    let options = InferAllOptions {
        precision: 4,
        ..InferAllOptions::default()
    };
    let marginals = engine.infer_all(&alarm(), &evidence, options).unwrap();

    assert_eq!(marginals.len(), 5);
    assert_eq!(marginals["BURGLARY"]["T"], 1.0);
    assert_eq!(marginals["BURGLARY"]["F"], 0.0);
    assert_eq!(marginals["ALARM"]["T"], 0.94);
    assert_eq!(marginals["JOHN_CALLS"]["T"], 0.849);
}

#[test]
fn structure_has_three_cliques() {
    let network = alarm();
    let engine = JunctionTreeEngine::default();
    let tree = engine.structure(&network, &[], false).unwrap();
    let report = tree.report(&network);

    assert_eq!(report.cliques.len(), 3);
    assert!(report
        .cliques
        .contains(&vec!["BURGLARY".to_string(), "EARTHQUAKE".into(), "ALARM".into()]));
    assert_eq!(report.sepsets.len(), 2);
    assert!(report.sepsets.iter().all(|s| s.nodes == vec!["ALARM".to_string()]));
    assert!(report.fill_ins.is_empty());
    assert!(report.running_intersection);
    assert_eq!(report.big_clique, None);
}

#[test]
fn repeated_queries_hit_the_cache() {
    let engine = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("JOHN_CALLS", "T");
    p_true(&engine, "ALARM", &evidence);
    p_true(&engine, "MARY_CALLS", &evidence);
    p_true(&engine, "BURGLARY", &Evidence::new());

    let stats = engine.cache_stats();
    assert_eq!(stats.potential_entries, 2);
    assert_eq!(stats.potential_hits, 1);
    assert_eq!(stats.structure_entries, 1);
}
