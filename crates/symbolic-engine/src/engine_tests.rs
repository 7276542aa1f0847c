#[cfg(test)]
mod tests {
    use crate::rules::*;
    use crate::{score_from_counts, FinancialRuleEngine, RuleThresholds};
    use analysis_core::{FinancialSnapshot, RuleEvaluator, RuleStatus, Verdict};

    const STEP: f64 = 100.0 / 7.0;

    // Every rule passes
    fn healthy_tech() -> FinancialSnapshot {
        FinancialSnapshot {
            symbol: "AAPL".to_string(),
            sector: "Technology".to_string(),
            current_price: 150.0,
            pe_ratio: 25.0,
            debt_to_equity: 100.0,
            revenue_growth: 0.10,
            profit_margins: 0.25,
            roe: 0.30,
            free_cash_flow: 500.0,
            net_income: 100.0,
            ..FinancialSnapshot::default()
        }
    }

    // Every rule fails
    fn distressed() -> FinancialSnapshot {
        FinancialSnapshot {
            symbol: "ZOMB".to_string(),
            sector: "Unknown".to_string(),
            pe_ratio: 0.0,
            debt_to_equity: 999.0,
            revenue_growth: -0.5,
            profit_margins: -0.5,
            roe: -0.5,
            free_cash_flow: -1.0,
            net_income: -1.0,
            cash_reserves: 0.0,
            operating_costs: 1.0,
            ..FinancialSnapshot::default()
        }
    }

    fn status_of(snapshot: &FinancialSnapshot, rule: &str) -> RuleStatus {
        FinancialRuleEngine::new()
            .evaluate(snapshot)
            .outcome(rule)
            .map(|o| o.status)
            .expect("rule present in breakdown")
    }

    #[test]
    fn test_scenario_all_rules_pass() {
        let report = FinancialRuleEngine::new().evaluate(&healthy_tech());

        assert_eq!(report.score, 100.0);
        assert_eq!(report.verdict, Verdict::Trusted);
        assert_eq!(report.passed, 7);
        assert_eq!(report.total, 7);
        assert!(report.violations().is_empty());
    }

    #[test]
    fn test_scenario_distressed_financial_firm() {
        let svb = FinancialSnapshot {
            symbol: "SIVB".to_string(),
            sector: "Financial Services".to_string(),
            current_price: 200.0,
            pe_ratio: 8.0,
            debt_to_equity: 250.0,
            free_cash_flow: -100_000.0,
            net_income: 100.0,
            cash_reserves: 5000.0,
            operating_costs: 1000.0,
            ..FinancialSnapshot::default()
        };
        let report = FinancialRuleEngine::new().evaluate(&svb);

        assert_eq!(report.outcome(SOLVENCY).unwrap().status, RuleStatus::Fail);
        assert_eq!(report.outcome(FREE_CASH_FLOW).unwrap().status, RuleStatus::Fail);
        assert!(report.score <= 60.0, "got {}", report.score);
        assert!(matches!(report.verdict, Verdict::Caution | Verdict::Risky));
    }

    #[test]
    fn test_scenario_distressed_with_reported_margins() {
        // ROE reported as a large raw number still passes Efficiency
        let svb = FinancialSnapshot {
            symbol: "SIVB".to_string(),
            sector: "Financial Services".to_string(),
            current_price: 200.0,
            pe_ratio: 8.0,
            debt_to_equity: 250.0,
            revenue_growth: 0.0,
            cash_reserves: 5000.0,
            operating_costs: 1000.0,
            net_income: 100.0,
            profit_margins: 0.1,
            roe: 12.0,
            free_cash_flow: -100_000.0,
            ..FinancialSnapshot::default()
        };
        let report = FinancialRuleEngine::new().evaluate(&svb);

        assert_eq!(report.passed, 3);
        assert_eq!(report.score, 42.9);
        assert_eq!(report.verdict, Verdict::Caution);
        let failed: Vec<_> = report.violations().into_iter().map(|v| v.rule).collect();
        assert_eq!(failed, vec![SOLVENCY, GROWTH, PROFITABILITY, FREE_CASH_FLOW]);
    }

    #[test]
    fn test_scenario_all_rules_fail() {
        let report = FinancialRuleEngine::new().evaluate(&distressed());

        assert_eq!(report.score, 0.0);
        assert_eq!(report.verdict, Verdict::Risky);
        assert_eq!(report.passed, 0);
        assert_eq!(report.violations().len(), 7);
    }

    #[test]
    fn test_breakdown_order_is_fixed() {
        let engine = FinancialRuleEngine::new();
        for snapshot in [healthy_tech(), distressed(), FinancialSnapshot::default()] {
            let names: Vec<_> = engine
                .evaluate(&snapshot)
                .breakdown
                .into_iter()
                .map(|o| o.rule)
                .collect();
            assert_eq!(names, RULE_NAMES.to_vec());
        }
    }

    #[test]
    fn test_determinism() {
        let engine = FinancialRuleEngine::new();
        let snapshot = FinancialSnapshot {
            pe_ratio: 45.0,
            sector: "Energy".to_string(),
            ..healthy_tech()
        };
        let first = engine.evaluate(&snapshot);
        for _ in 0..20 {
            let again = engine.evaluate(&snapshot);
            assert_eq!(again, first);
            assert_eq!(again.score.to_bits(), first.score.to_bits());
        }
    }

    #[test]
    fn test_score_granularity_and_bounds() {
        for passed in 0..=7 {
            let score = score_from_counts(passed, 7);
            assert!((0.0..=100.0).contains(&score));
            assert!((score - passed as f64 * STEP).abs() <= 0.05, "{} -> {}", passed, score);
            // one decimal place
            assert!(((score * 10.0).round() - score * 10.0).abs() < 1e-9);
        }
        assert_eq!(score_from_counts(1, 7), 14.3);
        assert_eq!(score_from_counts(4, 7), 57.1);
        assert_eq!(score_from_counts(5, 7), 71.4);
        assert_eq!(score_from_counts(0, 0), 0.0);
    }

    #[test]
    fn test_verdict_follows_score() {
        let expected = [
            Verdict::Risky,   // 0.0
            Verdict::Risky,   // 14.3
            Verdict::Risky,   // 28.6
            Verdict::Caution, // 42.9
            Verdict::Caution, // 57.1
            Verdict::Trusted, // 71.4
            Verdict::Trusted, // 85.7
            Verdict::Trusted, // 100.0
        ];
        for (passed, verdict) in expected.iter().enumerate() {
            assert_eq!(Verdict::from_score(score_from_counts(passed, 7)), *verdict);
        }
    }

    /// Each entry flips exactly one rule of `distressed()` to PASS
    fn single_flips() -> Vec<(&'static str, FinancialSnapshot)> {
        let base = distressed();
        vec![
            (VALUATION, FinancialSnapshot { pe_ratio: 10.0, ..base.clone() }),
            (SOLVENCY, FinancialSnapshot { debt_to_equity: 100.0, ..base.clone() }),
            (GROWTH, FinancialSnapshot { revenue_growth: 0.10, ..base.clone() }),
            (PROFITABILITY, FinancialSnapshot { profit_margins: 0.20, ..base.clone() }),
            (EFFICIENCY, FinancialSnapshot { roe: 0.20, ..base.clone() }),
            (FREE_CASH_FLOW, FinancialSnapshot { free_cash_flow: 1.0, ..base.clone() }),
            (LIQUIDITY_RUNWAY, FinancialSnapshot { cash_reserves: 5.0, ..base.clone() }),
        ]
    }

    #[test]
    fn test_single_flip_changes_only_that_rule() {
        let engine = FinancialRuleEngine::new();
        let base = engine.evaluate(&distressed());

        for (rule, flipped) in single_flips() {
            let report = engine.evaluate(&flipped);
            assert!((report.score - base.score - STEP).abs() < 0.06, "{}: {}", rule, report.score);
            for (before, after) in base.breakdown.iter().zip(report.breakdown.iter()) {
                if before.rule == rule {
                    assert_eq!(after.status, RuleStatus::Pass, "{}", rule);
                } else {
                    assert_eq!(after.status, before.status, "{} changed while flipping {}", after.rule, rule);
                }
            }
        }
    }

    #[test]
    fn test_flips_accumulate() {
        let engine = FinancialRuleEngine::new();
        let mut snapshot = distressed();
        let mut previous = engine.evaluate(&snapshot).score;

        snapshot.pe_ratio = 10.0;
        snapshot.debt_to_equity = 100.0;
        let two = engine.evaluate(&snapshot).score;
        assert!(two > previous);
        previous = two;

        snapshot.revenue_growth = 0.10;
        snapshot.profit_margins = 0.20;
        snapshot.roe = 0.20;
        let five = engine.evaluate(&snapshot).score;
        assert!((five - previous - 3.0 * STEP).abs() < 0.06);
        assert_eq!(engine.evaluate(&snapshot).verdict, Verdict::Trusted);
    }

    #[test]
    fn test_valuation_depends_on_sector() {
        let tech = FinancialSnapshot {
            pe_ratio: 45.0,
            sector: "Technology".to_string(),
            ..healthy_tech()
        };
        let cyclical = FinancialSnapshot {
            sector: "Consumer Cyclical".to_string(),
            ..tech.clone()
        };
        let comms = FinancialSnapshot {
            sector: "Communication Services".to_string(),
            ..tech.clone()
        };

        assert_eq!(status_of(&tech, VALUATION), RuleStatus::Pass);
        assert_eq!(status_of(&comms, VALUATION), RuleStatus::Pass);
        assert_eq!(status_of(&cyclical, VALUATION), RuleStatus::Fail);
    }

    #[test]
    fn test_valuation_limits_are_exclusive() {
        let at_limit = FinancialSnapshot { pe_ratio: 30.0, sector: "Utilities".to_string(), ..healthy_tech() };
        let below = FinancialSnapshot { pe_ratio: 29.9, ..at_limit.clone() };
        let tech_at_limit = FinancialSnapshot { pe_ratio: 60.0, sector: "Technology".to_string(), ..healthy_tech() };

        assert_eq!(status_of(&at_limit, VALUATION), RuleStatus::Fail);
        assert_eq!(status_of(&below, VALUATION), RuleStatus::Pass);
        assert_eq!(status_of(&tech_at_limit, VALUATION), RuleStatus::Fail);
    }

    #[test]
    fn test_non_positive_pe_fails_valuation() {
        for pe in [0.0, -12.5] {
            let snapshot = FinancialSnapshot { pe_ratio: pe, ..healthy_tech() };
            let report = FinancialRuleEngine::new().evaluate(&snapshot);
            let valuation = report.outcome(VALUATION).unwrap();
            assert_eq!(valuation.status, RuleStatus::Fail);
            assert!(valuation.detail.contains("not positive"), "{}", valuation.detail);
        }
    }

    #[test]
    fn test_unrecognized_sector_uses_default_limit() {
        let snapshot = FinancialSnapshot { pe_ratio: 35.0, sector: "Quantum Widgets".to_string(), ..healthy_tech() };
        let report = FinancialRuleEngine::new().evaluate(&snapshot);
        assert_eq!(report.outcome(VALUATION).unwrap().detail, "P/E 35.0 exceeds limit 30");
    }

    #[test]
    fn test_sector_match_is_exact() {
        let engine = FinancialRuleEngine::new();
        for sector in ["technology", "TECHNOLOGY", "Technology "] {
            let snapshot = FinancialSnapshot { pe_ratio: 45.0, sector: sector.to_string(), ..healthy_tech() };
            let valuation = engine.evaluate(&snapshot).outcome(VALUATION).unwrap().clone();
            assert!(!valuation.passed(), "{:?}", sector);
            assert_eq!(valuation.detail, "P/E 45.0 exceeds limit 30");
        }
    }

    #[test]
    fn test_debt_to_equity_is_percentage_style() {
        // 199.9 means 1.999x, 200 means exactly 2.0x
        let below = FinancialSnapshot { debt_to_equity: 199.9, ..healthy_tech() };
        let at = FinancialSnapshot { debt_to_equity: 200.0, ..healthy_tech() };
        let high = FinancialSnapshot { debt_to_equity: 250.0, ..healthy_tech() };
        assert_eq!(status_of(&below, SOLVENCY), RuleStatus::Pass);
        assert_eq!(status_of(&at, SOLVENCY), RuleStatus::Fail);
        assert_eq!(status_of(&high, SOLVENCY), RuleStatus::Fail);

        // A provider reporting a raw 1.5 ratio would read as 0.015x and pass
        let raw_ratio = FinancialSnapshot { debt_to_equity: 1.5, ..healthy_tech() };
        assert_eq!(status_of(&raw_ratio, SOLVENCY), RuleStatus::Pass);

        let report = FinancialRuleEngine::new().evaluate(&high);
        assert_eq!(
            report.outcome(SOLVENCY).unwrap().detail,
            "Debt/Equity 2.50 is risky (>= 2.00)"
        );
    }

    #[test]
    fn test_liquidity_profitable_company_always_passes() {
        for (cash, costs) in [(0.0, 1e9), (1e9, 0.0), (0.0, 0.0)] {
            let snapshot = FinancialSnapshot {
                net_income: 500.0,
                cash_reserves: cash,
                operating_costs: costs,
                ..distressed()
            };
            let report = FinancialRuleEngine::new().evaluate(&snapshot);
            let runway = report.outcome(LIQUIDITY_RUNWAY).unwrap();
            assert_eq!(runway.status, RuleStatus::Pass);
            assert_eq!(runway.detail, "Company is profitable (liquidity not at risk)");
        }
    }

    #[test]
    fn test_liquidity_loss_making_company_needs_reserves() {
        let short = FinancialSnapshot {
            net_income: -50.0,
            cash_reserves: 100.0,
            operating_costs: 200.0,
            ..healthy_tech()
        };
        let covered = FinancialSnapshot { cash_reserves: 300.0, ..short.clone() };
        let equal = FinancialSnapshot { cash_reserves: 200.0, ..short.clone() };

        assert_eq!(status_of(&short, LIQUIDITY_RUNWAY), RuleStatus::Fail);
        assert_eq!(status_of(&covered, LIQUIDITY_RUNWAY), RuleStatus::Pass);
        assert_eq!(status_of(&equal, LIQUIDITY_RUNWAY), RuleStatus::Fail);
    }

    #[test]
    fn test_liquidity_detail_in_millions() {
        let snapshot = FinancialSnapshot {
            net_income: -1.0,
            cash_reserves: 2_500_000.0,
            operating_costs: 10_000_000.0,
            ..healthy_tech()
        };
        let report = FinancialRuleEngine::new().evaluate(&snapshot);
        assert_eq!(
            report.outcome(LIQUIDITY_RUNWAY).unwrap().detail,
            "CRITICAL: cash ($2.5M) insufficient for burn ($10.0M)"
        );
    }

    #[test]
    fn test_default_snapshot_fails_closed() {
        // Zero debt and zero net income are the only defaults that pass
        let report = FinancialRuleEngine::new().evaluate(&FinancialSnapshot::default());
        assert_eq!(report.passed, 2);
        assert_eq!(report.score, 28.6);
        assert_eq!(report.verdict, Verdict::Risky);
        assert_eq!(report.outcome(VALUATION).unwrap().status, RuleStatus::Fail);
        assert_eq!(report.outcome(SOLVENCY).unwrap().status, RuleStatus::Pass);
        assert_eq!(report.outcome(LIQUIDITY_RUNWAY).unwrap().status, RuleStatus::Pass);
    }

    #[test]
    fn test_non_finite_metrics_fail_without_panicking() {
        let snapshot = FinancialSnapshot {
            pe_ratio: f64::NAN,
            debt_to_equity: f64::INFINITY,
            roe: f64::NEG_INFINITY,
            net_income: f64::NAN,
            ..healthy_tech()
        };
        let report = FinancialRuleEngine::new().evaluate(&snapshot);

        assert_eq!(report.total, 7);
        for rule in [VALUATION, SOLVENCY, EFFICIENCY, LIQUIDITY_RUNWAY] {
            let o = report.outcome(rule).unwrap();
            assert_eq!(o.status, RuleStatus::Fail, "{}", rule);
            assert!(o.detail.ends_with("unavailable"), "{}", o.detail);
        }
        assert_eq!(report.passed, 3);
    }

    #[test]
    fn test_detail_strings() {
        let report = FinancialRuleEngine::new().evaluate(&healthy_tech());
        let details: Vec<_> = report.breakdown.iter().map(|o| o.detail.as_str()).collect();
        assert_eq!(
            details,
            vec![
                "P/E 25.0 is within limit 60",
                "Debt/Equity 1.00 is healthy (< 2.00)",
                "Revenue growth 10.0% > 5.0%",
                "Net margin 25.0% is healthy",
                "ROE 30.0% indicates strong management",
                "Generating positive free cash flow",
                "Company is profitable (liquidity not at risk)",
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = FinancialRuleEngine::with_thresholds(RuleThresholds {
            growth_sector_pe_limit: 20.0,
            min_roe: 0.50,
            ..RuleThresholds::default()
        });
        let report = strict.evaluate(&healthy_tech());
        assert_eq!(report.outcome(VALUATION).unwrap().status, RuleStatus::Fail);
        assert_eq!(report.outcome(EFFICIENCY).unwrap().status, RuleStatus::Fail);
        assert_eq!(report.passed, 5);
        assert_eq!(strict.thresholds().min_roe, 0.50);
    }

    #[test]
    fn test_evaluate_many_preserves_order() {
        let engine = FinancialRuleEngine::new();
        let snapshots: Vec<_> = (0..50)
            .map(|i| if i % 2 == 0 { healthy_tech() } else { distressed() })
            .collect();
        let reports = engine.evaluate_many(&snapshots);

        assert_eq!(reports.len(), 50);
        for (snapshot, report) in snapshots.iter().zip(reports.iter()) {
            assert_eq!(*report, engine.evaluate(snapshot));
        }
        assert_eq!(reports[0].score, 100.0);
        assert_eq!(reports[1].score, 0.0);
    }

    #[test]
    fn test_usable_through_trait_object() {
        let evaluator: Box<dyn RuleEvaluator> = Box::new(FinancialRuleEngine::default());
        let report = evaluator.evaluate(&healthy_tech());
        assert_eq!(report.verdict, Verdict::Trusted);
    }

    #[test]
    fn test_concurrent_evaluation_from_threads() {
        let engine = std::sync::Arc::new(FinancialRuleEngine::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = std::sync::Arc::clone(&engine);
                std::thread::spawn(move || engine.evaluate(&healthy_tech()).score)
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 100.0);
        }
    }
}
