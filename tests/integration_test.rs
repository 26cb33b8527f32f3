//! End-to-end tests of the per-ticker evaluation.
//!
//! Tests cover:
//! - Feature set, both strategies and the baseline from one price history
//! - Error categories for empty, short and pre-split histories
//! - Random forest determinism across runs
//! - The CSV cache in front of a data source, online then offline

mod common;

use approx::assert_relative_eq;
use bandforest::adapters::csv_cache_adapter::CsvCacheAdapter;
use bandforest::adapters::forest_model::RandomForestModel;
use bandforest::domain::error::ForestError;
use bandforest::domain::evaluation::evaluate_ticker;
use bandforest::domain::strategy::StrategyKind;
use bandforest::ports::data_port::DataPort;
use common::*;

mod evaluation_pipeline {
    use super::*;

    #[test]
    fn evaluates_ticker_with_mean_model() {
        let config = test_config(&["TEST"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);
        let test_bars = bars.iter().filter(|b| b.date >= config.split_date).count();

        let report = evaluate_ticker("TEST", &bars, &config, &mut MeanModel::default()).unwrap();

        assert_eq!(report.ticker, "TEST");
        assert_eq!(report.summary.ticker, "TEST");
        assert_eq!(report.classical.strategy, StrategyKind::Classical);
        assert_eq!(report.enhanced.strategy, StrategyKind::Enhanced);
        // the last bar has no next-day WMA, so it never becomes a feature row
        assert_eq!(report.comparison.len(), test_bars - 1);
        assert!(report.comparison.iter().all(|p| p.date >= config.split_date));
        assert!(report.comparison.windows(2).all(|w| w[0].date < w[1].date));
        assert_relative_eq!(
            report.comparison[0].buy_and_hold,
            config.backtest.initial_capital,
            max_relative = 1e-12
        );
    }

    #[test]
    fn report_carries_full_metrics_and_model_fit() {
        let config = test_config(&["TEST"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);
        let train_bars = bars.iter().filter(|b| b.date < config.split_date).count();
        let report = evaluate_ticker("TEST", &bars, &config, &mut MeanModel::default()).unwrap();

        let kinds: Vec<StrategyKind> = report.metrics.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![StrategyKind::Enhanced, StrategyKind::Classical, StrategyKind::BuyAndHold]
        );
        assert_eq!(
            report.metrics[1].1.total_trades,
            report.classical.portfolio.closed_trades.len()
        );
        assert!(report.model.train_rows > 0 && report.model.train_rows < train_bars);
        assert_eq!(report.model.metrics.samples, report.comparison.len());
        assert!(report.comparison.iter().all(|p| p.predicted_wma_next.is_some()));
    }

    #[test]
    fn summary_matches_strategy_returns() {
        let config = test_config(&["TEST"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);
        let report = evaluate_ticker("TEST", &bars, &config, &mut MeanModel::default()).unwrap();

        let classical_pct = report.classical.total_return() * 100.0;
        let enhanced_pct = report.enhanced.total_return() * 100.0;
        assert!((report.summary.classical_return_pct - classical_pct).abs() < 0.006);
        assert!((report.summary.enhanced_return_pct - enhanced_pct).abs() < 0.006);
        assert!(report.summary.classical_drawdown_pct <= 0.0);
        assert!(report.summary.enhanced_drawdown_pct <= 0.0);
        assert!((0.0..=100.0).contains(&report.summary.directional_accuracy_pct));
    }

    #[test]
    fn classical_trades_only_in_test_period() {
        let config = test_config(&["TEST"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);
        let report = evaluate_ticker("TEST", &bars, &config, &mut MeanModel::default()).unwrap();

        let portfolio = &report.classical.portfolio;
        assert!(
            portfolio
                .closed_trades
                .iter()
                .all(|t| t.entry_date >= config.split_date && t.exit_date >= t.entry_date)
        );
        if let Some(p) = &portfolio.position {
            assert!(p.entry_date >= config.split_date);
        }
    }

    #[test]
    fn empty_history_is_no_data() {
        let config = test_config(&["NONE"]);
        let err = evaluate_ticker("NONE", &[], &config, &mut MeanModel::default()).unwrap_err();
        assert!(matches!(err, ForestError::NoData { .. }));
    }

    #[test]
    fn history_before_split_is_no_test_data() {
        let config = test_config(&["OLD"]);
        let bars = generate_bars("2018-01-01", 200, 50.0);
        let err = evaluate_ticker("OLD", &bars, &config, &mut MeanModel::default()).unwrap_err();
        assert!(matches!(err, ForestError::NoTestData { .. }));
    }

    #[test]
    fn short_training_window_is_insufficient_data() {
        let config = test_config(&["NEW"]);
        let bars = generate_bars("2018-12-10", 60, 50.0);
        let err = evaluate_ticker("NEW", &bars, &config, &mut MeanModel::default()).unwrap_err();
        assert!(matches!(err, ForestError::InsufficientData { minimum: 10, .. }));
    }

    #[test]
    fn model_failure_propagates() {
        let config = test_config(&["TEST"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);
        let err = evaluate_ticker("TEST", &bars, &config, &mut FailingModel).unwrap_err();
        assert!(matches!(err, ForestError::Model { .. }));
    }
}

mod random_forest {
    use super::*;

    #[test]
    fn same_seed_gives_identical_reports() {
        let config = test_config(&["RF"]);
        let bars = generate_bars("2018-01-01", 500, 100.0);

        let mut first = RandomForestModel::new(config.forest);
        let mut second = RandomForestModel::new(config.forest);
        let a = evaluate_ticker("RF", &bars, &config, &mut first).unwrap();
        let b = evaluate_ticker("RF", &bars, &config, &mut second).unwrap();

        assert_eq!(a.summary, b.summary);
        assert_eq!(a.comparison, b.comparison);
    }
}

mod cached_data_source {
    use super::*;

    #[test]
    fn cache_serves_offline_after_first_fetch() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = generate_bars("2018-01-01", 30, 20.0);
        let (start, end) = (date(2018, 1, 1), date(2018, 1, 30));

        let online = CsvCacheAdapter::new(
            dir.path().to_path_buf(),
            MockDataPort::new().with_bars("0005.HK", bars.clone()),
        );
        let fetched = online.fetch_ohlcv("0005.HK", start, end).unwrap();
        assert_eq!(fetched.len(), 30);
        assert!(online.cache_path("0005.HK", start, end).exists());

        let offline = CsvCacheAdapter::new(dir.path().to_path_buf(), MockDataPort::new())
            .offline(true);
        let cached = offline.fetch_ohlcv("0005.HK", start, end).unwrap();
        assert_eq!(cached.len(), fetched.len());
        for (a, b) in cached.iter().zip(&fetched) {
            assert_eq!(a.date, b.date);
            assert_relative_eq!(a.close, b.close, max_relative = 1e-9);
            assert_eq!(a.volume, b.volume);
        }
    }

    #[test]
    fn offline_miss_is_no_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let offline =
            CsvCacheAdapter::new(dir.path().to_path_buf(), MockDataPort::new()).offline(true);
        let err = offline
            .fetch_ohlcv("AAPL", date(2018, 1, 1), date(2018, 12, 31))
            .unwrap_err();
        assert!(matches!(err, ForestError::NoData { .. }));
    }
}
