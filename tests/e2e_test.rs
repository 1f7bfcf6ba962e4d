use chrono::NaiveDate;
use lowcorr::data::{self, SymbolProfile, SyntheticPriceGenerator};
use lowcorr::models::PriceSeries;
use lowcorr::report::GroupReport;
use lowcorr::selection::{rng_from_seed, GroupSelector, SelectionError};
use lowcorr::stats::{correlation_matrix, DateRange, ReturnTable};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

fn profiles() -> Vec<SymbolProfile> {
    vec![
        SymbolProfile::new("F1", 1.0, 0.002),
        SymbolProfile::new("F2", 1.0, 0.002),
        SymbolProfile::new("F3", 1.0, 0.002),
        SymbolProfile::new("I1", 0.0, 0.02),
        SymbolProfile::new("I2", 0.0, 0.02),
        SymbolProfile::new("I3", 0.0, 0.02),
    ]
}

#[test]
fn test_e2e_workflow() {
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Starting E2E Test ===\n");

    // 1. Generate prices
    println!("1. Generating synthetic prices...");
    let prices = SyntheticPriceGenerator::new(42).generate(&profiles(), start(), 400);
    assert_eq!(prices.series.len(), 6);

    // 2. Returns and correlation matrix
    println!("2. Building correlation matrix...");
    let returns = ReturnTable::from_prices(&prices, None);
    assert_eq!(returns.num_observations(), 399);

    let matrix = correlation_matrix(&returns).unwrap();
    assert_eq!(matrix.len(), 6);
    assert!(matrix.get_by_symbol("F1", "F3").unwrap() > 0.9);
    println!("   ✓ corr(F1, F3) = {:.3}", matrix.get_by_symbol("F1", "F3").unwrap());

    // 3. Search
    println!("3. Searching least correlated group...");
    let mut rng = rng_from_seed(Some(7));
    let result = GroupSelector::new(1000).select(&matrix, 3, &mut rng).unwrap();

    let followers = result.group.iter().filter(|s| s.starts_with('F')).count();
    assert!(followers <= 1, "group {:?} holds correlated symbols", result.group);
    assert!(result.score < 0.2);
    assert_eq!(result.effective_size, 3);
    println!("   ✓ Group {:?} score {:.4}", result.group, result.score);

    // 4. Report
    println!("4. Building report...");
    let report = GroupReport::build(&result, &matrix);
    assert_eq!(report.rows.len(), 3);
    assert!(report.rows.iter().all(|r| (0.0..=1.0).contains(&r.avg_abs_correlation)));
    report.print();

    println!("\n=== E2E Test Complete ===");
}

#[test]
fn test_e2e_price_file_with_dead_symbol() {
    let mut prices = SyntheticPriceGenerator::new(3).generate(&profiles()[..3], start(), 120);
    let mut dead = PriceSeries::new("DEAD");
    for point in &prices.series[0].points {
        dead.push(point.date, None);
    }
    prices.series.push(dead);

    let path = std::env::temp_dir().join(format!("lowcorr-e2e-{}.json", std::process::id()));
    data::save_prices(&path, &prices).unwrap();
    let loaded = data::load_prices(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let wanted: Vec<String> = ["F1", "F2", "F3", "DEAD", "GONE"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let loaded = data::select_symbols(loaded, &wanted);
    assert_eq!(loaded.series.len(), 4);

    let range = DateRange::new(start(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
    let returns = ReturnTable::from_prices(&loaded, Some(range));
    let matrix = correlation_matrix(&returns).unwrap();
    assert_eq!(matrix.len(), 3);

    // Requested 5, only 3 usable symbols: clamped and the full set comes back
    let result = GroupSelector::new(20)
        .select(&matrix, 5, &mut rng_from_seed(Some(1)))
        .unwrap();
    assert!(result.clamped);
    assert_eq!(result.requested_size, 5);
    assert_eq!(result.group, vec!["F1", "F2", "F3"]);

    let expected = matrix.mean_abs_off_diagonal().unwrap();
    assert!((result.score - expected).abs() < 1e-12);
}

#[test]
fn test_e2e_failures_surface_to_caller() {
    let prices = SyntheticPriceGenerator::new(9).generate(&profiles(), start(), 60);
    let matrix = correlation_matrix(&ReturnTable::from_prices(&prices, None)).unwrap();

    let err = GroupSelector::new(0)
        .select(&matrix, 3, &mut rng_from_seed(Some(1)))
        .unwrap_err();
    assert_eq!(err, SelectionError::NoTrialsRequested);

    // Every symbol dropped upstream
    let empty = correlation_matrix(&ReturnTable::from_prices(&Default::default(), None)).unwrap();
    let err = GroupSelector::default()
        .select(&empty, 3, &mut rng_from_seed(Some(1)))
        .unwrap_err();
    assert_eq!(err, SelectionError::EmptySymbolSet);
}
