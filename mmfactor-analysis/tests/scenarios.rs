use approx::assert_relative_eq;
use mmfactor_analysis::{
    AnalysisConfig, CentralityConfig, EventOutcome, MediumModificationAnalysis,
};
use mmfactor_core::centrality::{CentralityBin, CentralityEstimator, VetoReason};
use mmfactor_core::particle::{pid, Event, Particle};
use mmfactor_core::{Error, FoldStep};

/// Estimator returning the same centrality for every event.
#[derive(Debug)]
struct FixedCentrality(f64);

impl CentralityEstimator for FixedCentrality {
    fn name(&self) -> &'static str {
        "Fixed"
    }

    fn estimate(&mut self, _event: &Event) -> f64 {
        self.0
    }

    fn is_calibrated(&self) -> bool {
        true
    }
}

fn analysis_at(centrality: f64, config: AnalysisConfig) -> MediumModificationAnalysis {
    let mut analysis =
        MediumModificationAnalysis::with_estimator(config, Box::new(FixedCentrality(centrality)))
            .unwrap();
    analysis.init().unwrap();
    analysis
}

fn photon(pt: f64, phi: f64) -> Particle {
    Particle::new(pid::PHOTON, pt, 3.5, phi)
}

fn hadron(pt: f64, phi: f64) -> Particle {
    Particle::new(pid::PI_PLUS, pt, 0.3, phi)
}

fn entries_at(analysis: &MediumModificationAnalysis, x: f64) -> u64 {
    let histogram = analysis.accumulator().unwrap().bins()[0].histogram();
    histogram.bins()[histogram.bin_index(x).unwrap()].entries
}

#[test]
fn test_single_pair_at_central_event() {
    let mut analysis = analysis_at(20.0, AnalysisConfig::default());
    let event = Event::new(2.0, vec![photon(6.0, 0.5), hadron(2.0, 1.0)]);

    let outcome = analysis.analyze(&event).unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Accepted {
            bin: 0,
            centrality: 20.0,
            triggers: 1,
            associates: 1,
            pairs: 1,
        }
    );
    assert_eq!(entries_at(&analysis, 0.5), 1);
    assert_eq!(analysis.accumulator().unwrap().bins()[0].triggers(), 1);
}

#[test]
fn test_harder_associate_counts_trigger_only() {
    let mut analysis = analysis_at(20.0, AnalysisConfig::default());
    let event = Event::new(2.0, vec![photon(6.0, 0.5), hadron(8.0, 1.0)]);

    analysis.analyze(&event).unwrap();
    let bin = &analysis.accumulator().unwrap().bins()[0];
    assert_eq!(bin.histogram().entries(), 0);
    assert_eq!(bin.triggers(), 1);
}

#[test]
fn test_normalization_by_trigger_count() {
    let mut analysis = analysis_at(20.0, AnalysisConfig::default());
    analysis
        .analyze(&Event::new(2.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();
    analysis
        .analyze(&Event::new(2.0, vec![photon(7.0, 0.0), hadron(3.0, 1.5)]))
        .unwrap();

    let histogram = analysis.accumulator().unwrap().bins()[0].histogram();
    let at_05 = histogram.bin_index(0.5).unwrap();
    let at_15 = histogram.bin_index(1.5).unwrap();

    let results = analysis.finalize().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].triggers, 2);
    assert!(results[0].normalized);
    assert_relative_eq!(results[0].histogram.bins()[at_05].sumw, 0.5);
    assert_relative_eq!(results[0].histogram.bins()[at_15].sumw, 0.5);
    assert_relative_eq!(results[0].histogram.sum_w(), 1.0);
}

#[test]
fn test_empty_bin_reports_division_error() {
    let mut analysis = analysis_at(70.0, AnalysisConfig::default());
    let outcome = analysis
        .analyze(&Event::new(9.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();
    assert_eq!(outcome, EventOutcome::Vetoed(VetoReason::NoMatchingBin(70.0)));

    match analysis.finalize() {
        Err(Error::ZeroTriggers { bins }) => assert_eq!(bins, vec!["d01-x01-y01".to_string()]),
        other => panic!("expected ZeroTriggers, got {other:?}"),
    }

    let result = &analysis.results()[0];
    assert!(!result.normalized);
    assert!(result.histogram.bins().iter().all(|b| b.sumw.is_finite()));
}

#[test]
fn test_out_of_range_centrality_contributes_nothing() {
    for centrality in [-1.0, 100.5, f64::NAN, 0.0, 40.5] {
        let mut analysis = analysis_at(centrality, AnalysisConfig::default());
        let outcome = analysis
            .analyze(&Event::new(1.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
            .unwrap();
        assert!(matches!(outcome, EventOutcome::Vetoed(_)));

        let bin = &analysis.accumulator().unwrap().bins()[0];
        assert_eq!(bin.triggers(), 0);
        assert_eq!(bin.histogram().entries(), 0);
        assert_eq!(analysis.statistics().vetoed(), 1);
    }
}

#[test]
fn test_trigger_counter_independent_of_pairing() {
    let mut analysis = analysis_at(10.0, AnalysisConfig::default());
    let events = [
        Event::new(1.0, vec![photon(6.0, 0.0), photon(5.5, 1.0)]),
        Event::new(1.0, vec![photon(8.0, 0.0), hadron(2.0, 0.1), hadron(3.0, 0.2)]),
        Event::new(1.0, vec![hadron(2.0, 0.1)]),
        Event::new(
            1.0,
            vec![Particle::new(pid::PI0, 0.14, 3.5, 0.0), hadron(1.5, 0.1)],
        ),
    ];
    for event in &events {
        analysis.analyze(event).unwrap();
    }

    let bin = &analysis.accumulator().unwrap().bins()[0];
    assert_eq!(bin.triggers(), 4);
    // Only the 8 GeV photon pairs; the 0.14 GeV pi0 is softer than its associate
    assert_eq!(bin.histogram().entries(), 2);
    assert_eq!(analysis.statistics().pairs, 2);
}

#[test]
fn test_multiple_centrality_bins() {
    let config = AnalysisConfig::default().with_centrality(
        CentralityConfig::default().with_bins(vec![
            CentralityBin::new(0.0, 20.0, "central"),
            CentralityBin::new(20.0, 40.0, "mid"),
        ]),
    );
    let mut analysis = analysis_at(30.0, config);
    analysis
        .analyze(&Event::new(1.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();

    let bins = analysis.accumulator().unwrap().bins();
    assert_eq!(bins[0].triggers(), 0);
    assert_eq!(bins[1].triggers(), 1);

    match analysis.finalize() {
        Err(Error::ZeroTriggers { bins }) => assert_eq!(bins, vec!["central".to_string()]),
        other => panic!("expected ZeroTriggers, got {other:?}"),
    }
    assert!(analysis.results()[1].normalized);
}

#[test]
fn test_quarter_turn_fold() {
    let config = AnalysisConfig::default().with_fold_step(FoldStep::QuarterTurn);
    let mut analysis = analysis_at(20.0, config);
    analysis
        .analyze(&Event::new(1.0, vec![photon(6.0, 1.0), hadron(2.0, 0.5)]))
        .unwrap();
    assert_eq!(entries_at(&analysis, std::f64::consts::FRAC_PI_2 - 0.5), 1);
}

#[test]
fn test_impact_parameter_warmup_run() {
    let config = AnalysisConfig::default()
        .with_centrality(CentralityConfig::default().with_sample_size(10));
    let mut analysis = MediumModificationAnalysis::new(config).unwrap();
    analysis.init().unwrap();

    // Calibration sample: b = 1..10 fm
    for b in 1..=10 {
        let outcome = analysis
            .analyze(&Event::new(f64::from(b), vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
            .unwrap();
        assert_eq!(outcome, EventOutcome::Vetoed(VetoReason::Uncalibrated));
    }

    // b = 3 is at the 30th percentile, b = 7 at the 70th
    let central = analysis
        .analyze(&Event::new(3.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();
    assert!(matches!(central, EventOutcome::Accepted { bin: 0, pairs: 1, .. }));

    let peripheral = analysis
        .analyze(&Event::new(7.0, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();
    assert!(matches!(
        peripheral,
        EventOutcome::Vetoed(VetoReason::NoMatchingBin(_))
    ));

    let stats = analysis.statistics();
    assert_eq!(stats.events, 12);
    assert_eq!(stats.vetoed_uncalibrated, 10);
    assert_eq!(stats.accepted, 1);

    let results = analysis.finalize().unwrap();
    assert_relative_eq!(results[0].histogram.sum_w(), 1.0);
}

#[test]
fn test_event_more_central_than_calibration_sample() {
    let config = AnalysisConfig::default()
        .with_centrality(CentralityConfig::default().with_sample_size(4));
    let mut analysis = MediumModificationAnalysis::new(config).unwrap();
    analysis.init().unwrap();
    for b in [1.0, 2.0, 3.0, 4.0] {
        analysis
            .analyze(&Event::new(b, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
            .unwrap();
    }

    let outcome = analysis
        .analyze(&Event::new(0.5, vec![photon(6.0, 0.0), hadron(2.0, 0.5)]))
        .unwrap();
    assert_eq!(
        outcome,
        EventOutcome::Accepted {
            bin: 0,
            centrality: 25.0,
            triggers: 1,
            associates: 1,
            pairs: 1,
        }
    );
    assert_eq!(analysis.statistics().vetoed_no_bin, 0);
}

#[test]
fn test_batch_matches_sequential() {
    let config = AnalysisConfig::default()
        .with_centrality(CentralityConfig::default().with_sample_size(20));
    let events: Vec<Event> = (0..400)
        .map(|i| {
            let b = f64::from(i % 13);
            let phi = f64::from(i % 7) * 0.8;
            Event::new(
                b,
                vec![
                    photon(5.0 + f64::from(i % 5), phi),
                    hadron(2.0, 0.3),
                    hadron(6.5, 2.9),
                    hadron(1.3, 5.0),
                ],
            )
        })
        .collect();

    let mut sequential = MediumModificationAnalysis::new(config.clone()).unwrap();
    sequential.init().unwrap();
    for event in &events {
        sequential.analyze(event).unwrap();
    }

    let mut batched = MediumModificationAnalysis::new(config).unwrap();
    batched.init().unwrap();
    for chunk in events.chunks(64) {
        batched.analyze_batch(chunk).unwrap();
    }

    assert_eq!(sequential.statistics(), batched.statistics());

    let seq = sequential.finalize().unwrap().to_vec();
    let bat = batched.finalize().unwrap();
    for (s, b) in seq.iter().zip(bat) {
        assert_eq!(s.triggers, b.triggers);
        for (sb, bb) in s.histogram.bins().iter().zip(b.histogram.bins()) {
            assert_eq!(sb.entries, bb.entries);
            assert_relative_eq!(sb.sumw, bb.sumw, epsilon = 1e-12);
        }
    }
}
