use choro_core::{jenks_breaks, ColorRamp, ColorScheme, NumberFormat, ValueMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_sample(rng: &mut StdRng) -> Vec<f64> {
    let n = rng.gen_range(1..200);
    // Integer-valued so duplicates are common
    (0..n).map(|_| rng.gen_range(1..60) as f64).collect()
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

#[test]
fn breaks_are_ascending_and_end_at_max() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let values = random_sample(&mut rng);
        let k = rng.gen_range(1..10);
        let breaks = jenks_breaks(&values, k);

        let max = values.iter().copied().fold(f64::MIN, f64::max);
        assert_eq!(breaks.max(), Some(max));
        assert!(breaks.as_slice().windows(2).all(|w| w[0] < w[1]), "{:?}", breaks);
        assert!(breaks.len() <= k);
        assert!(breaks.as_slice().iter().all(|b| values.contains(b)));
    }
}

#[test]
fn break_count_is_min_of_k_and_distinct() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let values = random_sample(&mut rng);
        let k = rng.gen_range(1..10);
        let breaks = jenks_breaks(&values, k);
        assert_eq!(breaks.len(), k.min(distinct_count(&values)), "k={} values={:?}", k, values);
    }
}

#[test]
fn classification_is_deterministic_and_order_free() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let mut values = random_sample(&mut rng);
        let first = jenks_breaks(&values, 5);
        assert_eq!(first, jenks_breaks(&values, 5));
        values.reverse();
        assert_eq!(first, jenks_breaks(&values, 5));
    }
}

#[test]
fn color_lookup_is_monotone() {
    let mut rng = StdRng::seed_from_u64(99);
    let ramp = ColorRamp::yl_or_rd();
    for _ in 0..30 {
        let values = random_sample(&mut rng);
        let map: ValueMap = values.iter().enumerate().map(|(i, v)| (i.to_string(), *v)).collect();
        let scheme = ColorScheme::continuous(map, ramp.clone(), 7, NumberFormat::count());

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let position = |id: usize| {
            let color = scheme.fill_for(&id.to_string());
            ramp.colors().iter().position(|c| *c == color).unwrap()
        };
        let classes: Vec<usize> = order.iter().map(|&i| position(i)).collect();
        assert!(classes.windows(2).all(|w| w[0] <= w[1]), "{:?}", classes);
    }
}
