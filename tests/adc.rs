use press_pattern::adc::{
    filter::{AverageFilter, MedianFilter, RawFilter},
    AdcFilter,
};

fn feed<F: AdcFilter>(filter: &mut F, samples: &[u16]) -> Vec<Option<u16>> {
    samples.iter().map(|&sample| filter.process(sample)).collect()
}

#[test]
fn raw_filter_passes_every_sample() {
    let mut filter = RawFilter;
    assert_eq!(feed(&mut filter, &[7, 900]), vec![Some(7), Some(900)]);
}

#[test]
fn average_filter_truncates() {
    let mut filter = AverageFilter::<4>::new();

    // (1000 + 1001 + 1001 + 1001) / 4 = 1000.75 -> 1000
    assert_eq!(
        feed(&mut filter, &[1000, 1001, 1001, 1001]),
        vec![None, None, None, Some(1000)]
    );
}

#[test]
fn average_filter_starts_over_after_output() {
    let mut filter = AverageFilter::<2>::new();

    assert_eq!(
        feed(&mut filter, &[4095, 4095, 10, 20]),
        vec![None, Some(4095), None, Some(15)]
    );
}

#[test]
fn average_filter_reset_discards_partial_samples() {
    let mut filter = AverageFilter::<4>::default();

    feed(&mut filter, &[3000, 3000]);
    filter.reset();

    assert_eq!(
        feed(&mut filter, &[100, 100, 100, 100]),
        vec![None, None, None, Some(100)]
    );
}

#[test]
fn median_filter_rejects_spikes() {
    let mut filter = MedianFilter::<5>::new();

    assert_eq!(
        feed(&mut filter, &[2000, 4095, 2010, 0, 1990]),
        vec![None, None, None, None, Some(2000)]
    );
}

#[test]
fn median_filter_reset_discards_partial_window() {
    let mut filter = MedianFilter::<3>::default();

    feed(&mut filter, &[4095, 4095]);
    filter.reset();

    assert_eq!(
        feed(&mut filter, &[30, 10, 20]),
        vec![None, None, Some(20)]
    );
}

#[test]
fn median_filter_starts_over_after_output() {
    let mut filter = MedianFilter::<3>::new();

    assert_eq!(
        feed(&mut filter, &[1, 2, 3, 300, 100, 200]),
        vec![None, None, Some(2), None, None, Some(200)]
    );
}
