//! Timing Derivation Unit Tests.
//!
//! Verifies the picosecond-to-cycle conversion, ceiling rounding, the burst
//! length, and the fatal timing configurations.

use rstest::rstest;

use hmsim_core::common::error::ConfigError;
use hmsim_core::config::TimingConfig;
use hmsim_core::mem::timing::DramTiming;

#[rstest]
#[case(12_500, 3200, 40)] // 12.5 ns at 3200 MHz: exact
#[case(7_500, 3200, 24)] // 7.5 ns at 3200 MHz: exact
#[case(12_500, 1600, 20)]
#[case(1_000, 3200, 4)] // 3.2 cycles rounds up
#[case(10_000, 333, 4)] // 3.33 cycles rounds up
#[case(0, 3200, 0)]
fn picoseconds_to_cycles_round_up(#[case] ps: u64, #[case] mhz: u64, #[case] cycles: u64) {
    let cfg = TimingConfig {
        io_freq_mhz: mhz,
        t_rp_ps: ps,
        ..TimingConfig::default()
    };
    let timing = DramTiming::derive(&cfg).unwrap();
    assert_eq!(timing.t_rp, cycles);
}

#[test]
fn default_timing_matches_ddr5_class_parameters() {
    let timing = DramTiming::derive(&TimingConfig::default()).unwrap();
    assert_eq!(
        timing,
        DramTiming {
            t_rp: 40,
            t_rcd: 40,
            t_cas: 40,
            turn_around: 24,
            return_time: 8,
        }
    );
}

#[rstest]
#[case(8, 8)] // 64-byte line over an 8-byte bus
#[case(16, 4)]
#[case(64, 1)]
fn burst_length_covers_one_line(#[case] width: u64, #[case] bursts: u64) {
    let cfg = TimingConfig {
        channel_width_bytes: width,
        ..TimingConfig::default()
    };
    assert_eq!(DramTiming::derive(&cfg).unwrap().return_time, bursts);
}

#[test]
fn zero_frequency_is_rejected() {
    let cfg = TimingConfig {
        io_freq_mhz: 0,
        ..TimingConfig::default()
    };
    assert_eq!(DramTiming::derive(&cfg), Err(ConfigError::ZeroFrequency));
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(24)]
fn channel_width_must_divide_the_block(#[case] width: u64) {
    let cfg = TimingConfig {
        channel_width_bytes: width,
        ..TimingConfig::default()
    };
    assert_eq!(
        DramTiming::derive(&cfg),
        Err(ConfigError::ChannelWidth {
            width,
            block: 64,
        })
    );
}
