//! Properties every truncated distribution must satisfy.
//!
//! These tests exercise the free functions against several base families and
//! intervals, including half-infinite and unbounded ones.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ecsu_core::errors::ECSUError;
use ecsu_core::integrate::{integrate, IntegrationConfig};
use ecsu_core::parameters::Parameters;
use ecsu_core::registry::default_registry;
use ecsu_core::truncated::{
    cdf_trunc, density_trunc, mean_trunc, quantile_trunc, sample_trunc, variance_trunc,
    Truncated,
};
use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const INF: f64 = f64::INFINITY;

/// (family, parameters, lower, upper)
fn cases() -> Vec<(&'static str, Parameters, f64, f64)> {
    vec![
        ("norm", Parameters::from([("mean", 0.0), ("sd", 1.0)]), -1.96, 1.96),
        ("norm", Parameters::from([("mean", 3.0), ("sd", 1.5)]), 0.0, INF),
        ("norm", Parameters::from([("mean", 0.0), ("sd", 1.0)]), -INF, -0.5),
        ("lnorm", Parameters::from([("meanlog", 1.1), ("sdlog", 0.4)]), 1.0, 10.0),
        ("lnorm", Parameters::from([("meanlog", 1.1), ("sdlog", 0.4)]), 1.5, INF),
        ("gamma", Parameters::from([("shape", 3.0), ("rate", 1.2)]), 0.5, 6.0),
        ("exp", Parameters::from([("rate", 0.5)]), 1.0, INF),
        ("beta", Parameters::from([("shape1", 2.0), ("shape2", 5.0)]), 0.1, 0.6),
        ("weibull", Parameters::from([("shape", 1.5), ("scale", 2.0)]), 0.0, 3.0),
        ("t", Parameters::from([("df", 5.0)]), -2.0, 4.0),
        // Densities with a pole at zero
        ("gamma", Parameters::from([("shape", 0.5)]), 0.0, INF),
        ("chisq", Parameters::from([("df", 1.0)]), 0.0, 8.0),
        ("weibull", Parameters::from([("shape", 0.5), ("scale", 1.0)]), 0.0, 20.0),
        ("beta", Parameters::from([("shape1", 0.5), ("shape2", 0.5)]), 0.0, 1.0),
    ]
}

mod kernel_properties {
    use super::*;

    #[test]
    fn test_density_integrates_to_one() {
        for (spec, params, lower, upper) in cases() {
            let dist = Truncated::resolve(spec, &params, lower, upper).unwrap();
            let total = integrate(
                |x| dist.density_at(x),
                lower,
                upper,
                &IntegrationConfig::default(),
            )
            .unwrap();
            assert_relative_eq!(total.value, 1.0, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_density_zero_outside_interval() {
        for (spec, params, lower, upper) in cases() {
            let outside: Vec<f64> = [lower - 1.0, lower - 1e-6, upper + 1e-6, upper + 1.0]
                .into_iter()
                .filter(|x| x.is_finite())
                .collect();
            let values = density_trunc(&outside, spec, lower, upper, &params).unwrap();
            assert!(values.iter().all(|&v| v == 0.0), "{}: {:?}", spec, values);
        }
    }

    #[test]
    fn test_cdf_monotone_and_bounded() {
        for (spec, params, lower, upper) in cases() {
            let lo = if lower.is_finite() { lower } else { -20.0 };
            let hi = if upper.is_finite() { upper } else { lo + 50.0 };
            let grid: Vec<f64> = (0..=200)
                .map(|i| lo - 1.0 + (hi - lo + 2.0) * i as f64 / 200.0)
                .collect();
            let values = cdf_trunc(&grid, spec, lower, upper, &params).unwrap();

            assert!(
                values.windows(2).all(|w| w[0] <= w[1] + 1e-15),
                "{} not monotone",
                spec
            );
            assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
            if lower.is_finite() {
                assert_eq!(values[0], 0.0);
            } else {
                assert!(values[0] < 1e-12);
            }
            if upper.is_finite() {
                assert_eq!(*values.last().unwrap(), 1.0);
            }
        }
    }

    #[test]
    fn test_cdf_at_bounds() {
        for (spec, params, lower, upper) in cases() {
            let values = cdf_trunc(&[lower, upper], spec, lower, upper, &params).unwrap();
            assert_eq!(values, vec![0.0, 1.0], "{}", spec);
        }
    }

    #[test]
    fn test_quantile_cdf_round_trip() {
        let probabilities = [1e-4, 0.001, 0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99];
        for (spec, params, lower, upper) in cases() {
            let xs = quantile_trunc(&probabilities, spec, lower, upper, &params).unwrap();
            assert!(xs.iter().all(|&x| x >= lower && x <= upper));

            let round_trip = cdf_trunc(&xs, spec, lower, upper, &params).unwrap();
            for (p, q) in probabilities.iter().zip(round_trip) {
                assert_abs_diff_eq!(*p, q, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_samples_finite_and_match_mean() {
        let n = 20_000;
        for (i, (spec, params, lower, upper)) in cases().into_iter().enumerate() {
            let mut rng = ChaCha8Rng::seed_from_u64(100 + i as u64);
            let samples = sample_trunc(n, spec, lower, upper, &params, &mut rng).unwrap();

            assert!(
                samples.iter().all(|&x| x.is_finite() && x >= lower && x <= upper),
                "{}: non-finite or out-of-interval draw",
                spec
            );

            let mean = mean_trunc(spec, lower, upper, &params).unwrap();
            let variance = variance_trunc(spec, lower, upper, &params).unwrap();
            let sample_mean = samples.iter().sum::<f64>() / n as f64;
            let standard_error = (variance / n as f64).sqrt();
            assert!(
                (sample_mean - mean).abs() < 5.0 * standard_error,
                "{}: sample mean {} vs {}",
                spec,
                sample_mean,
                mean
            );
        }
    }

    #[test]
    fn test_mean_within_interval() {
        for (spec, params, lower, upper) in cases() {
            let mean = mean_trunc(spec, lower, upper, &params).unwrap();
            let variance = variance_trunc(spec, lower, upper, &params).unwrap();
            assert!(mean > lower && mean < upper, "{}: mean {}", spec, mean);
            assert!(variance > 0.0);
        }
    }
}

mod no_truncation {
    use super::*;

    #[test]
    fn test_normal_identity() {
        let params = Parameters::from([("mean", 2.0), ("sd", 0.5)]);
        let family = default_registry().resolve("norm").unwrap();
        let xs = [0.5, 1.7, 2.0, 3.1];

        let density = density_trunc(&xs, "norm", -INF, INF, &params).unwrap();
        let cdf = cdf_trunc(&xs, "norm", -INF, INF, &params).unwrap();
        for (i, &x) in xs.iter().enumerate() {
            assert_eq!(density[i], family.density(x, &params).unwrap());
            assert_eq!(cdf[i], family.cdf(x, &params).unwrap());
        }

        let ps = [0.05, 0.5, 0.95];
        let quantiles = quantile_trunc(&ps, "norm", -INF, INF, &params).unwrap();
        for (i, &p) in ps.iter().enumerate() {
            assert_eq!(quantiles[i], family.quantile(p, &params).unwrap());
        }

        assert_relative_eq!(
            mean_trunc("norm", -INF, INF, &params).unwrap(),
            2.0,
            epsilon = 1e-8
        );
        assert_relative_eq!(
            variance_trunc("norm", -INF, INF, &params).unwrap(),
            0.25,
            epsilon = 1e-8
        );
    }

    /// The lognormal already lives on [0, inf) so truncating there changes nothing
    #[test]
    fn test_lognormal_on_its_support() {
        let params = Parameters::from([("meanlog", 0.0), ("sdlog", 1.0)]);
        let family = default_registry().resolve("lnorm").unwrap();
        let dist = Truncated::resolve("lnorm", &params, 0.0, INF).unwrap();
        assert_eq!(dist.mass(), 1.0);

        for x in [0.1, 0.5, 1.0, 2.0, 7.5] {
            assert_eq!(dist.density_at(x).unwrap(), family.density(x, &params).unwrap());
            assert_eq!(dist.cdf_at(x).unwrap(), family.cdf(x, &params).unwrap());
        }
        for p in [0.05, 0.5, 0.95] {
            assert_eq!(
                dist.quantile_at(p).unwrap(),
                family.quantile(p, &params).unwrap()
            );
        }

        let e = std::f64::consts::E;
        assert_relative_eq!(dist.mean().unwrap(), e.sqrt(), epsilon = 1e-7);
        assert_relative_eq!(dist.variance().unwrap(), (e - 1.0) * e, epsilon = 1e-6);

        let mut rng1 = ChaCha8Rng::seed_from_u64(3);
        let mut rng2 = ChaCha8Rng::seed_from_u64(3);
        let truncated = dist.sample(20, &mut rng1).unwrap();
        let uniforms: Vec<f64> = (0..20).map(|_| rng2.sample(Open01)).collect();
        for (x, u) in truncated.iter().zip(uniforms) {
            assert_eq!(*x, family.quantile(u, &params).unwrap());
        }
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn test_central_95_normal() {
        let params = Parameters::from([("mean", 0.0), ("sd", 1.0)]);

        let mean = mean_trunc("norm", -1.96, 1.96, &params).unwrap();
        let variance = variance_trunc("norm", -1.96, 1.96, &params).unwrap();
        let cdf = cdf_trunc(&[0.0], "norm", -1.96, 1.96, &params).unwrap();
        let median = quantile_trunc(&[0.5], "norm", -1.96, 1.96, &params).unwrap();

        // 1 - 2 * 1.96 * phi(1.96) / Z
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
        assert_relative_eq!(variance, 0.758_855_277_221_755_7, epsilon = 1e-7);
        assert_relative_eq!(cdf[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(median[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_half_normal_sampler_moments() {
        let params = Parameters::from([("mean", 0.0), ("sd", 1.0)]);
        let n = 100_000;
        let mut rng = ChaCha8Rng::seed_from_u64(20240101);

        let samples = sample_trunc(n, "norm", 0.0, INF, &params, &mut rng).unwrap();
        let mean = mean_trunc("norm", 0.0, INF, &params).unwrap();
        let variance = variance_trunc("norm", 0.0, INF, &params).unwrap();

        assert_relative_eq!(mean, (2.0 / std::f64::consts::PI).sqrt(), epsilon = 1e-8);
        assert_relative_eq!(variance, 1.0 - 2.0 / std::f64::consts::PI, epsilon = 1e-8);

        let sample_mean = samples.iter().sum::<f64>() / n as f64;
        let sample_variance =
            samples.iter().map(|x| (x - sample_mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let standard_error = (variance / n as f64).sqrt();

        assert!(samples.iter().all(|&x| x >= 0.0));
        assert!(
            (sample_mean - mean).abs() < 4.0 * standard_error,
            "sample mean {} vs {}",
            sample_mean,
            mean
        );
        assert!((sample_variance - variance).abs() < 0.01);
    }

    #[test]
    fn test_peak_far_from_origin() {
        let params = Parameters::from([("mean", 1000.0), ("sd", 1.0)]);
        let mean = mean_trunc("norm", 0.0, INF, &params).unwrap();
        let variance = variance_trunc("norm", 0.0, INF, &params).unwrap();

        assert_relative_eq!(mean, 1000.0, max_relative = 1e-6);
        assert_relative_eq!(variance, 1.0, max_relative = 1e-6);
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_degenerate_intervals() {
        let params = Parameters::from([("mean", 0.0), ("sd", 1.0)]);

        assert!(matches!(
            mean_trunc("norm", 5.0, 5.0, &params),
            Err(ECSUError::DegenerateMass { .. })
        ));
        assert!(matches!(
            cdf_trunc(&[15.0], "norm", 10.0, 20.0, &params),
            Err(ECSUError::DegenerateMass { .. })
        ));
    }

    #[test]
    fn test_inverted_interval() {
        let params = Parameters::new();
        assert!(matches!(
            density_trunc(&[0.0], "norm", 1.0, -1.0, &params),
            Err(ECSUError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_unknown_family() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            sample_trunc(5, "gaussian", 0.0, 1.0, &Parameters::new(), &mut rng),
            Err(ECSUError::UnknownDistributionFamily(_))
        ));
    }

    #[test]
    fn test_cauchy_has_no_mean() {
        let params = Parameters::new();
        assert!(matches!(
            mean_trunc("cauchy", -INF, INF, &params),
            Err(ECSUError::IntegrationFailure { .. })
        ));
        // Bounded, it does
        assert_abs_diff_eq!(
            mean_trunc("cauchy", -10.0, 10.0, &params).unwrap(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_invalid_parameters_propagate() {
        let params = Parameters::from([("shape", -1.0)]);
        assert!(matches!(
            variance_trunc("gamma", 0.0, 1.0, &params),
            Err(ECSUError::InvalidParameters { .. })
        ));
    }
}
