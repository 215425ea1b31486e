//! Adaptive quadrature over finite and infinite intervals.
//!
//! Each segment is integrated with the 15-point Kronrod rule and the embedded
//! 7-point Gauss rule; their difference is the segment's error estimate. The
//! segment with the largest estimate is bisected until the total estimate meets the
//! tolerance or the subdivision limit is reached.
//!
//! Half-infinite ranges are mapped onto $(0, 1]$ with
//! $$ x = a + \frac{1 - t}{t}, \qquad dx = \frac{dt}{t^2} $$
//! (mirrored for an infinite lower bound). The Kronrod nodes never touch $t = 0$.
//! A doubly infinite range is split at zero and each half is integrated on its own.

use crate::errors::{ECSUError, ECSUResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Kronrod abscissae on [0, 1); the odd entries are the Gauss nodes
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];

const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Tolerances for [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Absolute error target
    pub abs_tol: f64,
    /// Error target relative to the magnitude of the integral
    pub rel_tol: f64,
    /// Maximum number of segments before giving up
    pub max_subdivisions: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1e-10,
            rel_tol: 1e-8,
            max_subdivisions: 200,
        }
    }
}

/// An approximate definite integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    pub value: f64,
    /// Estimated absolute error
    pub abs_error: f64,
    /// Number of segments used
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

type Integrand<'a> = dyn FnMut(f64) -> ECSUResult<f64> + 'a;

/// Integrate `f` over `[lower, upper]`; either bound may be infinite.
///
/// Errors returned by `f` are propagated unchanged. Failure to reach the
/// tolerance, or a non-finite integrand value, is reported as
/// [`ECSUError::IntegrationFailure`].
pub fn integrate<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    config: &IntegrationConfig,
) -> ECSUResult<Integral>
where
    F: FnMut(f64) -> ECSUResult<f64>,
{
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(ECSUError::InvalidInterval { lower, upper });
    }
    if lower == upper {
        return Ok(Integral {
            value: 0.0,
            abs_error: 0.0,
            subdivisions: 0,
        });
    }

    let bounds = (lower, upper);
    let result = match (lower.is_finite(), upper.is_finite()) {
        (true, true) => adaptive(&mut f, lower, upper, bounds, config)?,
        (true, false) => adaptive(
            &mut |t: f64| -> ECSUResult<f64> { Ok(f(lower + (1.0 - t) / t)? / (t * t)) },
            0.0,
            1.0,
            bounds,
            config,
        )?,
        (false, true) => adaptive(
            &mut |t: f64| -> ECSUResult<f64> { Ok(f(upper - (1.0 - t) / t)? / (t * t)) },
            0.0,
            1.0,
            bounds,
            config,
        )?,
        (false, false) => {
            // Each tail has to converge on its own so divergent halves cannot cancel
            let left = adaptive(
                &mut |t: f64| -> ECSUResult<f64> { Ok(f(-(1.0 - t) / t)? / (t * t)) },
                0.0,
                1.0,
                bounds,
                config,
            )?;
            let right = adaptive(
                &mut |t: f64| -> ECSUResult<f64> { Ok(f((1.0 - t) / t)? / (t * t)) },
                0.0,
                1.0,
                bounds,
                config,
            )?;
            Integral {
                value: left.value + right.value,
                abs_error: left.abs_error + right.abs_error,
                subdivisions: left.subdivisions + right.subdivisions,
            }
        }
    };

    if !result.value.is_finite() {
        return Err(failure(bounds, format!("result is not finite ({})", result.value)));
    }

    debug!(
        "integrated over [{}, {}]: value={}, error={:e}, subdivisions={}",
        lower, upper, result.value, result.abs_error, result.subdivisions
    );
    Ok(result)
}

fn failure(bounds: (f64, f64), reason: String) -> ECSUError {
    ECSUError::IntegrationFailure {
        lower: bounds.0,
        upper: bounds.1,
        reason,
    }
}

fn adaptive(
    f: &mut Integrand,
    lower: f64,
    upper: f64,
    bounds: (f64, f64),
    config: &IntegrationConfig,
) -> ECSUResult<Integral> {
    let mut segments = vec![kronrod(f, lower, upper, bounds)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();

        if error <= config.abs_tol.max(config.rel_tol * value.abs()) {
            return Ok(Integral {
                value,
                abs_error: error,
                subdivisions: segments.len(),
            });
        }
        if segments.len() >= config.max_subdivisions {
            return Err(failure(
                bounds,
                format!(
                    "maximum number of subdivisions ({}) reached with estimated error {:e}",
                    config.max_subdivisions, error
                ),
            ));
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.error.total_cmp(&b.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let segment = segments.swap_remove(worst);

        let mid = 0.5 * (segment.lower + segment.upper);
        if mid <= segment.lower || mid >= segment.upper {
            return Err(failure(
                bounds,
                format!(
                    "segment [{}, {}] is too small to subdivide, estimated error {:e}",
                    segment.lower, segment.upper, error
                ),
            ));
        }
        segments.push(kronrod(f, segment.lower, mid, bounds)?);
        segments.push(kronrod(f, mid, segment.upper, bounds)?);
    }
}

/// 15-point Gauss-Kronrod estimate of one segment.
fn kronrod(f: &mut Integrand, lower: f64, upper: f64, bounds: (f64, f64)) -> ECSUResult<Segment> {
    let centre = 0.5 * (lower + upper);
    let half_length = 0.5 * (upper - lower);

    let mut eval = |x: f64| -> ECSUResult<f64> {
        let y = f(x)?;
        if y.is_finite() {
            Ok(y)
        } else {
            Err(failure(bounds, format!("integrand is not finite ({}) at {}", y, x)))
        }
    };

    let f_centre = eval(centre)?;
    let mut result_kronrod = f_centre * WGK[7];
    let mut result_gauss = f_centre * WG[3];

    for j in 0..7 {
        let dx = half_length * XGK[j];
        let pair = eval(centre - dx)? + eval(centre + dx)?;
        result_kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            result_gauss += WG[j / 2] * pair;
        }
    }

    Ok(Segment {
        lower,
        upper,
        value: result_kronrod * half_length,
        error: ((result_kronrod - result_gauss) * half_length).abs(),
    })
}
