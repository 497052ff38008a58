//! Canonical double-gamma hemodynamic response (SPM parameterisation).
//!
//! - positive lobe: gamma with shape 6 (mode at 5 s with unit scale)
//! - undershoot: gamma with shape 16, scaled by 1/6
//! - kernel length 32 s

pub const PEAK_SHAPE: f64 = 6.0;
pub const UNDERSHOOT_SHAPE: f64 = 16.0;
pub const UNDERSHOOT_RATIO: f64 = 1.0 / 6.0;
pub const KERNEL_SECONDS: f64 = 32.0;

/// Response at `t` seconds after a unit impulse.
pub fn spm_hrf(t: f64) -> f64 {
    gamma_pdf(t, PEAK_SHAPE) - UNDERSHOOT_RATIO * gamma_pdf(t, UNDERSHOOT_SHAPE)
}

/// Kernel sampled every `dt` seconds over [0, 32 s), normalised to unit sum.
pub fn kernel(dt: f64) -> Vec<f64> {
    if !(dt > 0.0) {
        return Vec::new();
    }
    let n = (KERNEL_SECONDS / dt).ceil() as usize;
    let mut k: Vec<f64> = (0..n).map(|i| spm_hrf(i as f64 * dt)).collect();
    let sum: f64 = k.iter().sum();
    if sum.abs() > f64::EPSILON {
        for v in k.iter_mut() {
            *v /= sum;
        }
    }
    k
}

/// Causal convolution truncated to the signal length.
pub fn convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; signal.len()];
    for (i, &s) in signal.iter().enumerate() {
        if s == 0.0 {
            continue;
        }
        for (j, &k) in kernel.iter().enumerate() {
            let idx = i + j;
            if idx >= out.len() {
                break;
            }
            out[idx] += s * k;
        }
    }
    out
}

fn gamma_pdf(t: f64, shape: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    ((shape - 1.0) * t.ln() - t - ln_gamma(shape)).exp()
}

/// Lanczos approximation (g = 7, n = 9).
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = COEF[0];
    let t = x + G + 0.5;
    for (i, &c) in COEF.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}
