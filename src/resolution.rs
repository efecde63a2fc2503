//! Physical resolution metadata.
//!
//! JP2 stores pixel density as `numerator / denominator * 10^exponent` pixels
//! per meter, separately for each axis. Hosts think in dots per centimeter
//! (or inch), so decode converts records to [`PhysicalResolution`] and encode
//! synthesizes records back from it.

/// Rational-times-power-of-ten pixel density, in pixels per meter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResolutionRecord {
    pub h_numerator: u16,
    pub h_denominator: u16,
    pub h_exponent: i8,
    pub v_numerator: u16,
    pub v_denominator: u16,
    pub v_exponent: i8,
}

impl ResolutionRecord {
    /// Whether every magnitude is positive and both exponents are non-negative.
    pub fn is_valid(&self) -> bool {
        self.h_numerator > 0
            && self.h_denominator > 0
            && self.v_numerator > 0
            && self.v_denominator > 0
            && self.h_exponent >= 0
            && self.v_exponent >= 0
    }

    /// Horizontal density in pixels per meter.
    pub fn horizontal_ppm(&self) -> f64 {
        axis_value(self.h_numerator, self.h_denominator, self.h_exponent)
    }

    /// Vertical density in pixels per meter.
    pub fn vertical_ppm(&self) -> f64 {
        axis_value(self.v_numerator, self.v_denominator, self.v_exponent)
    }
}

fn axis_value(numerator: u16, denominator: u16, exponent: i8) -> f64 {
    (f64::from(numerator) / f64::from(denominator)) * 10f64.powi(i32::from(exponent))
}

const CM_PER_INCH: f64 = 2.54;

/// Pixel density in dots per centimeter. `0.0` on both axes means unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhysicalResolution {
    pub dpcm_x: f64,
    pub dpcm_y: f64,
}

impl PhysicalResolution {
    /// No resolution information.
    pub const UNKNOWN: Self = Self {
        dpcm_x: 0.0,
        dpcm_y: 0.0,
    };

    /// 96 dpi, used by hosts whose documents carry no physical unit.
    pub const DEFAULT: Self = Self {
        dpcm_x: 96.0 / CM_PER_INCH,
        dpcm_y: 96.0 / CM_PER_INCH,
    };

    pub fn new(dpcm_x: f64, dpcm_y: f64) -> Self {
        Self { dpcm_x, dpcm_y }
    }

    pub fn from_dpi(dpi_x: f64, dpi_y: f64) -> Self {
        Self {
            dpcm_x: dpi_x / CM_PER_INCH,
            dpcm_y: dpi_y / CM_PER_INCH,
        }
    }

    /// `(dpi_x, dpi_y)`.
    pub fn to_dpi(self) -> (f64, f64) {
        (self.dpcm_x * CM_PER_INCH, self.dpcm_y * CM_PER_INCH)
    }

    /// Both axes strictly positive and finite.
    pub fn is_known(self) -> bool {
        self.dpcm_x.is_finite() && self.dpcm_y.is_finite() && self.dpcm_x > 0.0 && self.dpcm_y > 0.0
    }
}

/// Convert a record to dots per centimeter. Missing or invalid records yield
/// [`PhysicalResolution::UNKNOWN`].
pub fn extract(record: Option<&ResolutionRecord>) -> PhysicalResolution {
    match record {
        Some(r) if r.is_valid() => PhysicalResolution {
            dpcm_x: r.horizontal_ppm() / 100.0,
            dpcm_y: r.vertical_ppm() / 100.0,
        },
        _ => PhysicalResolution::UNKNOWN,
    }
}

/// Fixed-point scale applied to pixels per meter before storing.
const FIXED_POINT: u16 = 1000;

/// Build a record from dots per centimeter. Returns `None` unless both axes
/// are finite and positive, or when a value is too large to store.
///
/// Values keep three decimal digits of pixels per meter; numerators too
/// large for the 16-bit field trade digits for a larger exponent.
pub fn synthesize(resolution: PhysicalResolution) -> Option<ResolutionRecord> {
    if !resolution.is_known() {
        return None;
    }
    let (h_numerator, h_exponent) = synthesize_axis(resolution.dpcm_x)?;
    let (v_numerator, v_exponent) = synthesize_axis(resolution.dpcm_y)?;
    Some(ResolutionRecord {
        h_numerator,
        h_denominator: FIXED_POINT,
        h_exponent,
        v_numerator,
        v_denominator: FIXED_POINT,
        v_exponent,
    })
}

fn synthesize_axis(dpcm: f64) -> Option<(u16, i8)> {
    let fixed = (dpcm * 100.0 * f64::from(FIXED_POINT)).floor();
    if fixed >= u64::MAX as f64 {
        return None;
    }
    let mut numerator = fixed as u64;
    let mut exponent: i8 = 0;
    while numerator > u64::from(u16::MAX) {
        numerator /= 10;
        exponent += 1;
    }
    Some((numerator as u16, exponent))
}
