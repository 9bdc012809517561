use std::fmt;
use std::sync::Arc;

/// Energy constant used when a stage declares no schedule of its own.
pub const DEFAULT_ECON: f64 = 0.001;

const DEFAULT_RAMP_FLOOR: f64 = 1.0;
const DEFAULT_RAMP_POWER: f64 = 4.0;
const DEFAULT_DECAY_BASE: f64 = 0.5;

/// User-supplied schedule callable over the completion fraction.
pub type ScheduleFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Declarative temperature schedule, shape decided once at configuration time.
#[derive(Clone)]
pub enum TempSpec {
    Constant(f64),
    /// Ramp from `up` down to 1.0 with the default exponent.
    Ramp { up: f64 },
    /// Ramp from `up` down to `down` with the default exponent.
    RampTo { up: f64, down: f64 },
    /// Fully specified ramp.
    RampPow { up: f64, down: f64, power: f64 },
    Custom(ScheduleFn),
}

/// Declarative energy-constant schedule.
#[derive(Clone)]
pub enum EconSpec {
    Constant(f64),
    /// Exponential decay `scale * 0.5^f`.
    Decay { scale: f64 },
    /// Exponential decay `scale * base^f`.
    DecayBase { scale: f64, base: f64 },
    Custom(ScheduleFn),
}

/// A resolved, pure schedule over the completion fraction `f in [0, 1]`.
#[derive(Clone)]
pub enum ScheduleFunction {
    Constant(f64),
    Ramp { up: f64, down: f64, power: f64 },
    Decay { scale: f64, base: f64 },
    Custom(ScheduleFn),
}

impl ScheduleFunction {
    pub fn eval(&self, f: f64) -> f64 {
        match self {
            ScheduleFunction::Constant(c) => *c,
            ScheduleFunction::Ramp { up, down, power } => {
                (up - down) * (1.0 - f).powf(*power) + down
            }
            ScheduleFunction::Decay { scale, base } => scale * base.powf(f),
            ScheduleFunction::Custom(func) => func(f),
        }
    }
}

impl fmt::Debug for ScheduleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleFunction::Constant(c) => write!(f, "Constant({})", c),
            ScheduleFunction::Ramp { up, down, power } => {
                write!(f, "Ramp({} -> {}, ^{})", up, down, power)
            }
            ScheduleFunction::Decay { scale, base } => write!(f, "Decay({} * {}^f)", scale, base),
            ScheduleFunction::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl fmt::Debug for TempSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TempSpec::Constant(c) => write!(f, "Constant({})", c),
            TempSpec::Ramp { up } => write!(f, "Ramp({})", up),
            TempSpec::RampTo { up, down } => write!(f, "RampTo({}, {})", up, down),
            TempSpec::RampPow { up, down, power } => {
                write!(f, "RampPow({}, {}, {})", up, down, power)
            }
            TempSpec::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl fmt::Debug for EconSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconSpec::Constant(c) => write!(f, "Constant({})", c),
            EconSpec::Decay { scale } => write!(f, "Decay({})", scale),
            EconSpec::DecayBase { scale, base } => write!(f, "DecayBase({}, {})", scale, base),
            EconSpec::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A resolved temperature schedule: either retarget via a function, or hold
/// the current value and let the integrator continue undisturbed.
#[derive(Debug, Clone)]
pub enum TempSchedule {
    Hold,
    Run(ScheduleFunction),
}

impl TempSchedule {
    pub fn is_hold(&self) -> bool {
        matches!(self, TempSchedule::Hold)
    }
}

pub fn resolve_econ(spec: Option<&EconSpec>) -> ScheduleFunction {
    match spec {
        None => ScheduleFunction::Constant(DEFAULT_ECON),
        Some(EconSpec::Constant(c)) => ScheduleFunction::Constant(*c),
        Some(EconSpec::Decay { scale }) => ScheduleFunction::Decay {
            scale: *scale,
            base: DEFAULT_DECAY_BASE,
        },
        Some(EconSpec::DecayBase { scale, base }) => ScheduleFunction::Decay {
            scale: *scale,
            base: *base,
        },
        Some(EconSpec::Custom(func)) => ScheduleFunction::Custom(func.clone()),
    }
}

pub fn resolve_temp(spec: Option<&TempSpec>) -> TempSchedule {
    match spec {
        None => TempSchedule::Hold,
        Some(TempSpec::Constant(c)) => TempSchedule::Run(ScheduleFunction::Constant(*c)),
        Some(TempSpec::Ramp { up }) => TempSchedule::Run(ScheduleFunction::Ramp {
            up: *up,
            down: DEFAULT_RAMP_FLOOR,
            power: DEFAULT_RAMP_POWER,
        }),
        Some(TempSpec::RampTo { up, down }) => TempSchedule::Run(ScheduleFunction::Ramp {
            up: *up,
            down: *down,
            power: DEFAULT_RAMP_POWER,
        }),
        Some(TempSpec::RampPow { up, down, power }) => TempSchedule::Run(ScheduleFunction::Ramp {
            up: *up,
            down: *down,
            power: *power,
        }),
        Some(TempSpec::Custom(func)) => TempSchedule::Run(ScheduleFunction::Custom(func.clone())),
    }
}
