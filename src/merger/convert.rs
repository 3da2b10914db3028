// Scan Destinations
//
// Copies merged values into caller-owned typed destinations, converting
// between compatible kinds the way a database driver's Scan does.

use crate::common::types::{DataValue, Scalar};
use crate::merger::error::{MergerError, MergerResult};

/// A destination `Cursor::scan` can write one column into
pub trait ScanTarget {
    fn assign(&mut self, value: &DataValue) -> MergerResult<()>;
}

impl ScanTarget for DataValue {
    fn assign(&mut self, value: &DataValue) -> MergerResult<()> {
        *self = value.clone();
        Ok(())
    }
}

fn unsupported(scalar: &Scalar, target: &str) -> MergerError {
    MergerError::Conversion(format!(
        "converting {} value {} to {} is unsupported",
        scalar.kind(),
        scalar,
        target
    ))
}

fn integer<T: TryFrom<i128>>(scalar: &Scalar, target: &str) -> MergerResult<T> {
    let wide = match scalar {
        Scalar::Float32(_) | Scalar::Float64(_) => {
            let f = scalar.as_f64().ok_or_else(|| unsupported(scalar, target))?;
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(unsupported(scalar, target));
            }
            f as i128
        }
        Scalar::Text(s) => s.trim().parse::<i128>().map_err(|_| unsupported(scalar, target))?,
        Scalar::Boolean(_) => return Err(unsupported(scalar, target)),
        other => other.as_i128().ok_or_else(|| unsupported(scalar, target))?,
    };
    T::try_from(wide).map_err(|_| unsupported(scalar, target))
}

fn float(scalar: &Scalar, target: &str) -> MergerResult<f64> {
    match scalar {
        Scalar::Text(s) => s.trim().parse::<f64>().map_err(|_| unsupported(scalar, target)),
        other => other.as_f64().ok_or_else(|| unsupported(scalar, target)),
    }
}

fn boolean(scalar: &Scalar, target: &str) -> MergerResult<bool> {
    match scalar {
        Scalar::Boolean(b) => Ok(*b),
        Scalar::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(unsupported(scalar, target)),
        },
        other => match other.as_i128() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(unsupported(scalar, target)),
        },
    }
}

fn text(scalar: &Scalar, _target: &str) -> MergerResult<String> {
    Ok(scalar.to_string())
}

fn float32(scalar: &Scalar, target: &str) -> MergerResult<f32> {
    float(scalar, target).map(|f| f as f32)
}

macro_rules! scan_target {
    ($($ty:ty => $convert:ident),* $(,)?) => {
        $(
            impl ScanTarget for $ty {
                fn assign(&mut self, value: &DataValue) -> MergerResult<()> {
                    let scalar = value.non_null().ok_or_else(|| {
                        MergerError::Conversion(format!(
                            "converting NULL to {} is unsupported",
                            stringify!($ty)
                        ))
                    })?;
                    *self = $convert(scalar, stringify!($ty))?;
                    Ok(())
                }
            }

            impl ScanTarget for Option<$ty> {
                fn assign(&mut self, value: &DataValue) -> MergerResult<()> {
                    *self = match value.non_null() {
                        Some(scalar) => Some($convert(scalar, stringify!($ty))?),
                        None => None,
                    };
                    Ok(())
                }
            }
        )*
    };
}

scan_target! {
    i8 => integer,
    i16 => integer,
    i32 => integer,
    i64 => integer,
    u8 => integer,
    u16 => integer,
    u32 => integer,
    u64 => integer,
    f32 => float32,
    f64 => float,
    bool => boolean,
    String => text,
}
