//! Adjust arithmetic.
//!
//! Operands are prepared at 32 bits (shift, mask, optional div/mod), then
//! the operator runs at the group's width. The result is truncated to that
//! width; signed operators sign-extend from it first.

use crate::group::{Adjust, AdjustKind, AdjustOp, GroupSize};

/// Storage write requested by a `Sto` or `Stop` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEffect {
    Register { index: u32, value: u32 },
    Persistent { index: u32, value: u32 },
}

/// Result of one adjust step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustOutcome {
    pub value: u32,
    pub store: Option<StoreEffect>,
}

/// Shift, mask and optionally divide or reduce a raw operand.
pub fn prepare_operand(adjust: &Adjust, size: GroupSize, raw: u32) -> u32 {
    let value = (raw >> (adjust.shift & 0x1F)) & adjust.and_mask;
    let divmod = |value: u32| -> Option<(i64, i64)> {
        let sum = size.sign_extend(value) as i64 + size.sign_extend(adjust.add_val) as i64;
        let divisor = size.sign_extend(adjust.divmod_val) as i64;
        (divisor != 0).then_some((sum, divisor))
    };
    match adjust.kind {
        AdjustKind::None => value,
        AdjustKind::Div => divmod(value).map_or(value, |(sum, d)| (sum / d) as u32),
        AdjustKind::Mod => divmod(value).map_or(value, |(sum, d)| (sum % d) as u32),
    }
}

/// Combine accumulator `last` with a prepared operand.
pub fn apply_op(op: AdjustOp, size: GroupSize, last: u32, value: u32) -> AdjustOutcome {
    let u_last = size.truncate(last);
    let u_value = size.truncate(value);
    let s_last = size.sign_extend(last);
    let s_value = size.sign_extend(value);
    let shift = u_value & 0x1F;

    let mut store = None;
    let result = match op {
        AdjustOp::Add => last.wrapping_add(value),
        AdjustOp::Sub => last.wrapping_sub(value),
        AdjustOp::SMin => s_last.min(s_value) as u32,
        AdjustOp::SMax => s_last.max(s_value) as u32,
        AdjustOp::UMin => u_last.min(u_value),
        AdjustOp::UMax => u_last.max(u_value),
        AdjustOp::SDiv => {
            if s_value == 0 {
                u_last
            } else {
                s_last.wrapping_div(s_value) as u32
            }
        }
        AdjustOp::SMod => {
            if s_value == 0 {
                u_last
            } else {
                s_last.wrapping_rem(s_value) as u32
            }
        }
        AdjustOp::UDiv => {
            if u_value == 0 {
                u_last
            } else {
                u_last / u_value
            }
        }
        AdjustOp::UMod => {
            if u_value == 0 {
                u_last
            } else {
                u_last % u_value
            }
        }
        AdjustOp::Mul => last.wrapping_mul(value),
        AdjustOp::And => last & value,
        AdjustOp::Or => last | value,
        AdjustOp::Xor => last ^ value,
        AdjustOp::Sto => {
            store = Some(StoreEffect::Register { index: u_value, value: s_last as u32 });
            last
        }
        AdjustOp::Rst => value,
        AdjustOp::Stop => {
            store = Some(StoreEffect::Persistent { index: u_value, value: s_last as u32 });
            last
        }
        AdjustOp::Ror => u_last.rotate_right(shift),
        AdjustOp::SCmp => compare(s_last, s_value),
        AdjustOp::UCmp => compare(u_last, u_value),
        AdjustOp::Shl => u_last << shift,
        AdjustOp::Shr => u_last >> shift,
        AdjustOp::Sar => (s_last >> shift) as u32,
    };

    AdjustOutcome { value: size.truncate(result), store }
}

/// Full adjust step on a raw operand.
pub fn eval_adjust(adjust: &Adjust, size: GroupSize, last: u32, raw: u32) -> AdjustOutcome {
    apply_op(adjust.op, size, last, prepare_operand(adjust, size, raw))
}

fn compare<T: Ord>(a: T, b: T) -> u32 {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Equal => 1,
        std::cmp::Ordering::Greater => 2,
    }
}
