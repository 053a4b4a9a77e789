//! Variable adjustments of deterministic groups.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::NodeRef;

/// Operator combining the running accumulator `a` with the adjusted operand `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustOp {
    /// a + b
    #[default]
    Add,
    /// a - b
    Sub,
    /// signed min(a, b)
    SMin,
    /// signed max(a, b)
    SMax,
    /// unsigned min(a, b)
    UMin,
    /// unsigned max(a, b)
    UMax,
    /// signed a / b (a when b is 0)
    SDiv,
    /// signed a % b (a when b is 0)
    SMod,
    /// unsigned a / b (a when b is 0)
    UDiv,
    /// unsigned a % b (a when b is 0)
    UMod,
    /// a * b
    Mul,
    /// a & b
    And,
    /// a | b
    Or,
    /// a ^ b
    Xor,
    /// store a in temporary register b, yield a
    Sto,
    /// yield b
    Rst,
    /// store a in persistent slot b, yield a
    Stop,
    /// rotate a right by b
    Ror,
    /// signed compare: 0 if a < b, 1 if equal, 2 if a > b
    SCmp,
    /// unsigned compare: 0 if a < b, 1 if equal, 2 if a > b
    UCmp,
    /// a << b
    Shl,
    /// unsigned a >> b
    Shr,
    /// signed a >> b
    Sar,
}

impl AdjustOp {
    /// Operator for a data-file opcode byte.
    pub fn from_code(code: u8) -> Option<Self> {
        use AdjustOp::*;
        const TABLE: [AdjustOp; 23] = [
            Add, Sub, SMin, SMax, UMin, UMax, SDiv, SMod, UDiv, UMod, Mul, And, Or, Xor, Sto, Rst,
            Stop, Ror, SCmp, UCmp, Shl, Shr, Sar,
        ];
        TABLE.get(code as usize).copied()
    }
}

impl fmt::Display for AdjustOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdjustOp::Add => "add",
            AdjustOp::Sub => "sub",
            AdjustOp::SMin => "smin",
            AdjustOp::SMax => "smax",
            AdjustOp::UMin => "umin",
            AdjustOp::UMax => "umax",
            AdjustOp::SDiv => "sdiv",
            AdjustOp::SMod => "smod",
            AdjustOp::UDiv => "udiv",
            AdjustOp::UMod => "umod",
            AdjustOp::Mul => "mul",
            AdjustOp::And => "and",
            AdjustOp::Or => "or",
            AdjustOp::Xor => "xor",
            AdjustOp::Sto => "sto",
            AdjustOp::Rst => "rst",
            AdjustOp::Stop => "stop",
            AdjustOp::Ror => "ror",
            AdjustOp::SCmp => "scmp",
            AdjustOp::UCmp => "ucmp",
            AdjustOp::Shl => "shl",
            AdjustOp::Shr => "shr",
            AdjustOp::Sar => "sar",
        };
        write!(f, "{}", name)
    }
}

/// Optional division or modulo applied to the operand before the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustKind {
    #[default]
    None,
    /// (operand + add_val) / divmod_val
    Div,
    /// (operand + add_val) % divmod_val
    Mod,
}

/// One step of a deterministic group.
///
/// The operand is fetched from `variable` (with `parameter` for 0x60..=0x7F),
/// shifted right by `shift`, masked with `and_mask`, optionally run through
/// `kind`, then combined with the accumulator by `op`.
///
/// Operand sources are all expressed as variables:
/// - 0x1A is a constant (all bits set, so `and_mask` is the constant)
/// - 0x7C reads persistent slot `parameter`
/// - 0x7D reads temporary register `parameter`
/// - 0x7E calls the `subroutine` group and uses its callback result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjust {
    #[serde(default)]
    pub op: AdjustOp,
    pub variable: u8,
    #[serde(default)]
    pub parameter: u8,
    #[serde(default)]
    pub shift: u8,
    #[serde(default = "all_bits")]
    pub and_mask: u32,
    #[serde(default)]
    pub kind: AdjustKind,
    #[serde(default)]
    pub add_val: u32,
    #[serde(default)]
    pub divmod_val: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subroutine: Option<NodeRef>,
}

fn all_bits() -> u32 {
    u32::MAX
}

/// Variable yielding all bits set; with `and_mask` it encodes a constant.
pub const VAR_CONSTANT: u8 = 0x1A;
/// Variable reading a persistent storage slot.
pub const VAR_PERSISTENT: u8 = 0x7C;
/// Variable reading a temporary register.
pub const VAR_REGISTER: u8 = 0x7D;
/// Variable calling a subroutine group.
pub const VAR_PROCEDURE: u8 = 0x7E;

impl Adjust {
    /// Adjust reading `variable` unmasked, combined with `Add`.
    pub fn var(variable: u8) -> Self {
        Self {
            op: AdjustOp::Add,
            variable,
            parameter: 0,
            shift: 0,
            and_mask: u32::MAX,
            kind: AdjustKind::None,
            add_val: 0,
            divmod_val: 0,
            subroutine: None,
        }
    }

    /// Constant operand.
    pub fn constant(value: u32) -> Self {
        Self::var(VAR_CONSTANT).mask(value)
    }

    /// Operand read from temporary register `index`.
    pub fn register(index: u8) -> Self {
        Self::var(VAR_REGISTER).param(index)
    }

    /// Operand read from persistent slot `index`.
    pub fn persistent(index: u8) -> Self {
        Self::var(VAR_PERSISTENT).param(index)
    }

    /// Operand computed by resolving `subroutine`.
    pub fn procedure(subroutine: NodeRef) -> Self {
        Self { subroutine: Some(subroutine), ..Self::var(VAR_PROCEDURE) }
    }

    pub fn op(mut self, op: AdjustOp) -> Self {
        self.op = op;
        self
    }

    pub fn param(mut self, parameter: u8) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn shift(mut self, shift: u8) -> Self {
        self.shift = shift & 0x1F;
        self
    }

    pub fn mask(mut self, and_mask: u32) -> Self {
        self.and_mask = and_mask;
        self
    }

    /// Divide the masked operand: `(operand + add_val) / divisor`.
    pub fn div(mut self, add_val: u32, divisor: u32) -> Self {
        self.kind = AdjustKind::Div;
        self.add_val = add_val;
        self.divmod_val = divisor.max(1);
        self
    }

    /// Reduce the masked operand: `(operand + add_val) % divisor`.
    pub fn modulo(mut self, add_val: u32, divisor: u32) -> Self {
        self.kind = AdjustKind::Mod;
        self.add_val = add_val;
        self.divmod_val = divisor.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(AdjustOp::from_code(0x00), Some(AdjustOp::Add));
        assert_eq!(AdjustOp::from_code(0x0E), Some(AdjustOp::Sto));
        assert_eq!(AdjustOp::from_code(0x10), Some(AdjustOp::Stop));
        assert_eq!(AdjustOp::from_code(0x16), Some(AdjustOp::Sar));
        assert_eq!(AdjustOp::from_code(0x17), None);
    }

    #[test]
    fn test_builder() {
        let adjust = Adjust::var(0x60).param(3).shift(8).mask(0xFF).op(AdjustOp::Mul);
        assert_eq!(adjust.variable, 0x60);
        assert_eq!(adjust.parameter, 3);
        assert_eq!(adjust.shift, 8);
        assert_eq!(adjust.and_mask, 0xFF);
        assert_eq!(adjust.op, AdjustOp::Mul);
    }

    #[test]
    fn test_divisor_never_zero() {
        assert_eq!(Adjust::var(0x40).div(0, 0).divmod_val, 1);
        assert_eq!(Adjust::var(0x40).modulo(1, 0).divmod_val, 1);
    }

    #[test]
    fn test_operand_sources() {
        assert_eq!(Adjust::constant(7).variable, VAR_CONSTANT);
        assert_eq!(Adjust::constant(7).and_mask, 7);
        assert_eq!(Adjust::register(4).variable, VAR_REGISTER);
        assert_eq!(Adjust::persistent(4).variable, VAR_PERSISTENT);
        assert_eq!(Adjust::procedure(NodeRef(2)).subroutine, Some(NodeRef(2)));
    }

    #[test]
    fn test_deserialize_defaults() {
        let adjust: Adjust = serde_json::from_str(r#"{"variable": 69}"#).unwrap();
        assert_eq!(adjust, Adjust::var(0x45));
        let adjust: Adjust =
            serde_json::from_str(r#"{"op": "sto", "variable": 26, "and_mask": 3}"#).unwrap();
        assert_eq!(adjust, Adjust::constant(3).op(AdjustOp::Sto));
    }
}
