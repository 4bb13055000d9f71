//! Boolean gates over one fan-in input.

use std::any::Any;

use serde::{Deserialize, Serialize};
use voltaic_core::{Component, PlugSpec, ReadContext, Signal};

const LAYOUT: &[PlugSpec] = &[PlugSpec::input("in"), PlugSpec::output("out")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
}

impl LogicOp {
    /// Evaluate over the powered state of each connection. `And` over no
    /// connections is false; `Not` is "nothing powered".
    pub fn evaluate(self, powered: &[bool]) -> bool {
        let any = powered.iter().any(|&p| p);
        let all = !powered.is_empty() && powered.iter().all(|&p| p);
        match self {
            LogicOp::And => all,
            LogicOp::Or => any,
            LogicOp::Not | LogicOp::Nor => !any,
            LogicOp::Nand => !all,
            LogicOp::Xor => powered.iter().filter(|&&p| p).count() % 2 == 1,
        }
    }
}

/// Each connection on the input counts as one operand. Stateless: the
/// output is recomputed on every read.
#[derive(Debug, Clone)]
pub struct LogicGate {
    op: LogicOp,
}

impl LogicGate {
    pub fn new(op: LogicOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> LogicOp {
        self.op
    }
}

impl Component for LogicGate {
    fn kind(&self) -> &str {
        "logic"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, ctx: &ReadContext<'_>) -> Signal {
        let powered: Vec<bool> = ctx.inputs(0).iter().map(Signal::is_powered).collect();
        Signal::from_bool(self.op.evaluate(&powered))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_core::Circuit;
    use voltaic_core::test_utils::*;

    #[test]
    fn truth_tables() {
        let cases: &[(LogicOp, &[bool], bool)] = &[
            (LogicOp::And, &[true, true], true),
            (LogicOp::And, &[true, false], false),
            (LogicOp::And, &[], false),
            (LogicOp::Or, &[false, true], true),
            (LogicOp::Or, &[], false),
            (LogicOp::Not, &[], true),
            (LogicOp::Not, &[true], false),
            (LogicOp::Nand, &[true, true], false),
            (LogicOp::Nand, &[true, false], true),
            (LogicOp::Nor, &[false, false], true),
            (LogicOp::Xor, &[true, true, true], true),
            (LogicOp::Xor, &[true, true], false),
        ];
        for &(op, inputs, expected) in cases {
            assert_eq!(op.evaluate(inputs), expected, "{op:?} {inputs:?}");
        }
    }

    #[test]
    fn gate_reads_each_connection() {
        let mut circuit = Circuit::offline();
        let on = circuit.add("on", Constant::new(1.0)).unwrap();
        let off = circuit.add("off", Constant::new(0.0)).unwrap();
        let and = circuit.add("and", LogicGate::new(LogicOp::And)).unwrap();
        let xor = circuit.add("xor", LogicGate::new(LogicOp::Xor)).unwrap();
        for gate in [and, xor] {
            wire_out_in(&mut circuit, on, gate);
            wire_out_in(&mut circuit, off, gate);
        }
        circuit.enable_all();

        assert_eq!(circuit.read_output_at(and, 1), Signal::OFF);
        assert_eq!(circuit.read_output_at(xor, 1).power, 1.0);
    }
}
