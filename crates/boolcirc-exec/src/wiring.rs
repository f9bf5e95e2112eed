//! The argument/result wiring contract between caller buffers and circuit
//! pins.
//!
//! Inputs: argument buffers are concatenated in parameter declaration order,
//! the whole vector is reversed, and each input pin `name[i]` (or bare
//! `name` for a 1-bit parameter) is bound to the bit at offset
//! `total - 1 - (base(name) + i)` of the reversed vector, i.e. bit `i` of
//! argument `name`.
//!
//! Outputs: the first `return_width` output bits are the return value. The
//! rest are written back to in/out parameters by walking the circuit's
//! input pins in declaration order and consuming one output bit per pin that
//! belongs to an in/out parameter.
//!
//! Circuit and metadata are generated together, so any disagreement between
//! them and the caller's buffers is a contract violation and panics.

use std::collections::{HashMap, HashSet};

use boolcirc_core::netlist::{net_index, net_stem};
use boolcirc_core::{Circuit, FunctionMetadata, WireId};

macro_rules! contract_violation {
    ($($arg:tt)*) => {
        panic!("wiring contract violation: {}", format_args!($($arg)*))
    };
}

/// Splits `c[3]` into `("c", 3)`.
fn pin_ref(name: &str) -> (&str, usize) {
    match net_index(name) {
        Ok(index) => (net_stem(name), index),
        Err(e) => contract_violation!("{}", e),
    }
}

/// Binds every circuit input pin to one argument bit.
///
/// `args` holds one buffer per metadata parameter, in declaration order.
pub fn bind_inputs<T: Clone>(
    circuit: &Circuit,
    metadata: &FunctionMetadata,
    args: &[&[T]],
) -> Vec<(WireId, T)> {
    if args.len() != metadata.params.len() {
        contract_violation!(
            "{} argument buffers for {} parameters",
            args.len(),
            metadata.params.len()
        );
    }
    let mut base = HashMap::new();
    let mut offset = 0;
    for (param, arg) in metadata.params.iter().zip(args) {
        if arg.len() != param.width {
            contract_violation!(
                "argument '{}' has {} bits, parameter width is {}",
                param.name,
                arg.len(),
                param.width
            );
        }
        base.insert(param.name.as_str(), (offset, param.width));
        offset += param.width;
    }

    let mut bits: Vec<T> = args.iter().flat_map(|a| a.iter().cloned()).collect();
    let total = bits.len();
    if total != circuit.inputs().len() {
        contract_violation!(
            "{} input bits supplied, circuit has {} input wires",
            total,
            circuit.inputs().len()
        );
    }
    bits.reverse();

    let mut used = HashSet::new();
    let mut bound = Vec::with_capacity(total);
    for pin in circuit.inputs() {
        let (stem, index) = pin_ref(&pin.name);
        let Some(&(start, width)) = base.get(stem) else {
            contract_violation!("input pin '{}' matches no parameter", pin.name);
        };
        if index >= width {
            contract_violation!("input pin '{}' is outside parameter width {}", pin.name, width);
        }
        let position = total - 1 - (start + index);
        if !used.insert(position) {
            contract_violation!("input pin '{}' is bound twice", pin.name);
        }
        bound.push((pin.wire, bits[position].clone()));
    }
    bound
}

/// Copies circuit output bits into the caller's result buffer and in/out
/// argument buffers.
pub fn assemble_outputs<T: Clone>(
    circuit: &Circuit,
    metadata: &FunctionMetadata,
    outputs: &[T],
    result: &mut [T],
    in_out: &mut [(&str, &mut [T])],
) {
    if outputs.len() != circuit.outputs().len() {
        contract_violation!(
            "{} output values for {} output wires",
            outputs.len(),
            circuit.outputs().len()
        );
    }
    if result.len() != metadata.return_width {
        contract_violation!(
            "result buffer has {} bits, return width is {}",
            result.len(),
            metadata.return_width
        );
    }
    if outputs.len() < result.len() {
        contract_violation!(
            "{} output wires cannot hold a {}-bit return value",
            outputs.len(),
            result.len()
        );
    }
    result.clone_from_slice(&outputs[..result.len()]);

    let mut cursor = result.len();
    for pin in circuit.inputs() {
        let (stem, index) = pin_ref(&pin.name);
        let is_in_out = metadata.param(stem).map(|p| p.is_in_out()).unwrap_or(false);
        if !is_in_out {
            continue;
        }
        let Some((_, buffer)) = in_out.iter_mut().find(|(name, _)| *name == stem) else {
            contract_violation!("no buffer for in/out parameter '{}'", stem);
        };
        let Some(value) = outputs.get(cursor) else {
            contract_violation!("output wires exhausted at in/out pin '{}'", pin.name);
        };
        match buffer.get_mut(index) {
            Some(slot) => *slot = value.clone(),
            None => contract_violation!("in/out pin '{}' is outside its buffer", pin.name),
        }
        cursor += 1;
    }
    if cursor != outputs.len() {
        contract_violation!(
            "copied {} output bits, circuit has {} output wires",
            cursor,
            outputs.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boolcirc_core::metadata::Param;

    fn param(name: &str, width: usize, is_reference: bool) -> Param {
        Param {
            name: name.to_string(),
            width,
            is_const: false,
            is_reference,
        }
    }

    fn metadata(params: Vec<Param>, return_width: usize) -> FunctionMetadata {
        FunctionMetadata {
            name: "f".to_string(),
            params,
            return_width,
        }
    }

    /// Inputs declared as `pins`, outputs copying `outputs` input pins.
    fn circuit(pins: &[&str], outputs: &[usize]) -> Circuit {
        let mut c = Circuit::new("f");
        let wires: Vec<_> = pins.iter().map(|p| c.add_input(*p)).collect();
        for (i, &source) in outputs.iter().enumerate() {
            c.add_output(format!("out[{}]", i), wires[source]).unwrap();
        }
        c
    }

    #[test]
    fn pins_bind_by_name_and_subscript() {
        // Pin order differs from parameter order.
        let c = circuit(&["b", "a[1]", "a[0]"], &[]);
        let md = metadata(vec![param("a", 2, false), param("b", 1, false)], 0);
        let a = [10, 11];
        let b = [20];
        let bound = bind_inputs(&c, &md, &[&a[..], &b[..]]);
        assert_eq!(bound, vec![(WireId(0), 20), (WireId(1), 11), (WireId(2), 10)]);
    }

    #[test]
    fn in_out_written_back_in_pin_order() {
        // c is in/out, k is read-only; outputs are return[0], then c[0], c[1].
        let c = circuit(&["k", "c[0]", "c[1]"], &[0, 2, 1]);
        let md = metadata(vec![param("c", 2, true), param("k", 1, false)], 1);
        let outputs = ['r', 'x', 'y'];
        let mut result = [' '];
        let mut c_buf = ['-', '-'];
        assemble_outputs(&c, &md, &outputs, &mut result, &mut [("c", &mut c_buf[..])]);
        assert_eq!(result, ['r']);
        assert_eq!(c_buf, ['x', 'y']);
    }

    #[test]
    fn const_reference_is_not_written_back() {
        let c = circuit(&["k"], &[0]);
        let mut md = metadata(vec![param("k", 1, true)], 1);
        md.params[0].is_const = true;
        let mut result = [false];
        assemble_outputs(&c, &md, &[true], &mut result, &mut []);
        assert_eq!(result, [true]);
    }

    #[test]
    #[should_panic(expected = "input wires")]
    fn input_count_mismatch_panics() {
        let c = circuit(&["a[0]", "a[1]", "a[2]"], &[]);
        let md = metadata(vec![param("a", 2, false)], 0);
        bind_inputs(&c, &md, &[&[true, false][..]]);
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn duplicate_pin_panics() {
        let c = circuit(&["a[0]", "a[0]"], &[]);
        let md = metadata(vec![param("a", 2, false)], 0);
        bind_inputs(&c, &md, &[&[true, false][..]]);
    }

    #[test]
    #[should_panic(expected = "copied 1 output bits")]
    fn leftover_output_bits_panic() {
        let c = circuit(&["a"], &[0, 0]);
        let md = metadata(vec![param("a", 1, false)], 1);
        let mut result = [false];
        assemble_outputs(&c, &md, &[true, true], &mut result, &mut []);
    }
}
