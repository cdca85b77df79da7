//! Address-reference heuristic.
//!
//! A read function with no arguments and a single `address` return value is
//! most likely a pointer to another contract (`owner()`, `token0()`,
//! `implementation()`, `factory()`...). This misses getters that take
//! arguments or return tuples, and may flag addresses that are EOAs; both are
//! accepted.

use explorer_data::types::{ContractDescriptor, FunctionDescriptor};

/// Solidity ABI type of an account address.
pub const ADDRESS_TYPE: &str = "address";

/// Returns `true` if calling `function` likely yields another contract's address.
pub fn is_reference_candidate(function: &FunctionDescriptor) -> bool {
    function.is_read()
        && function.inputs.is_empty()
        && function.outputs.len() == 1
        && function.outputs[0].ty == ADDRESS_TYPE
}

/// Read functions of `contract` that pass [`is_reference_candidate`], in ABI order.
pub fn reference_candidates(
    contract: &ContractDescriptor,
) -> impl Iterator<Item = &FunctionDescriptor> {
    contract
        .read
        .iter()
        .filter(|function| is_reference_candidate(function))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use explorer_data::types::{Mutability, Param};

    fn function(
        inputs: &[&str],
        outputs: &[&str],
        mutability: Mutability,
    ) -> FunctionDescriptor {
        FunctionDescriptor::new(
            "f",
            inputs.iter().map(|ty| Param::new("arg", *ty)).collect(),
            outputs.iter().map(|ty| Param::new("", *ty)).collect(),
            mutability,
        )
    }

    #[test]
    fn accepts_zero_arg_single_address_getters() {
        assert!(is_reference_candidate(&function(&[], &["address"], Mutability::View)));
        assert!(is_reference_candidate(&function(&[], &["address"], Mutability::Pure)));
    }

    #[test]
    fn rejects_functions_with_inputs() {
        assert!(!is_reference_candidate(&function(
            &["uint256"],
            &["address"],
            Mutability::View
        )));
    }

    #[test]
    fn rejects_multiple_or_missing_outputs() {
        assert!(!is_reference_candidate(&function(
            &[],
            &["address", "address"],
            Mutability::View
        )));
        assert!(!is_reference_candidate(&function(&[], &[], Mutability::View)));
    }

    #[test]
    fn rejects_non_address_outputs() {
        for ty in ["uint256", "address[]", "bytes32", "(address,uint256)"] {
            assert!(
                !is_reference_candidate(&function(&[], &[ty], Mutability::View)),
                "{ty} should not qualify"
            );
        }
    }

    #[test]
    fn rejects_write_functions() {
        assert!(!is_reference_candidate(&function(&[], &["address"], Mutability::NonPayable)));
        assert!(!is_reference_candidate(&function(&[], &["address"], Mutability::Payable)));
    }

    #[test]
    fn candidates_follow_declaration_order() {
        let mut token0 = function(&[], &["address"], Mutability::View);
        token0.name = "token0".to_string();
        let mut reserves = function(&[], &["uint112", "uint112", "uint32"], Mutability::View);
        reserves.name = "getReserves".to_string();
        let mut token1 = function(&[], &["address"], Mutability::View);
        token1.name = "token1".to_string();

        let pair = ContractDescriptor::new(Address::ZERO, "UniswapV2Pair", vec![token0, reserves, token1]);
        let names: Vec<&str> = reference_candidates(&pair).map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["token0", "token1"]);
    }
}
